//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::User, Query};
use crate::read;

use super::DatabaseQuery;

/// Queries a page of active [`User`]s, oldest first.
pub type List =
    DatabaseQuery<By<read::user::list::Page, read::user::list::Selector>>;

#[cfg(test)]
mod spec {
    use common::pagination::Arguments;

    use crate::{
        command::fixture,
        domain::user::Role,
        query::DatabaseQuery,
        read::user::list::{Filter, Selector},
        Query as _,
    };

    #[tokio::test]
    async fn lists_pages_in_registration_order() {
        let svc = fixture::service();
        for name in ["a", "b", "c"] {
            drop(fixture::register(&svc, name, Role::Tenant).await);
        }
        let owner = fixture::register(&svc, "o", Role::Owner).await;

        let first = svc
            .execute(DatabaseQuery::by(Selector {
                arguments: Arguments::new(Some(1), Some(2)).unwrap(),
                filter: Filter::default(),
            }))
            .await
            .unwrap();
        let names = first
            .nodes
            .iter()
            .map(|u| u.username.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b"]);
        assert!(first.has_more);

        let last = svc
            .execute(DatabaseQuery::by(Selector {
                arguments: Arguments::new(Some(2), Some(2)).unwrap(),
                filter: Filter::default(),
            }))
            .await
            .unwrap();
        assert_eq!(last.nodes.len(), 2);
        assert!(!last.has_more);

        let owners = svc
            .execute(DatabaseQuery::by(Selector {
                arguments: Arguments::default(),
                filter: Filter {
                    role: Some(Role::Owner),
                },
            }))
            .await
            .unwrap();
        assert_eq!(owners.nodes.len(), 1);
        assert_eq!(owners.nodes[0].id, owner.id);
    }
}

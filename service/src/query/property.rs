//! [`Query`] collection related to a single [`Property`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Review;
use crate::{
    domain::{property, Property},
    infra::{database, Database},
    read, Service,
};

use super::Query;

/// Queries all the [`Review`]s of a [`Property`] along with its
/// [`property::AverageRating`].
#[derive(Clone, Copy, Debug, From)]
pub struct Reviews {
    /// ID of the reviewed [`Property`].
    pub property_id: property::Id,
}

impl<Db> Query<Reviews> for Service<Db>
where
    Db: Database<
        Select<By<Option<Property>, property::Id>>,
        Ok = Option<Property>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::property::Reviews;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Reviews) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Reviews { property_id } = query;

        self.database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .map(read::property::Reviews::from)
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`Reviews`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::fixture,
        domain::{property, user::Role},
        Query as _,
    };

    use super::{ExecutionError, Reviews};

    #[tokio::test]
    async fn lists_reviews_in_order() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let created = fixture::property(&svc, &olga).await;

        let empty = svc.execute(Reviews::from(created.id)).await.unwrap();
        assert!(empty.reviews.is_empty());
        assert_eq!(Decimal::from(empty.average_rating), Decimal::ZERO);

        let first = fixture::review(&svc, created.id, &alice, 4).await;
        let second = fixture::review(&svc, created.id, &olga, 5).await;

        let reviews = svc.execute(Reviews::from(created.id)).await.unwrap();
        assert_eq!(reviews.property_id, created.id);
        assert_eq!(reviews.reviews, vec![first, second]);
        assert_eq!(Decimal::from(reviews.average_rating), Decimal::new(45, 1));
    }

    #[tokio::test]
    async fn fails_for_unknown_property() {
        let svc = fixture::service();

        let err = svc
            .execute(Reviews::from(property::Id::new()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PropertyNotExists(_)));
    }
}

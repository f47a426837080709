//! [`Command`] for deleting a [`Review`] of a [`Property`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{property::AverageRating, Review};
use crate::{
    domain::{
        property::{self, review},
        user::{self, Session},
        Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Review`] by its author or an admin,
/// recalculating the [`AverageRating`] of the [`Property`].
#[derive(Clone, Debug)]
pub struct DeletePropertyReview {
    /// ID of the reviewed [`Property`].
    pub property_id: property::Id,

    /// ID of the [`Review`] to delete.
    pub review_id: review::Id,

    /// [`Session`] of the [`Review`] author or an admin.
    pub requester: Session,
}

impl<Db> Command<DeletePropertyReview> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeletePropertyReview,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeletePropertyReview {
            property_id,
            review_id,
            requester,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Property`.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let review = property
            .review(review_id)
            .ok_or(E::ReviewNotExists(review_id))
            .map_err(tracerr::wrap!())?;
        if requester.role != user::Role::Admin
            && !review.is_authored_by(requester.user_id)
        {
            return Err(tracerr::new!(E::NotAuthor(review_id)));
        }

        drop(property.remove_review(review_id));
        property.recompute_average_rating();

        tx.execute(Update(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`DeletePropertyReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requester is neither the author of the [`Review`] nor an admin.
    #[display("`Review(id: {_0})` is authored by another `User`")]
    #[from(ignore)]
    NotAuthor(#[error(not(source))] review::Id),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Review`] doesn't exist in the [`Property`].
    #[display("`Review(id: {_0})` does not exist")]
    #[from(ignore)]
    ReviewNotExists(#[error(not(source))] review::Id),
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::{
        command::fixture,
        domain::{property::review, user::Role},
        Command as _,
    };

    use super::{DeletePropertyReview, ExecutionError};

    #[tokio::test]
    async fn average_follows_reviews() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let created = fixture::property(&svc, &olga).await;

        let first = fixture::review(&svc, created.id, &alice, 5).await;
        assert_eq!(
            fixture::average_rating(&svc, created.id).await,
            Decimal::new(50, 1),
        );
        let second = fixture::review(&svc, created.id, &alice, 3).await;
        assert_eq!(
            fixture::average_rating(&svc, created.id).await,
            Decimal::new(40, 1),
        );

        svc.execute(DeletePropertyReview {
            property_id: created.id,
            review_id: first.id,
            requester: alice.clone(),
        })
        .await
        .unwrap();
        assert_eq!(
            fixture::average_rating(&svc, created.id).await,
            Decimal::new(30, 1),
        );

        svc.execute(DeletePropertyReview {
            property_id: created.id,
            review_id: second.id,
            requester: alice,
        })
        .await
        .unwrap();
        assert_eq!(
            fixture::average_rating(&svc, created.id).await,
            Decimal::ZERO,
        );
    }

    #[tokio::test]
    async fn admin_deletes_foreign_review() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let root = fixture::register(&svc, "root", Role::Admin).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let (root, _) = fixture::login(&svc, &root);
        let created = fixture::property(&svc, &olga).await;
        let review = fixture::review(&svc, created.id, &alice, 2).await;

        svc.execute(DeletePropertyReview {
            property_id: created.id,
            review_id: review.id,
            requester: root,
        })
        .await
        .unwrap();

        let stored = fixture::stored(&svc, created.id).await.unwrap();
        assert!(stored.reviews.is_empty());
    }

    #[tokio::test]
    async fn stranger_cannot_delete() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let created = fixture::property(&svc, &olga).await;
        let review = fixture::review(&svc, created.id, &alice, 2).await;

        let err = svc
            .execute(DeletePropertyReview {
                property_id: created.id,
                review_id: review.id,
                requester: olga,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAuthor(_)));
        let stored = fixture::stored(&svc, created.id).await.unwrap();
        assert_eq!(stored.reviews, vec![review]);

        let err = svc
            .execute(DeletePropertyReview {
                property_id: created.id,
                review_id: review::Id::new(),
                requester: alice,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::ReviewNotExists(_)));
    }
}

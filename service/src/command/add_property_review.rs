//! [`Command`] for reviewing a [`Property`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::property::AverageRating;
use crate::{
    domain::{
        property::{self, review},
        user::Session,
        Property, Review,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adding a new [`Review`] to a [`Property`], recalculating
/// its [`AverageRating`].
#[derive(Clone, Debug)]
pub struct AddPropertyReview {
    /// ID of the [`Property`] to review.
    pub property_id: property::Id,

    /// [`Session`] of the [`Review`] author.
    pub author: Session,

    /// Number of stars given, not validated yet.
    pub rating: i64,

    /// [`review::Comment`] of the [`Review`].
    pub comment: review::Comment,
}

impl<Db> Command<AddPropertyReview> for Service<Db>
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
    type Ok = Review;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddPropertyReview,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddPropertyReview {
            property_id,
            author,
            rating,
            comment,
        } = cmd;

        let rating = review::Rating::new(rating)
            .ok_or(E::InvalidRating(rating))
            .map_err(tracerr::wrap!())?;

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

        let review = Review {
            id: review::Id::new(),
            user: author.username,
            user_id: author.user_id,
            rating,
            comment,
            created_at: DateTime::now().coerce(),
        };
        property.reviews.push(review.clone());
        property.recompute_average_rating();

        tx.execute(Update(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(review)
    }
}

/// Error of [`AddPropertyReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Provided rating is not a valid [`review::Rating`].
    #[display("Rating must be an integer from 1 to 5, got {_0}")]
    #[from(ignore)]
    InvalidRating(#[error(not(source))] i64),

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
        Command as _,
    };

    use super::{AddPropertyReview, ExecutionError};

    #[tokio::test]
    async fn appends_review_and_recalculates_average() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let created = fixture::property(&svc, &olga).await;

        let review = fixture::review(&svc, created.id, &alice, 5).await;
        assert_eq!(review.user, alice.username);
        assert_eq!(review.user_id, alice.user_id);
        assert_eq!(
            fixture::average_rating(&svc, created.id).await,
            Decimal::new(50, 1),
        );

        drop(fixture::review(&svc, created.id, &alice, 4).await);
        drop(fixture::review(&svc, created.id, &alice, 4).await);
        let stored = fixture::stored(&svc, created.id).await.unwrap();
        assert_eq!(stored.reviews.len(), 3);
        assert_eq!(stored.reviews[0], review);
        assert_eq!(Decimal::from(stored.average_rating), Decimal::new(43, 1));
    }

    #[tokio::test]
    async fn rejects_out_of_range_rating_untouched() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let created = fixture::property(&svc, &olga).await;

        for rating in [0, 6, -1] {
            let err = svc
                .execute(AddPropertyReview {
                    property_id: created.id,
                    author: olga.clone(),
                    rating,
                    comment: property::review::Comment::new("meh").unwrap(),
                })
                .await
                .unwrap_err();

            assert!(matches!(
                err.as_ref(),
                ExecutionError::InvalidRating(r) if *r == rating,
            ));
        }
        assert_eq!(fixture::stored(&svc, created.id).await, Some(created));
    }

    #[tokio::test]
    async fn fails_for_unknown_property() {
        let svc = fixture::service();
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (alice, _) = fixture::login(&svc, &alice);

        let err = svc
            .execute(AddPropertyReview {
                property_id: property::Id::new(),
                author: alice,
                rating: 3,
                comment: property::review::Comment::new("").unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PropertyNotExists(_)));
    }
}

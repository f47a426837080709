//! [`Command`] for updating a [`Review`] of a [`Property`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
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

/// [`Command`] for partially updating a [`Review`] by its author.
///
/// The [`AverageRating`] of the [`Property`] is recalculated whenever the
/// [`review::Rating`] changes.
#[derive(Clone, Debug)]
pub struct UpdatePropertyReview {
    /// ID of the reviewed [`Property`].
    pub property_id: property::Id,

    /// ID of the [`Review`] to update.
    pub review_id: review::Id,

    /// [`Session`] of the [`Review`] author.
    pub author: Session,

    /// New number of stars, not validated yet.
    pub rating: Option<i64>,

    /// New [`review::Comment`].
    pub comment: Option<review::Comment>,
}

impl<Db> Command<UpdatePropertyReview> for Service<Db>
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
        cmd: UpdatePropertyReview,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePropertyReview {
            property_id,
            review_id,
            author,
            rating,
            comment,
        } = cmd;

        if rating.is_none() && comment.is_none() {
            return Err(tracerr::new!(E::NothingToUpdate));
        }
        let rating = rating
            .map(|r| review::Rating::new(r).ok_or(E::InvalidRating(r)))
            .transpose()
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

        let review = property
            .review_mut(review_id)
            .ok_or(E::ReviewNotExists(review_id))
            .map_err(tracerr::wrap!())?;
        if !review.is_authored_by(author.user_id) {
            return Err(tracerr::new!(E::NotAuthor(review_id)));
        }
        if let Some(comment) = comment {
            review.comment = comment;
        }
        let rerated = rating.is_some_and(|r| r != review.rating);
        if let Some(rating) = rating {
            review.rating = rating;
        }
        let review = review.clone();
        if rerated {
            property.recompute_average_rating();
        }

        tx.execute(Update(property))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(review)
    }
}

/// Error of [`UpdatePropertyReview`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Provided rating is not a valid [`review::Rating`].
    #[display("Rating must be an integer from 1 to 5, got {_0}")]
    #[from(ignore)]
    InvalidRating(#[error(not(source))] i64),

    /// Requester is not the author of the [`Review`].
    #[display("`Review(id: {_0})` is authored by another `User`")]
    #[from(ignore)]
    NotAuthor(#[error(not(source))] review::Id),

    /// No fields to update are provided.
    #[display("Nothing to update")]
    NothingToUpdate,

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

    use super::{ExecutionError, UpdatePropertyReview};

    #[tokio::test]
    async fn author_rerates_review() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let created = fixture::property(&svc, &olga).await;
        let first = fixture::review(&svc, created.id, &alice, 5).await;
        drop(fixture::review(&svc, created.id, &olga, 3).await);

        let updated = svc
            .execute(UpdatePropertyReview {
                property_id: created.id,
                review_id: first.id,
                author: alice,
                rating: Some(1),
                comment: None,
            })
            .await
            .unwrap();

        assert_eq!(u8::from(updated.rating), 1);
        assert_eq!(updated.comment, first.comment);
        assert_eq!(
            fixture::average_rating(&svc, created.id).await,
            Decimal::new(20, 1),
        );
    }

    #[tokio::test]
    async fn stranger_cannot_update() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let bob = fixture::register(&svc, "bob", Role::Tenant).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (alice, _) = fixture::login(&svc, &alice);
        let (bob, _) = fixture::login(&svc, &bob);
        let created = fixture::property(&svc, &olga).await;
        let review = fixture::review(&svc, created.id, &alice, 4).await;

        let err = svc
            .execute(UpdatePropertyReview {
                property_id: created.id,
                review_id: review.id,
                author: bob,
                rating: Some(1),
                comment: review::Comment::new("hacked"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotAuthor(_)));
        let stored = fixture::stored(&svc, created.id).await.unwrap();
        assert_eq!(stored.reviews, vec![review]);
        assert_eq!(Decimal::from(stored.average_rating), Decimal::new(40, 1));
    }

    #[tokio::test]
    async fn validates_input_first() {
        let svc = fixture::service();
        let alice = fixture::register(&svc, "alice", Role::Tenant).await;
        let (alice, _) = fixture::login(&svc, &alice);
        let update = UpdatePropertyReview {
            property_id: crate::domain::property::Id::new(),
            review_id: review::Id::new(),
            author: alice,
            rating: None,
            comment: None,
        };

        let err = svc.execute(update.clone()).await.unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NothingToUpdate));

        let err = svc
            .execute(UpdatePropertyReview {
                rating: Some(9),
                ..update
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::InvalidRating(9)));
    }

    #[tokio::test]
    async fn fails_for_unknown_review() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let created = fixture::property(&svc, &olga).await;

        let err = svc
            .execute(UpdatePropertyReview {
                property_id: created.id,
                review_id: review::Id::new(),
                author: olga,
                rating: Some(2),
                comment: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::ReviewNotExists(_)));
    }
}

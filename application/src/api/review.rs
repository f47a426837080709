//! [`Review`]-related endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{
        property::{self, review},
        user, Review,
    },
    query,
};
use tracing::field::display;

use crate::{
    api::{self, ValidationError},
    define_error, AsError, Context, Error,
};

/// Response body of [`list()`].
#[derive(Clone, Debug, Serialize)]
pub struct Reviews {
    /// Average rating of the listed [`Review`]s.
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,

    /// All the [`Review`]s of the [`property::Property`], oldest first.
    pub reviews: Vec<Review>,
}

/// Lists all the [`Review`]s of a [`property::Property`].
///
/// # Errors
///
/// Possible error codes:
/// - `PROPERTY_NOT_FOUND`: no such `Property`.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "reviews.list", property_id = %property_id),
)]
pub async fn list(
    ctx: Context,
    WithRejection(Path(property_id), _): WithRejection<
        Path<property::Id>,
        Error,
    >,
) -> Result<Json<Reviews>, Error> {
    let read = ctx
        .service()
        .execute(query::property::Reviews { property_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Reviews {
        average_rating: read.average_rating.into(),
        reviews: read.reviews,
    }))
}

/// Request body of [`add()`].
#[derive(Clone, Debug, Deserialize)]
pub struct NewReview {
    /// Number of stars, from `1` to `5`.
    pub rating: i64,

    /// Optional free-form text.
    #[serde(default)]
    pub comment: String,
}

/// Response body of [`add()`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Added {
    /// Confirmation message.
    pub message: &'static str,

    /// ID of the added [`Review`].
    pub review_id: review::Id,
}

/// Adds a new [`Review`] to a [`property::Property`] on behalf of the
/// current [`user::User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_RATING`, `INVALID_COMMENT`: malformed input;
/// - `PROPERTY_NOT_FOUND`: no such `Property`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "reviews.add",
        property_id = path.as_ref().ok().map(|p| display(p.0)),
    ),
)]
pub async fn add(
    ctx: Context,
    path: Result<Path<property::Id>, PathRejection>,
    body: Result<Json<NewReview>, JsonRejection>,
) -> Result<(StatusCode, Json<Added>), Error> {
    let author = ctx.authorize(user::Roles::ANY).await?;
    let Path(property_id) = path?;
    let Json(body) = body?;
    let comment =
        review::Comment::new(body.comment).ok_or(ValidationError::Comment)?;

    let review = ctx
        .service()
        .execute(command::AddPropertyReview {
            property_id,
            author,
            rating: body.rating,
            comment,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        StatusCode::CREATED,
        Json(Added {
            message: "Review added successfully",
            review_id: review.id,
        }),
    ))
}

/// Request body of [`update()`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewUpdate {
    /// New number of stars.
    pub rating: Option<i64>,

    /// New free-form text.
    pub comment: Option<String>,
}

/// Partially updates a [`Review`] authored by the current [`user::User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_RATING`, `INVALID_COMMENT`: malformed input;
/// - `NOTHING_TO_UPDATE`: neither rating nor comment is provided;
/// - `NOT_AUTHOR`: the `Review` is authored by another `User`;
/// - `PROPERTY_NOT_FOUND`, `REVIEW_NOT_FOUND`: no such `Property` or
///   `Review`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "reviews.update",
        property_id = path.as_ref().ok().map(|p| display(p.0 .0)),
        review_id = path.as_ref().ok().map(|p| display(p.0 .1)),
    ),
)]
pub async fn update(
    ctx: Context,
    path: Result<Path<(property::Id, review::Id)>, PathRejection>,
    body: Result<Json<ReviewUpdate>, JsonRejection>,
) -> Result<Json<api::Message>, Error> {
    let author = ctx.authorize(user::Roles::ANY).await?;
    let Path((property_id, review_id)) = path?;
    let Json(body) = body?;
    let comment = body
        .comment
        .map(|c| review::Comment::new(c).ok_or(ValidationError::Comment))
        .transpose()?;

    _ = ctx
        .service()
        .execute(command::UpdatePropertyReview {
            property_id,
            review_id,
            author,
            rating: body.rating,
            comment,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("Review updated successfully".into()))
}

/// Deletes a [`Review`].
///
/// Allowed to the author of the [`Review`] and admins.
///
/// # Errors
///
/// Possible error codes:
/// - `NOT_AUTHOR`: the requester is neither the author nor an admin;
/// - `PROPERTY_NOT_FOUND`, `REVIEW_NOT_FOUND`: no such `Property` or
///   `Review`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "reviews.delete",
        property_id = path.as_ref().ok().map(|p| display(p.0 .0)),
        review_id = path.as_ref().ok().map(|p| display(p.0 .1)),
    ),
)]
pub async fn delete(
    ctx: Context,
    path: Result<Path<(property::Id, review::Id)>, PathRejection>,
) -> Result<Json<api::Message>, Error> {
    let requester = ctx.authorize(user::Roles::ANY).await?;
    let Path((property_id, review_id)) = path?;

    ctx.service()
        .execute(command::DeletePropertyReview {
            property_id,
            review_id,
            requester,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("Review deleted successfully".into()))
}

impl AsError for query::property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PropertyNotExists(_) => Some(ReviewError::NoProperty.into()),
        }
    }
}

impl AsError for command::add_property_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidRating(_) => Some(ReviewError::InvalidRating.into()),
            Self::PropertyNotExists(_) => Some(ReviewError::NoProperty.into()),
        }
    }
}

impl AsError for command::update_property_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOTHING_TO_UPDATE"]
                #[status = BAD_REQUEST]
                #[message = "No fields to update provided"]
                NothingToUpdate,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidRating(_) => Some(ReviewError::InvalidRating.into()),
            Self::NotAuthor(_) => Some(ReviewError::NotAuthor.into()),
            Self::NothingToUpdate => Some(Error::NothingToUpdate.into()),
            Self::PropertyNotExists(_) => Some(ReviewError::NoProperty.into()),
            Self::ReviewNotExists(_) => Some(ReviewError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_property_review::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAuthor(_) => Some(ReviewError::NotAuthor.into()),
            Self::PropertyNotExists(_) => Some(ReviewError::NoProperty.into()),
            Self::ReviewNotExists(_) => Some(ReviewError::NotExists.into()),
        }
    }
}

define_error! {
    enum ReviewError {
        #[code = "INVALID_RATING"]
        #[status = BAD_REQUEST]
        #[message = "Rating must be an integer from 1 to 5"]
        InvalidRating,

        #[code = "NOT_AUTHOR"]
        #[status = FORBIDDEN]
        #[message = "Review is not authored by the requester"]
        NotAuthor,

        #[code = "PROPERTY_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Property not found"]
        NoProperty,

        #[code = "REVIEW_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Review not found"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{add_property_review, update_property_review},
        domain::property::{self, review},
    };

    use crate::AsError as _;

    use super::NewReview;

    #[test]
    fn comment_defaults_to_empty() {
        let review: NewReview =
            serde_json::from_str(r#"{"rating": 4}"#).unwrap();

        assert_eq!(review.rating, 4);
        assert_eq!(review.comment, "");
    }

    #[test]
    fn maps_command_errors() {
        let err = add_property_review::ExecutionError::InvalidRating(7)
            .into_error();
        assert_eq!(err.code, "INVALID_RATING");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);

        let err = add_property_review::ExecutionError::PropertyNotExists(
            property::Id::new(),
        )
        .into_error();
        assert_eq!(err.code, "PROPERTY_NOT_FOUND");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn maps_update_errors() {
        let err = update_property_review::ExecutionError::NotAuthor(
            review::Id::new(),
        )
        .into_error();
        assert_eq!(err.code, "NOT_AUTHOR");
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);

        let err = update_property_review::ExecutionError::NothingToUpdate
            .into_error();
        assert_eq!(err.code, "NOTHING_TO_UPDATE");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);

        let err = update_property_review::ExecutionError::ReviewNotExists(
            review::Id::new(),
        )
        .into_error();
        assert_eq!(err.code, "REVIEW_NOT_FOUND");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}

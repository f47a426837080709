//! REST API definitions.

pub mod auth;
pub mod property;
pub mod review;
pub mod user;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use common::pagination::Arguments;
use serde::{Deserialize, Serialize};

use crate::{define_error, Error};

/// Builds the [`Router`] serving the whole REST API.
///
/// The [`Service`] is expected to be provided as an [`Extension`].
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(user::me))
        .route("/users/all", get(user::list))
        .route("/users/update-role/:user_id", put(user::update_role))
        .route("/users/delete/:user_id", delete(user::delete))
        .route("/properties", get(property::list).post(property::create))
        .route("/properties/search", get(property::search))
        .route(
            "/properties/:property_id",
            get(property::view)
                .put(property::update)
                .delete(property::delete),
        )
        .route(
            "/properties/:property_id/reviews",
            get(review::list).post(review::add),
        )
        .route(
            "/properties/:property_id/reviews/:review_id",
            put(review::update).delete(review::delete),
        )
}

/// Pagination parameters of a list request.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Pagination {
    /// Number of the requested page, starting from `1`.
    pub page: Option<i64>,

    /// Maximum number of items on the requested page.
    pub page_size: Option<i64>,
}

impl TryFrom<Pagination> for Arguments {
    type Error = Error;

    fn try_from(p: Pagination) -> Result<Self, Self::Error> {
        Self::new(p.page, p.page_size)
            .ok_or_else(|| ValidationError::Pagination.into())
    }
}

/// Plain confirmation of a performed action.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Message {
    /// Human-readable description of the performed action.
    pub message: &'static str,
}

impl From<&'static str> for Message {
    fn from(message: &'static str) -> Self {
        Self { message }
    }
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_COMMENT"]
        #[status = BAD_REQUEST]
        #[message = "Comment must be at most 2000 characters long"]
        Comment,

        #[code = "INVALID_COORDINATES"]
        #[status = BAD_REQUEST]
        #[message = "Longitude must be within [-180, 180] and latitude within \
                     [-90, 90]"]
        Coordinates,

        #[code = "INVALID_LOCATION_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Location name must be non-empty and have no surrounding \
                     whitespace"]
        LocationName,

        #[code = "INVALID_OWNER_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Owner name must not be blank"]
        OwnerName,

        #[code = "INVALID_PAGINATION"]
        #[status = BAD_REQUEST]
        #[message = "Page must be positive and page size within [1, 100]"]
        Pagination,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must be from 2 to 128 bytes long"]
        Password,

        #[code = "INVALID_PRICE_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Minimal price must not be greater than the maximal one"]
        PriceRange,

        #[code = "INVALID_PROPERTY_TYPE"]
        #[status = BAD_REQUEST]
        #[message = "Property type must be non-empty and have no surrounding \
                     whitespace"]
        PropertyType,

        #[code = "INVALID_RENTAL_PRICE"]
        #[status = BAD_REQUEST]
        #[message = "Rental price must not be negative"]
        RentalPrice,

        #[code = "INVALID_ROLE"]
        #[status = BAD_REQUEST]
        #[message = "Role must be one of `admin`, `owner` or `tenant`"]
        Role,

        #[code = "INVALID_USERNAME"]
        #[status = BAD_REQUEST]
        #[message = "Username must be from 1 to 64 characters long, without \
                     surrounding whitespace"]
        Username,
    }
}

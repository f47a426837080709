//! [`Property`]-related endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query,
    },
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, property, user, Review},
    query, read,
};
use tracing::field::display;

use crate::{
    api::{self, ValidationError},
    define_error, AsError, Context, Error,
};

/// Public representation of a [`domain::Property`].
#[derive(Clone, Debug, Serialize)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: property::Id,

    /// Name of the owner of this [`Property`].
    pub owner_name: String,

    /// Type of this [`Property`] (`apartment`, `house`, etc).
    pub property_type: String,

    /// Name of the location of this [`Property`].
    pub location_name: String,

    /// Latitude of this [`Property`] location.
    pub latitude: f64,

    /// Longitude of this [`Property`] location.
    pub longitude: f64,

    /// Monthly rental price of this [`Property`].
    #[serde(with = "rust_decimal::serde::float")]
    pub rental_price: Decimal,

    /// Number of bedrooms in this [`Property`].
    pub bedrooms: property::NumBedrooms,

    /// Number of bathrooms in this [`Property`].
    pub bathrooms: property::NumBathrooms,

    /// [`property::Availability`] of this [`Property`].
    pub availability_status: property::Availability,

    /// Number of times this [`Property`] has been viewed.
    pub views: property::Views,

    /// [`Review`]s of this [`Property`].
    pub reviews: Vec<Review>,

    /// Average rating of the [`Review`]s of this [`Property`].
    #[serde(with = "rust_decimal::serde::float")]
    pub average_rating: Decimal,

    /// [`DateTime`] when this [`Property`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: property::CreationDateTime,
}

impl From<domain::Property> for Property {
    fn from(p: domain::Property) -> Self {
        Self {
            id: p.id,
            owner_name: p.owner_name.to_string(),
            property_type: p.kind.to_string(),
            location_name: p.location.name.to_string(),
            latitude: p.location.coordinates.latitude.into(),
            longitude: p.location.coordinates.longitude.into(),
            rental_price: p.rental_price.into(),
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            availability_status: p.availability,
            views: p.views,
            reviews: p.reviews,
            average_rating: p.average_rating.into(),
            created_at: p.created_at,
        }
    }
}

/// Lists a page of [`Property`]s, oldest first.
#[tracing::instrument(skip_all, fields(http.handler = "properties.list"))]
pub async fn list(
    ctx: Context,
    WithRejection(Query(pagination), _): WithRejection<
        Query<api::Pagination>,
        Error,
    >,
) -> Result<Json<Vec<Property>>, Error> {
    let page = ctx
        .service()
        .execute(query::properties::List::by(read::property::list::Selector {
            arguments: pagination.try_into()?,
            filter: read::property::list::Filter::default(),
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(page.nodes.into_iter().map(Into::into).collect()))
}

/// Query parameters of [`search()`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive part of the location name.
    pub location: Option<String>,

    /// Lowest rental price, inclusive.
    pub min_price: Option<Decimal>,

    /// Highest rental price, inclusive.
    pub max_price: Option<Decimal>,

    /// Exact number of bedrooms.
    pub bedrooms: Option<property::NumBedrooms>,

    /// Exact number of bathrooms.
    pub bathrooms: Option<property::NumBathrooms>,

    /// Exact [`property::Availability`].
    pub availability_status: Option<property::Availability>,

    /// Number of the requested page, starting from `1`.
    pub page: Option<i64>,

    /// Maximum number of [`Property`]s on the requested page.
    pub page_size: Option<i64>,
}

impl TryFrom<SearchParams> for read::property::list::Selector {
    type Error = Error;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        let SearchParams {
            location,
            min_price,
            max_price,
            bedrooms,
            bathrooms,
            availability_status,
            page,
            page_size,
        } = params;

        let price = |p: Option<Decimal>| {
            p.map(|p| {
                property::RentalPrice::new(p)
                    .ok_or(ValidationError::RentalPrice)
            })
            .transpose()
        };
        let price = read::property::list::PriceRange::new(
            price(min_price)?,
            price(max_price)?,
        )
        .map_err(|_| ValidationError::PriceRange)?;

        Ok(Self {
            arguments: api::Pagination { page, page_size }.try_into()?,
            filter: read::property::list::Filter {
                price,
                bedrooms,
                bathrooms,
                location: location.filter(|l| !l.trim().is_empty()),
                availability: availability_status,
                order: read::property::list::Order::RentalPrice,
            },
        })
    }
}

/// Searches [`Property`]s by the provided [`SearchParams`], cheapest first.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_RENTAL_PRICE`: negative price bound;
/// - `INVALID_PRICE_RANGE`: `min_price` is greater than `max_price`;
/// - `INVALID_PAGINATION`: malformed pagination.
#[tracing::instrument(skip_all, fields(http.handler = "properties.search"))]
pub async fn search(
    ctx: Context,
    WithRejection(Query(params), _): WithRejection<Query<SearchParams>, Error>,
) -> Result<Json<Vec<Property>>, Error> {
    let selector: read::property::list::Selector = params.try_into()?;

    let page = ctx
        .service()
        .execute(query::properties::List::by(selector))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(page.nodes.into_iter().map(Into::into).collect()))
}

/// Request body of [`create()`].
#[derive(Clone, Debug, Deserialize)]
pub struct NewProperty {
    /// Name of the owner, defaulting to the creator's username.
    pub owner_name: Option<String>,

    /// Type of the [`Property`].
    pub property_type: String,

    /// Monthly rental price.
    #[serde(with = "rust_decimal::serde::float")]
    pub rental_price: Decimal,

    /// Number of bedrooms.
    pub bedrooms: property::NumBedrooms,

    /// Number of bathrooms.
    pub bathrooms: property::NumBathrooms,

    /// Latitude of the location.
    pub latitude: f64,

    /// Longitude of the location.
    pub longitude: f64,

    /// Name of the location.
    pub location_name: String,

    /// Initial [`property::Availability`].
    pub availability_status: Option<property::Availability>,
}

/// Response body of [`create()`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Created {
    /// Confirmation message.
    pub message: &'static str,

    /// ID of the created [`Property`].
    pub property_id: property::Id,
}

/// Creates a new [`Property`].
///
/// Allowed to admins and owners.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_*`: malformed input.
#[tracing::instrument(skip_all, fields(http.handler = "properties.create"))]
pub async fn create(
    ctx: Context,
    body: Result<Json<NewProperty>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), Error> {
    let author = ctx.authorize(user::Roles::ADMIN_OR_OWNER).await?;
    let Json(body) = body?;

    let NewProperty {
        owner_name,
        property_type,
        rental_price,
        bedrooms,
        bathrooms,
        latitude,
        longitude,
        location_name,
        availability_status,
    } = body;
    let owner_name = owner_name
        .map(|n| property::OwnerName::new(n).ok_or(ValidationError::OwnerName))
        .transpose()?;
    let kind = property::Kind::new(property_type)
        .ok_or(ValidationError::PropertyType)?;
    let rental_price = property::RentalPrice::new(rental_price)
        .ok_or(ValidationError::RentalPrice)?;
    let location = location(location_name, latitude, longitude)?;

    let property = ctx
        .service()
        .execute(command::CreateProperty {
            author,
            owner_name,
            kind,
            location,
            rental_price,
            bedrooms,
            bathrooms,
            availability: availability_status,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Property created successfully",
            property_id: property.id,
        }),
    ))
}

/// Returns a single [`Property`], counting the view.
///
/// # Errors
///
/// Possible error codes:
/// - `PROPERTY_NOT_FOUND`: no such `Property`.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "properties.view", property_id = %property_id),
)]
pub async fn view(
    ctx: Context,
    WithRejection(Path(property_id), _): WithRejection<
        Path<property::Id>,
        Error,
    >,
) -> Result<Json<Property>, Error> {
    let property = ctx
        .service()
        .execute(command::ViewProperty { property_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(property.into()))
}

/// Request body of [`update()`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PropertyUpdate {
    /// New monthly rental price.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rental_price: Option<Decimal>,

    /// New number of bedrooms.
    pub bedrooms: Option<property::NumBedrooms>,

    /// New number of bathrooms.
    pub bathrooms: Option<property::NumBathrooms>,

    /// New [`property::Availability`].
    pub availability_status: Option<property::Availability>,

    /// New name of the location.
    ///
    /// Applied only together with [`PropertyUpdate::latitude`] and
    /// [`PropertyUpdate::longitude`].
    pub location_name: Option<String>,

    /// New latitude of the location.
    pub latitude: Option<f64>,

    /// New longitude of the location.
    pub longitude: Option<f64>,
}

/// Partially updates a [`Property`].
///
/// Allowed to admins and the owner of the [`Property`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_*`: malformed input;
/// - `NOTHING_TO_UPDATE`: no fields to update are provided;
/// - `NOT_OWNER`: the requester doesn't own the `Property`;
/// - `PROPERTY_NOT_FOUND`: no such `Property`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "properties.update",
        property_id = path.as_ref().ok().map(|p| display(p.0)),
    ),
)]
pub async fn update(
    ctx: Context,
    path: Result<Path<property::Id>, PathRejection>,
    body: Result<Json<PropertyUpdate>, JsonRejection>,
) -> Result<Json<api::Message>, Error> {
    let requester = ctx.authorize(user::Roles::ADMIN_OR_OWNER).await?;
    let Path(property_id) = path?;
    let Json(body) = body?;

    let PropertyUpdate {
        rental_price,
        bedrooms,
        bathrooms,
        availability_status,
        location_name,
        latitude,
        longitude,
    } = body;
    let rental_price = rental_price
        .map(|p| {
            property::RentalPrice::new(p).ok_or(ValidationError::RentalPrice)
        })
        .transpose()?;
    let location = match (location_name, latitude, longitude) {
        (Some(name), Some(lat), Some(lon)) => Some(location(name, lat, lon)?),
        _ => None,
    };

    _ = ctx
        .service()
        .execute(command::UpdateProperty {
            property_id,
            requester,
            rental_price,
            bedrooms,
            bathrooms,
            availability: availability_status,
            location,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("Property updated successfully".into()))
}

/// Deletes a [`Property`].
///
/// Allowed to admins and the owner of the [`Property`].
///
/// # Errors
///
/// Possible error codes:
/// - `NOT_OWNER`: the requester doesn't own the `Property`;
/// - `PROPERTY_NOT_FOUND`: no such `Property`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "properties.delete",
        property_id = path.as_ref().ok().map(|p| display(p.0)),
    ),
)]
pub async fn delete(
    ctx: Context,
    path: Result<Path<property::Id>, PathRejection>,
) -> Result<Json<api::Message>, Error> {
    let requester = ctx.authorize(user::Roles::ANY).await?;
    let Path(property_id) = path?;

    ctx.service()
        .execute(command::DeleteProperty {
            property_id,
            requester,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("Property deleted successfully".into()))
}

/// Builds a [`property::Location`] out of the raw request values.
fn location(
    name: String,
    latitude: f64,
    longitude: f64,
) -> Result<property::Location, ValidationError> {
    let name = property::LocationName::new(name)
        .ok_or(ValidationError::LocationName)?;
    let coordinates = property::Coordinates {
        longitude: property::Longitude::new(longitude)
            .ok_or(ValidationError::Coordinates)?,
        latitude: property::Latitude::new(latitude)
            .ok_or(ValidationError::Coordinates)?,
    };
    Ok(property::Location { name, coordinates })
}

impl AsError for command::create_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::view_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PropertyNotExists(_) => {
                Some(PropertyError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_property::ExecutionError {
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
            Self::NotOwner(_) => Some(PropertyError::NotOwner.into()),
            Self::NothingToUpdate => Some(Error::NothingToUpdate.into()),
            Self::PropertyNotExists(_) => {
                Some(PropertyError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_property::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotOwner(_) => Some(PropertyError::NotOwner.into()),
            Self::PropertyNotExists(_) => {
                Some(PropertyError::NotExists.into())
            }
        }
    }
}

define_error! {
    enum PropertyError {
        #[code = "PROPERTY_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Property not found"]
        NotExists,

        #[code = "NOT_OWNER"]
        #[status = FORBIDDEN]
        #[message = "Property is not owned by the requester"]
        NotOwner,
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use service::{
        command::{delete_property, update_property},
        domain::property::{self, Availability},
        read,
    };

    use crate::AsError as _;

    use super::{location, SearchParams};

    #[test]
    fn search_params_build_rental_price_ordered_selector() {
        let selector = read::property::list::Selector::try_from(SearchParams {
            location: Some("Kyiv".into()),
            min_price: Some(Decimal::from(100)),
            max_price: Some(Decimal::from(500)),
            availability_status: Some(Availability::Rented),
            page_size: Some(5),
            ..SearchParams::default()
        })
        .unwrap();

        assert_eq!(
            selector.filter.order,
            read::property::list::Order::RentalPrice,
        );
        assert_eq!(selector.filter.location.as_deref(), Some("Kyiv"));
        assert_eq!(selector.filter.availability, Some(Availability::Rented));
        assert_eq!(
            selector.filter.price.min().map(Decimal::from),
            Some(Decimal::from(100)),
        );
    }

    #[test]
    fn blank_location_is_ignored() {
        let selector = read::property::list::Selector::try_from(SearchParams {
            location: Some("  ".into()),
            ..SearchParams::default()
        })
        .unwrap();

        assert_eq!(selector.filter.location, None);
    }

    #[test]
    fn rejects_inverted_price_range() {
        let err = read::property::list::Selector::try_from(SearchParams {
            min_price: Some(Decimal::from(500)),
            max_price: Some(Decimal::from(100)),
            ..SearchParams::default()
        })
        .unwrap_err();

        assert_eq!(err.code, "INVALID_PRICE_RANGE");
    }

    #[test]
    fn rejects_negative_price_bound() {
        let err = read::property::list::Selector::try_from(SearchParams {
            min_price: Some(Decimal::from(-1)),
            ..SearchParams::default()
        })
        .unwrap_err();

        assert_eq!(err.code, "INVALID_RENTAL_PRICE");
    }

    #[test]
    fn validates_coordinates() {
        assert!(location("Lviv".into(), 49.84, 24.03).is_ok());
        assert!(location("Lviv".into(), 91.0, 24.03).is_err());
        assert!(location("Lviv".into(), 49.84, -181.0).is_err());
        assert!(location(" Lviv".into(), 49.84, 24.03).is_err());
    }

    #[test]
    fn maps_command_errors() {
        let err = update_property::ExecutionError::NothingToUpdate.into_error();
        assert_eq!(err.code, "NOTHING_TO_UPDATE");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);

        let err = update_property::ExecutionError::NotOwner(property::Id::new())
            .into_error();
        assert_eq!(err.code, "NOT_OWNER");
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);

        let err = delete_property::ExecutionError::PropertyNotExists(
            property::Id::new(),
        )
        .into_error();
        assert_eq!(err.code, "PROPERTY_NOT_FOUND");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}

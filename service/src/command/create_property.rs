//! [`Command`] for creating a new [`Property`].

use common::{operations::Insert, DateTime};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user::Session, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// [`Session`] of the creator.
    pub author: Session,

    /// [`property::OwnerName`] of a new [`Property`].
    ///
    /// Defaults to the creator's username.
    pub owner_name: Option<property::OwnerName>,

    /// [`property::Kind`] of a new [`Property`].
    pub kind: property::Kind,

    /// [`property::Location`] of a new [`Property`].
    pub location: property::Location,

    /// [`property::RentalPrice`] of a new [`Property`].
    pub rental_price: property::RentalPrice,

    /// Number of bedrooms in a new [`Property`].
    pub bedrooms: property::NumBedrooms,

    /// Number of bathrooms in a new [`Property`].
    pub bathrooms: property::NumBathrooms,

    /// [`property::Availability`] of a new [`Property`].
    ///
    /// Defaults to [`property::Availability::Available`].
    pub availability: Option<property::Availability>,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<Insert<Property>, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateProperty {
            author,
            owner_name,
            kind,
            location,
            rental_price,
            bedrooms,
            bathrooms,
            availability,
        } = cmd;

        let property = Property {
            id: property::Id::new(),
            owner_name: owner_name.unwrap_or_else(|| author.username.into()),
            kind,
            location,
            rental_price,
            bedrooms,
            bathrooms,
            availability: availability.unwrap_or_default(),
            views: 0,
            reviews: Vec::new(),
            average_rating: property::AverageRating::default(),
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(property)
    }
}

/// Error of [`CreateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}

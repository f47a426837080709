//! [`Command`] for updating a [`Property`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user::Session, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for partially updating a [`Property`].
///
/// Only the fields being [`Some`] are updated.
#[derive(Clone, Debug)]
pub struct UpdateProperty {
    /// ID of the [`Property`] to update.
    pub property_id: property::Id,

    /// [`Session`] of the [`Property`] owner or an admin.
    pub requester: Session,

    /// New [`property::RentalPrice`].
    pub rental_price: Option<property::RentalPrice>,

    /// New number of bedrooms.
    pub bedrooms: Option<property::NumBedrooms>,

    /// New number of bathrooms.
    pub bathrooms: Option<property::NumBathrooms>,

    /// New [`property::Availability`].
    pub availability: Option<property::Availability>,

    /// New [`property::Location`].
    pub location: Option<property::Location>,
}

impl<Db> Command<UpdateProperty> for Service<Db>
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
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateProperty {
            property_id,
            requester,
            rental_price,
            bedrooms,
            bathrooms,
            availability,
            location,
        } = cmd;

        if rental_price.is_none()
            && bedrooms.is_none()
            && bathrooms.is_none()
            && availability.is_none()
            && location.is_none()
        {
            return Err(tracerr::new!(E::NothingToUpdate));
        }

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

        if !super::may_manage(&requester, &property) {
            return Err(tracerr::new!(E::NotOwner(property_id)));
        }

        if let Some(price) = rental_price {
            property.rental_price = price;
        }
        if let Some(n) = bedrooms {
            property.bedrooms = n;
        }
        if let Some(n) = bathrooms {
            property.bathrooms = n;
        }
        if let Some(a) = availability {
            property.availability = a;
        }
        if let Some(l) = location {
            property.location = l;
        }

        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(property)
    }
}

/// Error of [`UpdateProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requester neither owns the [`Property`] nor is an admin.
    #[display("`Property(id: {_0})` is not owned by the requester")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] property::Id),

    /// No fields to update are provided.
    #[display("Nothing to update")]
    NothingToUpdate,

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

    use super::{ExecutionError, UpdateProperty};

    fn update(
        property_id: property::Id,
        requester: crate::domain::Session,
    ) -> UpdateProperty {
        UpdateProperty {
            property_id,
            requester,
            rental_price: None,
            bedrooms: None,
            bathrooms: None,
            availability: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn owner_updates_given_fields_only() {
        let svc = fixture::service();
        let owner = fixture::register(&svc, "olga", Role::Owner).await;
        let (session, _) = fixture::login(&svc, &owner);
        let created = fixture::property(&svc, &session).await;

        let updated = svc
            .execute(UpdateProperty {
                rental_price: property::RentalPrice::new(Decimal::from(900)),
                availability: Some(property::Availability::Rented),
                ..update(created.id, session)
            })
            .await
            .unwrap();

        assert_eq!(Decimal::from(updated.rental_price), Decimal::from(900));
        assert_eq!(updated.availability, property::Availability::Rented);
        assert_eq!(updated.bedrooms, created.bedrooms);
        assert_eq!(updated.location, created.location);
        assert_eq!(fixture::stored(&svc, created.id).await, Some(updated));
    }

    #[tokio::test]
    async fn foreign_owner_is_rejected() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let oleg = fixture::register(&svc, "oleg", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (oleg, _) = fixture::login(&svc, &oleg);
        let created = fixture::property(&svc, &olga).await;

        let err = svc
            .execute(UpdateProperty {
                bedrooms: Some(7),
                ..update(created.id, oleg)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotOwner(_)));
        assert_eq!(fixture::stored(&svc, created.id).await, Some(created));
    }

    #[tokio::test]
    async fn admin_updates_any() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let root = fixture::register(&svc, "root", Role::Admin).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let (root, _) = fixture::login(&svc, &root);
        let created = fixture::property(&svc, &olga).await;

        let updated = svc
            .execute(UpdateProperty {
                bathrooms: Some(3),
                ..update(created.id, root)
            })
            .await
            .unwrap();

        assert_eq!(updated.bathrooms, 3);
    }

    #[tokio::test]
    async fn requires_something_to_update() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let created = fixture::property(&svc, &olga).await;

        let err = svc.execute(update(created.id, olga)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NothingToUpdate));
    }
}

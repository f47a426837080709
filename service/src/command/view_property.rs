//! [`Command`] for viewing a [`Property`].

use common::operations::{
    By, Commit, Increment, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for fetching a single [`Property`], counting the view.
#[derive(Clone, Copy, Debug, From)]
pub struct ViewProperty {
    /// ID of the [`Property`] to view.
    pub property_id: property::Id,
}

impl<Db> Command<ViewProperty> for Service<Db>
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
        > + Database<
            Increment<By<property::Views, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ViewProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ViewProperty { property_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Property`.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Increment(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(property)
    }
}

/// Error of [`ViewProperty`] [`Command`] execution.
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
    use crate::{
        command::fixture,
        domain::{property, user::Role},
        Command as _,
    };

    use super::{ExecutionError, ViewProperty};

    #[tokio::test]
    async fn counts_views() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        let created = fixture::property(&svc, &olga).await;

        let first = svc.execute(ViewProperty::from(created.id)).await.unwrap();
        let second = svc.execute(ViewProperty::from(created.id)).await.unwrap();

        assert_eq!(first.views, 1);
        assert_eq!(second.views, 2);
        assert_eq!(fixture::stored(&svc, created.id).await.unwrap().views, 2);
    }

    #[tokio::test]
    async fn fails_for_unknown_property() {
        let svc = fixture::service();

        let err = svc
            .execute(ViewProperty::from(property::Id::new()))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PropertyNotExists(_)));
    }
}

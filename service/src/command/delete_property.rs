//! [`Command`] for deleting a [`Property`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, user::Session, Property},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Property`] along with all its
/// [`property::Review`]s.
#[derive(Clone, Debug)]
pub struct DeleteProperty {
    /// ID of the [`Property`] to delete.
    pub property_id: property::Id,

    /// [`Session`] of the [`Property`] owner or an admin.
    pub requester: Session,
}

impl<Db> Command<DeleteProperty> for Service<Db>
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
            Delete<By<Property, property::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteProperty,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteProperty {
            property_id,
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

        let property = tx
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        if !super::may_manage(&requester, &property) {
            return Err(tracerr::new!(E::NotOwner(property_id)));
        }

        tx.execute(Delete(By::<Property, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`DeleteProperty`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Requester neither owns the [`Property`] nor is an admin.
    #[display("`Property(id: {_0})` is not owned by the requester")]
    #[from(ignore)]
    NotOwner(#[error(not(source))] property::Id),

    /// [`Property`] doesn't exist.
    #[display("`Property(id: {_0})` does not exist")]
    #[from(ignore)]
    PropertyNotExists(#[error(not(source))] property::Id),
}

//! [`Database`] implementations for the [`Memory`] client.

use common::{
    operations::{
        By, Commit, Delete, Increment, Insert, Lock, Select, Transact, Update,
    },
    pagination::{Arguments, Page},
};
use tracerr::Traced;

use crate::{
    domain::{
        property, revocation,
        user::{self, session},
        Property, User,
    },
    infra::{
        database::{self, UNIQUE_REVOCATION, UNIQUE_USERNAME},
        Database,
    },
    read,
};

use super::{Connection, Error, Memory, NonTx, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(&self.0).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.0.commit().await.map_err(tracerr::wrap!())
    }
}

/// Takes the requested [`Page`] out of the provided `nodes`, sorted by the
/// provided key.
fn paginate<N, K: Ord>(
    arguments: Arguments,
    mut nodes: Vec<N>,
    key: impl FnMut(&N) -> K,
) -> Page<N> {
    nodes.sort_by_key(key);
    let offset = usize::try_from(arguments.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(arguments.limit()).unwrap_or(usize::MAX);
    Page::new(
        arguments,
        nodes.into_iter().skip(offset).take(limit.saturating_add(1)),
    )
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| {
            s.users.get(&id).filter(|u| u.deleted_at.is_none()).cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Username>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Username>>,
    ) -> Result<Self::Ok, Self::Err> {
        let username = by.into_inner();
        self.read(|s| {
            s.users
                .values()
                .find(|u| u.deleted_at.is_none() && &u.username == username)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<User>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            let occupied = s.users.values().any(|u| {
                u.deleted_at.is_none()
                    && u.id != user.id
                    && u.username == user.username
            });
            if occupied {
                return Err(Error::UniqueViolation(UNIQUE_USERNAME));
            }
            drop(s.users.insert(user.id, user));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())?
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C> Database<Update<User>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.users.insert(user.id, user)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `Tx` is exclusive already.
        Ok(())
    }
}

impl<C> Database<Select<By<read::user::list::Page, read::user::list::Selector>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = read::user::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::user::list::Page, read::user::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::user::list::Selector { arguments, filter } = by.into_inner();

        let users = self
            .read(|s| {
                s.users
                    .values()
                    .filter(|u| u.deleted_at.is_none() && filter.matches(u))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;

        Ok(paginate(arguments, users, |u| (u.created_at, u.id)))
    }
}

impl<'l, C> Database<Select<By<Option<revocation::Entry>, &'l session::Token>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Option<revocation::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<revocation::Entry>, &'l session::Token>>,
    ) -> Result<Self::Ok, Self::Err> {
        let token = by.into_inner();
        let fingerprint = revocation::Fingerprint::new(token);
        self.read(|s| {
            s.revocations
                .get(&fingerprint)
                .filter(|e| &e.token == token)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<revocation::Entry>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<revocation::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| {
            if s.revocations.contains_key(&entry.fingerprint) {
                return Err(Error::UniqueViolation(UNIQUE_REVOCATION));
            }
            drop(s.revocations.insert(entry.fingerprint, entry));
            Ok(())
        })
        .await
        .map_err(tracerr::wrap!())?
        .map_err(tracerr::from_and_wrap!(=> database::Error))
    }
}

impl<C> Database<Delete<By<revocation::Entry, session::ExpirationDateTime>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<revocation::Entry, session::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        self.write(|s| {
            let before = s.revocations.len();
            s.revocations.retain(|_, e| e.expires_at > deadline);
            u64::try_from(before - s.revocations.len()).unwrap_or(u64::MAX)
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.properties.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Property>> for Memory<C>
where
    C: Connection,
    Self: Database<Update<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Property>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| drop(s.properties.insert(property.id, property)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Delete<By<Property, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(|s| drop(s.properties.remove(&id)))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // `Tx` is exclusive already.
        Ok(())
    }
}

impl<C> Database<Increment<By<property::Views, property::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Increment(by): Increment<By<property::Views, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.write(|s| {
            if let Some(p) = s.properties.get_mut(&id) {
                p.views = p.views.saturating_add(1);
            }
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<
        Select<
            By<read::property::list::Page, read::property::list::Selector>,
        >,
    > for Memory<C>
where
    C: Connection,
{
    type Ok = read::property::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::property::list::Page, read::property::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        use read::property::list::Order;

        let read::property::list::Selector { arguments, filter } =
            by.into_inner();

        let properties = self
            .read(|s| {
                s.properties
                    .values()
                    .filter(|p| filter.matches(p))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(tracerr::wrap!())?;

        Ok(match filter.order {
            Order::Creation => {
                paginate(arguments, properties, |p| (p.created_at, p.id))
            }
            Order::RentalPrice => paginate(arguments, properties, |p| {
                (p.rental_price, p.created_at, p.id)
            }),
        })
    }
}

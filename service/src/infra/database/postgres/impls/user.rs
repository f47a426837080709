//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`User`] out of the provided [`Row`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, username, password_hash, role, \
                   created_at, deleted_at \
            FROM users \
            WHERE id = $1::UUID \
              AND deleted_at IS NULL";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Username>>>
    for Postgres<C>
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

        const SQL: &str = "\
            SELECT id, username, password_hash, role, \
                   created_at, deleted_at \
            FROM users \
            WHERE username = $1::VARCHAR \
              AND deleted_at IS NULL \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[username])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            username,
            password_hash,
            role,
            created_at,
            deleted_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, username, password_hash, role, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::INT2, \
                $5::TIMESTAMPTZ, $6::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET username = EXCLUDED.username, \
                password_hash = EXCLUDED.password_hash, \
                role = EXCLUDED.role, \
                created_at = EXCLUDED.created_at, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &username,
                &password_hash,
                &role,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: user::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO users_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::user::list::Page, read::user::list::Selector>>>
    for Postgres<C>
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
        let read::user::list::Selector {
            arguments,
            filter: read::user::list::Filter { role },
        } = by.into_inner();

        // One more row tells whether there is a next page.
        let limit = i64::try_from(arguments.limit())
            .unwrap_or(i64::MAX)
            .saturating_add(1);
        let offset = i64::try_from(arguments.offset()).unwrap_or(i64::MAX);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit, &offset];

        let role_idx = role.as_ref().map(|r| {
            ps.push(r);
            ps.len()
        });

        let sql = format!(
            "SELECT id, username, password_hash, role, \
                    created_at, deleted_at \
             FROM users \
             WHERE deleted_at IS NULL \
                   {role_filtering} \
             ORDER BY created_at, id \
             LIMIT $1::INT8 OFFSET $2::INT8",
            role_filtering = role_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND role = ${idx}::INT2"))
            }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::user::list::Page::new(
            arguments,
            rows.iter().map(from_row),
        ))
    }
}

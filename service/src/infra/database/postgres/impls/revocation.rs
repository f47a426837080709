//! [`revocation::Entry`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{revocation, user::session},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<'l, C> Database<Select<By<Option<revocation::Entry>, &'l session::Token>>>
    for Postgres<C>
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

        const SQL: &str = "\
            SELECT token, expires_at, revoked_at \
            FROM revoked_sessions \
            WHERE fingerprint = $1::UUID";
        let Some(row) = self
            .query_opt(SQL, &[&fingerprint])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        // Fingerprints may collide, so the token itself decides.
        if row.get::<_, &str>("token") != token.as_ref() {
            return Ok(None);
        }
        Ok(Some(revocation::Entry {
            fingerprint,
            token: token.clone(),
            expires_at: row.get("expires_at"),
            revoked_at: row.get("revoked_at"),
        }))
    }
}

impl<C> Database<Insert<revocation::Entry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<revocation::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let revocation::Entry {
            fingerprint,
            token,
            expires_at,
            revoked_at,
        } = entry;
        let token: &str = token.as_ref();

        const SQL: &str = "\
            INSERT INTO revoked_sessions (\
                fingerprint, token, expires_at, revoked_at\
            ) \
            VALUES (\
                $1::UUID, $2::VARCHAR, $3::TIMESTAMPTZ, $4::TIMESTAMPTZ\
            )";
        self.exec(SQL, &[&fingerprint, &token, &expires_at, &revoked_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<revocation::Entry, session::ExpirationDateTime>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<revocation::Entry, session::ExpirationDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let deadline: session::ExpirationDateTime = by.into_inner();

        const SQL: &str = "\
            DELETE FROM revoked_sessions \
            WHERE expires_at <= $1::TIMESTAMPTZ";
        self.exec(SQL, &[&deadline])
            .await
            .map_err(tracerr::wrap!())
    }
}

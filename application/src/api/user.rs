//! [`User`]-related endpoints.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, user},
    query, read,
};
use tracing::field::display;

use crate::{
    api::{self, ValidationError},
    define_error, AsError, Context, Error,
};

/// Public representation of a [`domain::User`].
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// [`user::Username`] of this [`User`].
    pub username: user::Username,

    /// [`user::Role`] of this [`User`].
    pub role: user::Role,

    /// [`DateTime`] when this [`User`] registered.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: user::CreationDateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Returns the [`User`] of the current [`user::Session`].
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND`: the `User` has been deleted since the login.
#[tracing::instrument(skip_all, fields(http.handler = "me"))]
pub async fn me(ctx: Context) -> Result<Json<User>, Error> {
    let session = ctx.authorize(user::Roles::ANY).await?;

    ctx.service()
        .execute(query::user::ById::by(session.user_id))
        .await
        .map_err(AsError::into_error)?
        .map(|u| Json(u.into()))
        .ok_or_else(|| UserError::NotExists.into())
}

/// Query parameters of [`list()`].
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct ListParams {
    /// [`user::Role`] the listed [`User`]s should have.
    pub role: Option<user::Role>,

    /// Number of the requested page, starting from `1`.
    pub page: Option<i64>,

    /// Maximum number of [`User`]s on the requested page.
    pub page_size: Option<i64>,
}

/// Lists a page of [`User`]s, oldest first.
///
/// Allowed to admins only.
#[tracing::instrument(skip_all, fields(http.handler = "users.list"))]
pub async fn list(
    ctx: Context,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<User>>, Error> {
    _ = ctx.authorize(user::Roles::ADMIN).await?;
    let Query(params) = params?;

    let page = ctx
        .service()
        .execute(query::users::List::by(read::user::list::Selector {
            arguments: api::Pagination {
                page: params.page,
                page_size: params.page_size,
            }
            .try_into()?,
            filter: read::user::list::Filter { role: params.role },
        }))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(page.nodes.into_iter().map(Into::into).collect()))
}

/// Request body of [`update_role()`].
#[derive(Clone, Debug, Deserialize)]
pub struct RoleUpdate {
    /// New [`user::Role`].
    pub role: String,
}

/// Changes the [`user::Role`] of a [`User`].
///
/// Allowed to admins only. Already issued [`user::Session`]s keep the old
/// [`user::Role`] until they expire.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_ROLE`: unknown role;
/// - `USER_NOT_FOUND`: no such `User`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "users.update_role",
        user_id = path.as_ref().ok().map(|p| display(p.0)),
    ),
)]
pub async fn update_role(
    ctx: Context,
    path: Result<Path<user::Id>, PathRejection>,
    body: Result<Json<RoleUpdate>, JsonRejection>,
) -> Result<Json<api::Message>, Error> {
    _ = ctx.authorize(user::Roles::ADMIN).await?;
    let Path(user_id) = path?;
    let Json(body) = body?;
    let role = body
        .role
        .parse::<user::Role>()
        .map_err(|_| ValidationError::Role)?;

    _ = ctx
        .service()
        .execute(command::UpdateUserRole { user_id, role })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("User role updated successfully".into()))
}

/// Deletes a [`User`].
///
/// Allowed to admins only.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_FOUND`: no such `User`.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "users.delete",
        user_id = path.as_ref().ok().map(|p| display(p.0)),
    ),
)]
pub async fn delete(
    ctx: Context,
    path: Result<Path<user::Id>, PathRejection>,
) -> Result<Json<api::Message>, Error> {
    _ = ctx.authorize(user::Roles::ADMIN).await?;
    let Path(user_id) = path?;

    ctx.service()
        .execute(command::DeleteUser { user_id })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("User deleted successfully".into()))
}

impl AsError for command::update_user_role::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
        }
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
        }
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "User not found"]
        NotExists,
    }
}

#[cfg(test)]
mod spec {
    use service::domain::user::Role;

    use super::ListParams;

    #[test]
    fn parses_list_params() {
        let params: ListParams =
            serde_json::from_str(r#"{"role": "owner", "page": 2}"#).unwrap();

        assert_eq!(params.role, Some(Role::Owner));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.page_size, None);
    }
}

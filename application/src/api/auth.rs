//! Authentication endpoints.

use axum::{http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use derive_more::Debug;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::user,
};

use crate::{
    api::{self, ValidationError},
    define_error, AsError, Context, Error,
};

/// Request body of [`register()`].
#[derive(Debug, Deserialize)]
pub struct Registration {
    /// Desired [`user::Username`].
    pub username: String,

    /// Desired [`user::Password`].
    #[debug(skip)]
    pub password: String,

    /// Desired [`user::Role`].
    pub role: String,
}

/// Response body of [`register()`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Registered {
    /// Confirmation message.
    pub message: &'static str,

    /// ID of the registered [`user::User`].
    pub user_id: user::Id,
}

/// Registers a new [`user::User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_USERNAME`, `INVALID_PASSWORD`, `INVALID_ROLE`: malformed input;
/// - `USERNAME_OCCUPIED`: the username is taken by another `User`.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "register", username = %body.username),
)]
pub async fn register(
    ctx: Context,
    WithRejection(Json(body), _): WithRejection<Json<Registration>, Error>,
) -> Result<(StatusCode, Json<Registered>), Error> {
    let Registration {
        username,
        password,
        role,
    } = body;
    let username =
        user::Username::new(username).ok_or(ValidationError::Username)?;
    let password =
        user::Password::new(password).ok_or(ValidationError::Password)?;
    let role = role
        .parse::<user::Role>()
        .map_err(|_| ValidationError::Role)?;

    let user = ctx
        .service()
        .execute(command::CreateUser {
            username,
            password: SecretBox::init_with(move || password),
            role,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((
        StatusCode::CREATED,
        Json(Registered {
            message: "User registered successfully",
            user_id: user.id,
        }),
    ))
}

/// Request body of [`login()`].
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// [`user::Username`] of the [`user::User`].
    pub username: String,

    /// [`user::Password`] of the [`user::User`].
    #[debug(skip)]
    pub password: String,
}

/// Response body of [`login()`].
#[derive(Debug, Serialize)]
pub struct LoggedIn {
    /// Signed [`user::session::Token`] of the created [`user::Session`].
    #[debug(skip)]
    pub token: String,
}

/// Creates a new [`user::Session`] by the provided [`Credentials`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_USERNAME`, `INVALID_PASSWORD`: missing or malformed input;
/// - `USER_NOT_FOUND`: no `User` has the provided username;
/// - `WRONG_PASSWORD`: the password doesn't match.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "login", username = %body.username),
)]
pub async fn login(
    ctx: Context,
    WithRejection(Json(body), _): WithRejection<Json<Credentials>, Error>,
) -> Result<Json<LoggedIn>, Error> {
    let Credentials { username, password } = body;
    let username =
        user::Username::new(username).ok_or(ValidationError::Username)?;
    let password =
        user::Password::new(password).ok_or(ValidationError::Password)?;

    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByCredentials {
            username,
            password: SecretBox::init_with(move || password),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(LoggedIn {
        token: AsRef::<str>::as_ref(&output.token).to_owned(),
    }))
}

/// Revokes the presented [`user::session::Token`].
///
/// # Errors
///
/// Possible error codes:
/// - `TOKEN_REQUIRED`: no token is presented;
/// - `TOKEN_ALREADY_REVOKED`: the token has been revoked already;
/// - `INVALID_TOKEN`, `TOKEN_EXPIRED`: the token cannot be accepted.
#[tracing::instrument(skip_all, fields(http.handler = "logout"))]
pub async fn logout(ctx: Context) -> Result<Json<api::Message>, Error> {
    let token = ctx.token()?.ok_or(LogoutError::TokenRequired)?;

    _ = ctx
        .service()
        .execute(command::RevokeUserSession { token })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json("Successfully logged out".into()))
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USERNAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Username already exists"]
                UsernameOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHashing(_) | Self::PasswordHashingTask(_) => None,
            Self::UsernameOccupied(_) => Some(Error::UsernameOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "USER_NOT_FOUND"]
                #[status = NOT_FOUND]
                #[message = "User not found"]
                UserNotExists,

                #[code = "WRONG_PASSWORD"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid password"]
                WrongPassword,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_)
            | Self::PasswordVerificationTask(_) => None,
            Self::UserNotExists(_) => Some(Error::UserNotExists.into()),
            Self::WrongPassword => Some(Error::WrongPassword.into()),
        }
    }
}

impl AsError for command::revoke_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Decode(e) => e.try_as_error(),
            Self::AlreadyRevoked => Some(LogoutError::AlreadyRevoked.into()),
        }
    }
}

define_error! {
    enum LogoutError {
        #[code = "TOKEN_ALREADY_REVOKED"]
        #[status = BAD_REQUEST]
        #[message = "Token has been revoked already"]
        AlreadyRevoked,

        #[code = "TOKEN_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Token required"]
        TokenRequired,
    }
}

#[cfg(test)]
mod spec {
    use service::{
        command::{create_user, create_user_session, revoke_user_session},
        domain::user,
        infra::jwt,
    };

    use crate::AsError as _;

    #[test]
    fn maps_registration_errors() {
        let err = create_user::ExecutionError::UsernameOccupied(
            user::Username::new("alice").unwrap(),
        )
        .into_error();
        assert_eq!(err.code, "USERNAME_OCCUPIED");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn maps_login_errors() {
        let err =
            create_user_session::ExecutionError::WrongPassword.into_error();
        assert_eq!(err.code, "WRONG_PASSWORD");
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);

        let err = create_user_session::ExecutionError::UserNotExists(
            user::Username::new("alice").unwrap(),
        )
        .into_error();
        assert_eq!(err.code, "USER_NOT_FOUND");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn maps_logout_errors() {
        let err =
            revoke_user_session::ExecutionError::AlreadyRevoked.into_error();
        assert_eq!(err.code, "TOKEN_ALREADY_REVOKED");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);

        let err = revoke_user_session::ExecutionError::Decode(
            jwt::DecodeError::Expired,
        )
        .into_error();
        assert_eq!(err.code, "TOKEN_EXPIRED");
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
    }
}

//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts};
use service::{
    command::{self, Command as _},
    domain::user::{session, Roles, Session},
    infra::jwt,
};
use tokio::sync::OnceCell;

use crate::{define_error, AsError, Error, Service};

/// Name of the header carrying a [`session::Token`] in the first place.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Request context.
///
/// Authenticates the request lazily, at most once.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Headers of the HTTP request.
    headers: http::HeaderMap,

    /// Current [`Session`].
    current_session: OnceCell<Session>,

    /// Last authentication [`Error`].
    auth_error: OnceCell<Error>,
}

impl Context {
    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`session::Token`] presented with the request, if any.
    ///
    /// # Errors
    ///
    /// If the presented [`session::Token`] is malformed.
    pub fn token(&self) -> Result<Option<session::Token>, Error> {
        extract_token(&self.headers)
    }

    /// Returns the current [`Session`] for this [`Context`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request carries no token;
    /// - the provided token is malformed, expired or revoked.
    pub async fn current_session(&self) -> Result<Session, Error> {
        self.current_session
            .get_or_try_init(|| async {
                match self
                    .auth_error
                    .get_or_try_init(|| async {
                        match self.do_authentication().await {
                            Ok(s) => Err(s),
                            Err(e) => Ok(e),
                        }
                    })
                    .await
                {
                    Ok(e) => Err(e),
                    Err(s) => Ok(s),
                }
            })
            .await
            .cloned()
            .map_err(Clone::clone)
    }

    /// Returns the current [`Session`] for this [`Context`] if its role is
    /// one of the `allowed` [`Roles`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request is not authenticated;
    /// - the role of the current [`Session`] is not `allowed`.
    pub async fn authorize(&self, allowed: Roles) -> Result<Session, Error> {
        let session = self.current_session().await?;
        if allowed.contains(session.role) {
            Ok(session)
        } else {
            Err(AuthError::InsufficientRole.into())
        }
    }

    /// Performs the [`Session`] authentication.
    ///
    /// # Errors
    ///
    /// Errors if the provided authentication token is missing or invalid.
    async fn do_authentication(&self) -> Result<Session, Error> {
        let token = self
            .token()?
            .ok_or_else(|| Error::from(AuthError::AuthorizationRequired))?;
        self.service
            .execute(command::AuthorizeUserSession { token })
            .await
            .map_err(AsError::into_error)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        Ok(Self {
            service,
            headers: parts.headers.clone(),
            current_session: OnceCell::new(),
            auth_error: OnceCell::new(),
        })
    }
}

/// Extracts a [`session::Token`] from the provided [`http::HeaderMap`].
///
/// The [`ACCESS_TOKEN_HEADER`] is preferred over the `Authorization` one. A
/// `Bearer ` prefix is stripped from either of them.
///
/// # Errors
///
/// If the found header doesn't contain a well-formed [`session::Token`].
pub fn extract_token(
    headers: &http::HeaderMap,
) -> Result<Option<session::Token>, Error> {
    let Some(value) = headers
        .get(ACCESS_TOKEN_HEADER)
        .or_else(|| headers.get(http::header::AUTHORIZATION))
    else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| Error::from(AuthError::InvalidToken))?;
    let raw = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    session::Token::new(raw)
        .map(Some)
        .ok_or_else(|| AuthError::InvalidToken.into())
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Decode(e) => e.try_as_error(),
            Self::Revoked => Some(AuthError::TokenRevoked.into()),
        }
    }
}

impl AsError for jwt::DecodeError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Expired => AuthError::TokenExpired.into(),
            Self::Invalid(_) => AuthError::InvalidToken.into(),
        })
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,

        #[code = "INSUFFICIENT_ROLE"]
        #[status = FORBIDDEN]
        #[message = "Access denied: insufficient permissions"]
        InsufficientRole,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Token is invalid"]
        InvalidToken,

        #[code = "TOKEN_EXPIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Token has expired"]
        TokenExpired,

        #[code = "TOKEN_REVOKED"]
        #[status = UNAUTHORIZED]
        #[message = "Token has been revoked"]
        TokenRevoked,
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use secrecy::SecretBox;
    use service::{
        command::{self, authorize_user_session, Command as _},
        domain::user::{self, Roles},
        infra::{jwt, Memory},
        task::prune_revoked_sessions,
    };
    use tokio::sync::OnceCell;

    use crate::{AsError as _, Service};

    use super::{extract_token, Context, ACCESS_TOKEN_HEADER};

    fn headers(pairs: &[(&'static str, &'static str)]) -> http::HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| {
                (
                    http::HeaderName::from_static(k),
                    http::HeaderValue::from_static(v),
                )
            })
            .collect()
    }

    fn token(pairs: &[(&'static str, &'static str)]) -> Option<String> {
        extract_token(&headers(pairs))
            .unwrap()
            .map(|t| AsRef::<str>::as_ref(&t).to_owned())
    }

    #[test]
    fn prefers_access_token_header() {
        assert_eq!(
            token(&[
                (ACCESS_TOKEN_HEADER, "a.b.c"),
                ("authorization", "Bearer x.y.z"),
            ]),
            Some("a.b.c".to_owned()),
        );
    }

    #[test]
    fn strips_bearer_prefix_from_either_header() {
        assert_eq!(
            token(&[("authorization", "Bearer x.y.z")]),
            Some("x.y.z".to_owned()),
        );
        assert_eq!(
            token(&[(ACCESS_TOKEN_HEADER, "Bearer a.b.c")]),
            Some("a.b.c".to_owned()),
        );
        assert_eq!(
            token(&[("authorization", "x.y.z")]),
            Some("x.y.z".to_owned()),
        );
    }

    #[test]
    fn missing_token_is_none() {
        assert_eq!(token(&[("content-type", "application/json")]), None);
    }

    #[test]
    fn rejects_blank_token() {
        let err = extract_token(&headers(&[("authorization", "Bearer ")]))
            .unwrap_err();

        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "INVALID_TOKEN");
    }

    /// Creates a new [`Service`] over an empty [`Memory`] database.
    fn service() -> Service {
        Service::new(
            service::Config {
                jwt: jwt::Codec::new(b"secret", Duration::from_secs(3600)),
                prune_revoked_sessions: prune_revoked_sessions::Config {
                    interval: Duration::from_secs(3600),
                },
            },
            Memory::new(),
        )
        .0
    }

    /// Creates a new [`Context`] of a request presenting the provided token.
    fn context(svc: &Service, token: Option<&str>) -> Context {
        let headers = token
            .map(|t| {
                (
                    http::header::AUTHORIZATION,
                    http::HeaderValue::from_str(&format!("Bearer {t}"))
                        .unwrap(),
                )
            })
            .into_iter()
            .collect();
        Context {
            service: svc.clone(),
            headers,
            current_session: OnceCell::new(),
            auth_error: OnceCell::new(),
        }
    }

    /// Registers a new owner and issues a token for it at the provided moment.
    async fn owner_token(svc: &Service, now: DateTime) -> String {
        let owner = svc
            .execute(command::CreateUser {
                username: user::Username::new("olga").unwrap(),
                password: SecretBox::new(Box::new(
                    user::Password::new("pw123").unwrap(),
                )),
                role: user::Role::Owner,
            })
            .await
            .unwrap();
        let (_, token) = svc.config().jwt.issue(&owner, now).unwrap();
        AsRef::<str>::as_ref(&token).to_owned()
    }

    #[tokio::test]
    async fn authorizes_by_role() {
        let svc = service();
        let token = owner_token(&svc, DateTime::now()).await;
        let ctx = context(&svc, Some(&token));

        let session = ctx.authorize(Roles::ADMIN_OR_OWNER).await.unwrap();
        assert_eq!(AsRef::<str>::as_ref(&session.username), "olga");

        let err = ctx.authorize(Roles::ADMIN).await.unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);
        assert_eq!(err.code, "INSUFFICIENT_ROLE");
    }

    #[tokio::test]
    async fn requires_authentication_before_role() {
        let svc = service();
        let ctx = context(&svc, None);

        let err = ctx.authorize(Roles::ANY).await.unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "AUTHORIZATION_REQUIRED");

        let err = ctx.authorize(Roles::ADMIN).await.unwrap_err();
        assert_eq!(err.code, "AUTHORIZATION_REQUIRED");
    }

    #[tokio::test]
    async fn rejects_revoked_and_expired_tokens() {
        let svc = service();
        let token = owner_token(&svc, DateTime::now()).await;
        drop(
            svc.execute(command::RevokeUserSession {
                token: user::session::Token::new(token.clone()).unwrap(),
            })
            .await
            .unwrap(),
        );

        let err = context(&svc, Some(&token))
            .authorize(Roles::ANY)
            .await
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "TOKEN_REVOKED");

        let svc = service();
        let token = owner_token(
            &svc,
            DateTime::now() - Duration::from_secs(2 * 3600),
        )
        .await;
        let err = context(&svc, Some(&token))
            .authorize(Roles::ANY)
            .await
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "TOKEN_EXPIRED");
    }

    #[test]
    fn maps_authorization_errors() {
        let err = authorize_user_session::ExecutionError::Revoked.into_error();
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "TOKEN_REVOKED");

        let err = authorize_user_session::ExecutionError::Decode(
            jwt::DecodeError::Expired,
        )
        .into_error();
        assert_eq!(err.status_code, http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, "TOKEN_EXPIRED");
    }
}

//! [`Command`] definition.

pub mod add_property_review;
pub mod authorize_user_session;
pub mod create_property;
pub mod create_user;
pub mod create_user_session;
pub mod delete_property;
pub mod delete_property_review;
pub mod delete_user;
pub mod revoke_user_session;
pub mod update_property;
pub mod update_property_review;
pub mod update_user_role;
pub mod view_property;

use crate::domain::{user, Property, Session};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_property_review::AddPropertyReview,
    authorize_user_session::AuthorizeUserSession,
    create_property::CreateProperty, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_property::DeleteProperty,
    delete_property_review::DeletePropertyReview, delete_user::DeleteUser,
    revoke_user_session::RevokeUserSession, update_property::UpdateProperty,
    update_property_review::UpdatePropertyReview,
    update_user_role::UpdateUserRole, view_property::ViewProperty,
};

/// Checks whether the provided [`Session`] may modify the provided
/// [`Property`].
///
/// Admins may modify any [`Property`], owners only their own ones.
fn may_manage(session: &Session, property: &Property) -> bool {
    match session.role {
        user::Role::Admin => true,
        user::Role::Owner => property.is_owned_by(&session.username),
        user::Role::Tenant => false,
    }
}

//! [`User`] read model definition.
//!
//! [`User`]: crate::domain::User

pub mod list {
    //! [`User`]s list definitions.

    use common::define_pagination;

    use crate::domain::{user, User};

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = User;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// [`user::Role`] the listed [`User`]s should have.
        pub role: Option<user::Role>,
    }

    impl Filter {
        /// Checks whether the provided [`User`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, user: &User) -> bool {
            self.role.map_or(true, |r| user.role == r)
        }
    }
}

//! [`Review`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::{Property, User};

/// Review of a [`Property`] left by a [`User`], embedded into the reviewed
/// [`Property`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Review {
    /// ID of this [`Review`].
    pub id: Id,

    /// [`user::Username`] of the author at the moment of writing.
    pub user: user::Username,

    /// ID of the [`User`] who authored this [`Review`].
    pub user_id: user::Id,

    /// [`Rating`] given by this [`Review`].
    pub rating: Rating,

    /// [`Comment`] of this [`Review`].
    pub comment: Comment,

    /// [`DateTime`] when this [`Review`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: CreationDateTime,
}

impl Review {
    /// Checks whether this [`Review`] is authored by the [`User`] with the
    /// provided ID.
    #[must_use]
    pub fn is_authored_by(&self, user_id: user::Id) -> bool {
        self.user_id == user_id
    }
}

/// ID of a [`Review`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Rating given by a [`Review`], from `1` to `5` stars.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest possible [`Rating`].
    pub const MIN: u8 = 1;

    /// Highest possible [`Rating`].
    pub const MAX: u8 = 5;

    /// Creates a new [`Rating`] if the given `stars` are within
    /// [`Rating::MIN`]`..=`[`Rating::MAX`].
    #[must_use]
    pub fn new<N: TryInto<u8>>(stars: N) -> Option<Self> {
        let stars = stars.try_into().ok()?;
        (Self::MIN..=Self::MAX).contains(&stars).then_some(Self(stars))
    }
}

impl TryFrom<u8> for Rating {
    type Error = &'static str;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars).ok_or("`Rating` must be between 1 and 5")
    }
}

/// Free-form text of a [`Review`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[serde(transparent)]
pub struct Comment(String);

impl Comment {
    /// Maximum length of a [`Comment`] in characters.
    pub const MAX_LEN: usize = 2000;

    /// Creates a new [`Comment`] if the given `text` is not too long.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.chars().count() <= Self::MAX_LEN).then_some(Self(text))
    }
}

/// [`DateTime`] when a [`Review`] was created.
pub type CreationDateTime = DateTimeOf<(Review, unit::Creation)>;

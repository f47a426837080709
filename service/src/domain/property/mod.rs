//! [`Property`] definitions.

pub mod review;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

pub use self::review::Review;

/// Property offered for rent.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    /// ID of this [`Property`].
    pub id: Id,

    /// [`OwnerName`] of this [`Property`].
    pub owner_name: OwnerName,

    /// [`Kind`] of this [`Property`].
    pub kind: Kind,

    /// [`Location`] of this [`Property`].
    pub location: Location,

    /// [`RentalPrice`] of this [`Property`].
    pub rental_price: RentalPrice,

    /// Number of bedrooms in this [`Property`].
    pub bedrooms: NumBedrooms,

    /// Number of bathrooms in this [`Property`].
    pub bathrooms: NumBathrooms,

    /// [`Availability`] of this [`Property`].
    pub availability: Availability,

    /// Number of times this [`Property`] has been viewed.
    pub views: Views,

    /// [`Review`]s of this [`Property`], in the order they were added.
    pub reviews: Vec<Review>,

    /// [`AverageRating`] of all the [`Review`]s of this [`Property`].
    pub average_rating: AverageRating,

    /// [`DateTime`] when this [`Property`] was created.
    pub created_at: CreationDateTime,
}

impl Property {
    /// Returns the [`Review`] of this [`Property`] with the provided ID.
    #[must_use]
    pub fn review(&self, id: review::Id) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == id)
    }

    /// Returns the mutable [`Review`] of this [`Property`] with the provided
    /// ID.
    #[must_use]
    pub fn review_mut(&mut self, id: review::Id) -> Option<&mut Review> {
        self.reviews.iter_mut().find(|r| r.id == id)
    }

    /// Removes the [`Review`] with the provided ID from this [`Property`],
    /// returning it.
    pub fn remove_review(&mut self, id: review::Id) -> Option<Review> {
        let idx = self.reviews.iter().position(|r| r.id == id)?;
        Some(self.reviews.remove(idx))
    }

    /// Recalculates the [`AverageRating`] of this [`Property`] out of its
    /// current [`Review`]s.
    pub fn recompute_average_rating(&mut self) {
        self.average_rating = AverageRating::of(&self.reviews);
    }

    /// Checks whether this [`Property`] belongs to the [`User`] with the
    /// provided [`user::Username`].
    #[must_use]
    pub fn is_owned_by(&self, username: &user::Username) -> bool {
        self.owner_name.matches(username)
    }
}

/// ID of a [`Property`].
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
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of the owner of a [`Property`].
///
/// Refers to a [`User`] by their [`user::Username`] rather than by ID.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct OwnerName(String);

impl OwnerName {
    /// Creates a new [`OwnerName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`OwnerName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        !name.trim().is_empty() && name.chars().count() <= 128
    }

    /// Checks whether this [`OwnerName`] refers to the provided
    /// [`user::Username`].
    ///
    /// Surrounding whitespace is ignored and the comparison is
    /// case-insensitive.
    #[must_use]
    pub fn matches(&self, username: &user::Username) -> bool {
        let username: &str = username.as_ref();
        self.0.trim().to_lowercase() == username.trim().to_lowercase()
    }
}

impl From<user::Username> for OwnerName {
    fn from(username: user::Username) -> Self {
        Self(username.into())
    }
}

/// Kind of a [`Property`] (`apartment`, `house`, etc).
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Kind(String);

impl Kind {
    /// Creates a new [`Kind`] if the given `kind` is valid.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Option<Self> {
        let kind = kind.into();
        Self::check(&kind).then_some(Self(kind))
    }

    /// Checks whether the given `kind` is a valid [`Kind`].
    fn check(kind: impl AsRef<str>) -> bool {
        let kind = kind.as_ref();
        kind.trim() == kind && !kind.is_empty() && kind.len() <= 64
    }
}

impl FromStr for Kind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Kind`")
    }
}

/// Named geographic point where a [`Property`] is located.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    /// Human-readable [`LocationName`].
    pub name: LocationName,

    /// Geographic [`Coordinates`].
    pub coordinates: Coordinates,
}

/// Human-readable name of a [`Location`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct LocationName(String);

impl LocationName {
    /// Creates a new [`LocationName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`LocationName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }

    /// Checks whether this [`LocationName`] contains the provided `term`,
    /// ignoring case.
    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.0.to_lowercase().contains(&term.to_lowercase())
    }
}

/// Geographic coordinates of a [`Location`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    /// [`Longitude`] of the point.
    pub longitude: Longitude,

    /// [`Latitude`] of the point.
    pub latitude: Latitude,
}

/// Longitude in degrees, within `[-180, 180]`.
#[derive(Clone, Copy, Debug, Display, Into, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Longitude(f64);

impl Longitude {
    /// Creates a new [`Longitude`] if the given `degrees` are in range.
    #[must_use]
    pub fn new(degrees: f64) -> Option<Self> {
        (-180.0..=180.0).contains(&degrees).then_some(Self(degrees))
    }
}

/// Latitude in degrees, within `[-90, 90]`.
#[derive(Clone, Copy, Debug, Display, Into, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Latitude(f64);

impl Latitude {
    /// Creates a new [`Latitude`] if the given `degrees` are in range.
    #[must_use]
    pub fn new(degrees: f64) -> Option<Self> {
        (-90.0..=90.0).contains(&degrees).then_some(Self(degrees))
    }
}

/// Monthly rental price of a [`Property`].
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct RentalPrice(Decimal);

impl RentalPrice {
    /// Creates a new [`RentalPrice`] if the given `amount` is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }
}

/// Number of bedrooms in a [`Property`].
pub type NumBedrooms = u16;

/// Number of bathrooms in a [`Property`].
pub type NumBathrooms = u16;

/// Number of views of a [`Property`].
pub type Views = u64;

define_kind! {
    #[doc = "Availability status of a [`Property`]."]
    enum Availability {
        #[doc = "Open for renting."]
        Available = 1,

        #[doc = "Currently rented out."]
        Rented = 2,

        #[doc = "Withdrawn from renting."]
        Unavailable = 3,
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::Available
    }
}

/// Arithmetic mean of the [`Rating`]s of a [`Property`], rounded to one
/// decimal digit.
///
/// Equals to zero if a [`Property`] has no [`Review`]s.
///
/// [`Rating`]: review::Rating
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct AverageRating(Decimal);

impl AverageRating {
    /// Calculates the [`AverageRating`] of the provided [`Review`]s.
    ///
    /// The mean is computed exactly in decimal, then midpoints are rounded to
    /// the nearest even digit (`4.25` gives `4.2`, `4.35` gives `4.4`).
    #[must_use]
    pub fn of(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self::default();
        }

        let total = reviews
            .iter()
            .map(|r| Decimal::from(u8::from(r.rating)))
            .sum::<Decimal>();
        let count = Decimal::from(reviews.len());

        Self(
            (total / count)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven),
        )
    }
}

/// [`DateTime`] when a [`Property`] was created.
pub type CreationDateTime = DateTimeOf<(Property, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::DateTime;
    use rust_decimal::Decimal;

    use crate::domain::user;

    use super::{
        review, AverageRating, Latitude, Longitude, OwnerName, RentalPrice,
        Review,
    };

    fn review(stars: u8) -> Review {
        Review {
            id: review::Id::new(),
            user: user::Username::new("alice").unwrap(),
            user_id: user::Id::new(),
            rating: review::Rating::new(stars).unwrap(),
            comment: review::Comment::new("ok").unwrap(),
            created_at: DateTime::now().coerce(),
        }
    }

    fn average(stars: &[u8]) -> Decimal {
        AverageRating::of(&stars.iter().copied().map(review).collect::<Vec<_>>())
            .into()
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(&[]), Decimal::ZERO);
    }

    #[test]
    fn average_is_rounded_to_one_digit() {
        assert_eq!(average(&[5]), Decimal::new(50, 1));
        assert_eq!(average(&[5, 3]), Decimal::new(40, 1));
        assert_eq!(average(&[5, 4, 4]), Decimal::new(43, 1));
        assert_eq!(average(&[1, 2, 2]), Decimal::new(17, 1));
    }

    #[test]
    fn average_midpoint_goes_to_even() {
        // 4.25 -> 4.2
        assert_eq!(average(&[5, 4, 4, 4]), Decimal::new(42, 1));
        // 4.75 -> 4.8
        assert_eq!(average(&[5, 5, 5, 4]), Decimal::new(48, 1));
    }

    #[test]
    fn average_midpoint_is_exact() {
        // 87 / 20 = 4.35 exactly.
        let stars = [[5; 7].as_slice(), [4; 13].as_slice()].concat();

        assert_eq!(average(&stars), Decimal::new(44, 1));
    }

    #[test]
    fn owner_name_matching() {
        let name = OwnerName::new("  Alice ").unwrap();

        assert!(name.matches(&user::Username::new("alice").unwrap()));
        assert!(name.matches(&user::Username::new("ALICE").unwrap()));
        assert!(!name.matches(&user::Username::new("alicia").unwrap()));
        assert!(OwnerName::new("   ").is_none());
    }

    #[test]
    fn coordinates_range() {
        assert!(Longitude::new(180.0).is_some());
        assert!(Longitude::new(-180.1).is_none());
        assert!(Latitude::new(-90.0).is_some());
        assert!(Latitude::new(90.5).is_none());
        assert!(Latitude::new(f64::NAN).is_none());
    }

    #[test]
    fn price_is_not_negative() {
        assert!(RentalPrice::new(Decimal::ZERO).is_some());
        assert!(RentalPrice::new(Decimal::new(125_050, 2)).is_some());
        assert!(RentalPrice::new(Decimal::new(-1, 0)).is_none());
    }
}

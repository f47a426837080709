//! [`Property`] read model definitions.

use derive_more::{Display, Error};

use crate::domain::{property, Property, Review};

/// [`Review`]s of a single [`Property`] along with their
/// [`property::AverageRating`].
#[derive(Clone, Debug)]
pub struct Reviews {
    /// ID of the reviewed [`Property`].
    pub property_id: property::Id,

    /// [`property::AverageRating`] of the [`Review`]s.
    pub average_rating: property::AverageRating,

    /// All the [`Review`]s of the [`Property`], in the order they were added.
    pub reviews: Vec<Review>,
}

impl From<Property> for Reviews {
    fn from(property: Property) -> Self {
        Self {
            property_id: property.id,
            average_rating: property.average_rating,
            reviews: property.reviews,
        }
    }
}

pub mod list {
    //! [`Property`] list definitions.

    use common::define_pagination;
    use smart_default::SmartDefault;

    use crate::domain::{property, Property};

    use super::InvalidPriceRange;

    define_pagination!(Node, Filter);

    /// Node in a [`Page`].
    pub type Node = Property;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`PriceRange`] the [`property::RentalPrice`] should fall into.
        pub price: PriceRange,

        /// Exact number of bedrooms.
        pub bedrooms: Option<property::NumBedrooms>,

        /// Exact number of bathrooms.
        pub bathrooms: Option<property::NumBathrooms>,

        /// Case-insensitive part of the [`property::LocationName`].
        pub location: Option<String>,

        /// Exact [`property::Availability`].
        pub availability: Option<property::Availability>,

        /// [`Order`] of the listed [`Property`]s.
        pub order: Order,
    }

    impl Filter {
        /// Checks whether the provided [`Property`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, property: &Property) -> bool {
            let Self {
                price,
                bedrooms,
                bathrooms,
                location,
                availability,
                order: _,
            } = self;

            price.contains(property.rental_price)
                && bedrooms.map_or(true, |n| property.bedrooms == n)
                && bathrooms.map_or(true, |n| property.bathrooms == n)
                && location
                    .as_ref()
                    .map_or(true, |l| property.location.name.contains(l))
                && availability.map_or(true, |a| property.availability == a)
        }
    }

    /// Inclusive range of [`property::RentalPrice`]s, with either bound being
    /// optional.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct PriceRange {
        /// Lowest allowed [`property::RentalPrice`].
        min: Option<property::RentalPrice>,

        /// Highest allowed [`property::RentalPrice`].
        max: Option<property::RentalPrice>,
    }

    impl PriceRange {
        /// Creates a new [`PriceRange`] out of the provided bounds.
        ///
        /// # Errors
        ///
        /// If the lower bound is greater than the upper one.
        pub fn new(
            min: Option<property::RentalPrice>,
            max: Option<property::RentalPrice>,
        ) -> Result<Self, InvalidPriceRange> {
            match (min, max) {
                (Some(min), Some(max)) if min > max => Err(InvalidPriceRange),
                _ => Ok(Self { min, max }),
            }
        }

        /// Returns the lower bound of this [`PriceRange`], if any.
        #[must_use]
        pub fn min(&self) -> Option<property::RentalPrice> {
            self.min
        }

        /// Returns the upper bound of this [`PriceRange`], if any.
        #[must_use]
        pub fn max(&self) -> Option<property::RentalPrice> {
            self.max
        }

        /// Checks whether the provided [`property::RentalPrice`] falls into
        /// this [`PriceRange`].
        #[must_use]
        pub fn contains(&self, price: property::RentalPrice) -> bool {
            self.min.map_or(true, |min| price >= min)
                && self.max.map_or(true, |max| price <= max)
        }
    }

    /// Order of a [`Property`] list.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, SmartDefault)]
    pub enum Order {
        /// From the oldest [`Property`] to the newest one.
        #[default]
        Creation,

        /// From the cheapest [`Property`] to the most expensive one.
        RentalPrice,
    }
}

/// Lower bound of a [`list::PriceRange`] is greater than its upper bound.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("Minimal price is greater than the maximal one")]
pub struct InvalidPriceRange;

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use crate::domain::property::RentalPrice;

    use super::{list::PriceRange, InvalidPriceRange};

    fn price(amount: i64) -> RentalPrice {
        RentalPrice::new(Decimal::from(amount)).unwrap()
    }

    #[test]
    fn price_range_bounds() {
        let range = PriceRange::new(Some(price(100)), Some(price(200))).unwrap();
        assert!(range.contains(price(100)));
        assert!(range.contains(price(200)));
        assert!(!range.contains(price(99)));
        assert!(!range.contains(price(201)));

        let open = PriceRange::new(None, Some(price(50))).unwrap();
        assert!(open.contains(price(0)));
        assert!(!open.contains(price(51)));

        assert!(PriceRange::default().contains(price(1_000_000)));
    }

    #[test]
    fn price_range_rejects_inverted() {
        assert!(matches!(
            PriceRange::new(Some(price(10)), Some(price(5))),
            Err(InvalidPriceRange),
        ));
    }
}

//! [`Query`] collection related to the multiple [`Property`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Property, Query};
use crate::read;

use super::DatabaseQuery;

/// Queries a page of [`Property`]s passing the provided filter.
pub type List = DatabaseQuery<
    By<read::property::list::Page, read::property::list::Selector>,
>;

#[cfg(test)]
mod spec {
    use common::pagination::Arguments;
    use rust_decimal::Decimal;

    use crate::{
        command::fixture,
        domain::{
            property::{self, Availability, RentalPrice},
            user::Role,
        },
        read::property::list::{Filter, Order, PriceRange, Selector},
        Query as _,
    };

    use super::List;

    fn price(amount: i64) -> RentalPrice {
        RentalPrice::new(Decimal::from(amount)).unwrap()
    }

    #[tokio::test]
    async fn filters_and_orders_by_price() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        for (amount, bedrooms, city) in [
            (900, 3, "Lviv, Rynok 1"),
            (300, 1, "Kyiv, Podil 5"),
            (600, 2, "KYIV, Obolon 7"),
            (1200, 2, "Odesa, Derybasivska 3"),
        ] {
            drop(
                fixture::create_property(&svc, &olga, |p| {
                    p.rental_price = price(amount);
                    p.bedrooms = bedrooms;
                    p.location.name =
                        property::LocationName::new(city).unwrap();
                })
                .await,
            );
        }

        let page = svc
            .execute(List::by(Selector {
                arguments: Arguments::default(),
                filter: Filter {
                    price: PriceRange::new(Some(price(300)), Some(price(900)))
                        .unwrap(),
                    order: Order::RentalPrice,
                    ..Filter::default()
                },
            }))
            .await
            .unwrap();
        let prices = page
            .nodes
            .iter()
            .map(|p| Decimal::from(p.rental_price))
            .collect::<Vec<_>>();
        assert_eq!(
            prices,
            [Decimal::from(300), Decimal::from(600), Decimal::from(900)],
        );

        let page = svc
            .execute(List::by(Selector {
                arguments: Arguments::default(),
                filter: Filter {
                    location: Some("kyiv".into()),
                    bedrooms: Some(2),
                    ..Filter::default()
                },
            }))
            .await
            .unwrap();
        assert_eq!(page.nodes.len(), 1);
        assert_eq!(Decimal::from(page.nodes[0].rental_price), Decimal::from(600));
    }

    #[tokio::test]
    async fn filters_by_availability_and_paginates() {
        let svc = fixture::service();
        let olga = fixture::register(&svc, "olga", Role::Owner).await;
        let (olga, _) = fixture::login(&svc, &olga);
        for _ in 0..3 {
            drop(fixture::property(&svc, &olga).await);
        }
        drop(
            fixture::create_property(&svc, &olga, |p| {
                p.availability = Some(Availability::Rented);
            })
            .await,
        );

        let filter = Filter {
            availability: Some(Availability::Available),
            ..Filter::default()
        };
        let first = svc
            .execute(List::by(Selector {
                arguments: Arguments::new(Some(1), Some(2)).unwrap(),
                filter: filter.clone(),
            }))
            .await
            .unwrap();
        assert_eq!(first.nodes.len(), 2);
        assert!(first.has_more);

        let second = svc
            .execute(List::by(Selector {
                arguments: Arguments::new(Some(2), Some(2)).unwrap(),
                filter,
            }))
            .await
            .unwrap();
        assert_eq!(second.nodes.len(), 1);
        assert!(!second.has_more);
        assert!(first.nodes.iter().all(|p| p.id != second.nodes[0].id));
    }
}

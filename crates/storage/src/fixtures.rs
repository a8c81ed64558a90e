use estate_core::{NewBuyer, NewSeller};
use serde::Serialize;

use crate::{BuyerRepository, SellerRepository, StoreResult};

/// (name, budget, location, property_type, contact)
pub const FIXTURE_BUYERS: [(&str, &str, &str, &str, &str); 2] = [
    ("Rahul", "50L", "Bangalore", "2BHK", "+91 98765 43210"),
    ("Anita", "80L", "Bangalore", "3BHK", "+91 98765 43211"),
];

/// (name, property_type, location, price, contact)
pub const FIXTURE_SELLERS: [(&str, &str, &str, &str, &str); 2] = [
    ("Mr. Sharma", "2BHK", "Whitefield", "45L", "+91 98765 43210"),
    ("Priya", "3BHK", "Indiranagar", "75L", "+91 98765 43211"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub buyers_inserted: usize,
    pub sellers_inserted: usize,
}

/// Inserts the demo rows into each table that is currently empty.
///
/// The emptiness check and the inserts are separate statements, so two
/// processes starting against the same empty database can both seed.
pub async fn seed_fixtures<S>(store: &S) -> StoreResult<SeedReport>
where
    S: BuyerRepository + SellerRepository,
{
    let mut report = SeedReport::default();

    if store.count_buyers().await? == 0 {
        for (name, budget, location, property_type, contact) in FIXTURE_BUYERS {
            store
                .create_buyer(NewBuyer {
                    name: name.to_string(),
                    budget: budget.to_string(),
                    location: location.to_string(),
                    property_type: property_type.to_string(),
                    contact: contact.to_string(),
                })
                .await?;
            report.buyers_inserted += 1;
        }
    }

    if store.count_sellers().await? == 0 {
        for (name, property_type, location, price, contact) in FIXTURE_SELLERS {
            store
                .create_seller(NewSeller {
                    name: name.to_string(),
                    property_type: property_type.to_string(),
                    location: location.to_string(),
                    price: price.to_string(),
                    contact: contact.to_string(),
                })
                .await?;
            report.sellers_inserted += 1;
        }
    }

    Ok(report)
}

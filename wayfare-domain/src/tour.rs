use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tour as listed by an agent. Trips are scheduled departures of a tour;
/// the tour itself only carries the pricing and ownership the booking core
/// needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    /// Price per participant, minor units.
    pub price_amount: i32,
    pub price_currency: String,
    /// The agent who created the tour; authorizes check-in and trip listings.
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    pub fn new(name: String, price_amount: i32, price_currency: String, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            price_amount,
            price_currency,
            owner_id,
            created_at: Utc::now(),
        }
    }
}

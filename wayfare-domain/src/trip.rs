use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled departure of a tour with its own date range and seat capacity.
///
/// `current_participants` is mutated exclusively by the capacity ledger and
/// always satisfies `0 <= current_participants <= max_participants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub tour_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_participants: u32,
    pub current_participants: u32,
    /// Open for new bookings; flipped independently by the tour owner.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(
        tour_id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        max_participants: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tour_id,
            start_date,
            end_date,
            max_participants,
            current_participants: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seats still open on this trip.
    pub fn available(&self) -> u32 {
        self.max_participants.saturating_sub(self.current_participants)
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_date < now
    }
}

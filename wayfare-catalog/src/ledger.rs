use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;
use wayfare_domain::Trip;

/// The sole arbiter of trip occupancy.
///
/// Every reserve/release runs its full check-and-mutate under the write
/// guard, so two concurrent reservations on the same trip can never both
/// read stale occupancy and overbook.
pub struct CapacityLedger {
    trips: RwLock<HashMap<Uuid, Trip>>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self {
            trips: RwLock::new(HashMap::new()),
        }
    }

    /// Register a trip with the ledger.
    pub async fn add_trip(&self, trip: Trip) -> Result<(), LedgerError> {
        if trip.max_participants == 0 {
            return Err(LedgerError::InvalidTrip(
                "max_participants must be positive".to_string(),
            ));
        }
        if trip.start_date >= trip.end_date {
            return Err(LedgerError::InvalidTrip(
                "start date must be before end date".to_string(),
            ));
        }

        self.trips.write().await.insert(trip.id, trip);
        Ok(())
    }

    /// Fully-populated snapshot of a trip.
    pub async fn get(&self, trip_id: Uuid) -> Option<Trip> {
        self.trips.read().await.get(&trip_id).cloned()
    }

    /// Owner action: open or close the trip for new bookings.
    pub async fn set_active(&self, trip_id: Uuid, is_active: bool) -> Result<Trip, LedgerError> {
        let mut trips = self.trips.write().await;
        let trip = trips
            .get_mut(&trip_id)
            .ok_or(LedgerError::TripNotFound(trip_id))?;

        trip.is_active = is_active;
        trip.updated_at = Utc::now();
        Ok(trip.clone())
    }

    /// Atomically reserve `seats` on a trip.
    ///
    /// Availability, activity and end-date checks happen under the same
    /// guard as the increment; callers see either a fully committed
    /// reservation or an error with no occupancy change.
    pub async fn reserve(
        &self,
        trip_id: Uuid,
        seats: u32,
        now: DateTime<Utc>,
    ) -> Result<Trip, LedgerError> {
        let mut trips = self.trips.write().await;
        let trip = trips
            .get_mut(&trip_id)
            .ok_or(LedgerError::TripNotFound(trip_id))?;

        if !trip.is_active {
            return Err(LedgerError::TripInactive(trip_id));
        }
        if trip.has_ended(now) {
            return Err(LedgerError::TripEnded(trip_id));
        }

        let available = trip.available();
        if seats > available {
            return Err(LedgerError::InsufficientCapacity {
                requested: seats,
                available,
            });
        }

        trip.current_participants += seats;
        trip.updated_at = Utc::now();

        tracing::info!(
            trip = %trip_id,
            seats,
            occupancy = trip.current_participants,
            "seats reserved"
        );

        Ok(trip.clone())
    }

    /// Release `seats` back to a trip, floored at zero occupancy.
    ///
    /// Exactly-once invocation per booking is the state machine's job: only
    /// the transition that wins the flip into CANCELLED calls this.
    pub async fn release(&self, trip_id: Uuid, seats: u32) -> Result<Trip, LedgerError> {
        let mut trips = self.trips.write().await;
        let trip = trips
            .get_mut(&trip_id)
            .ok_or(LedgerError::TripNotFound(trip_id))?;

        trip.current_participants = trip.current_participants.saturating_sub(seats);
        trip.updated_at = Utc::now();

        tracing::info!(
            trip = %trip_id,
            seats,
            occupancy = trip.current_participants,
            "seats released"
        );

        Ok(trip.clone())
    }
}

impl Default for CapacityLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("Trip is not open for booking: {0}")]
    TripInactive(Uuid),

    #[error("Trip has already ended: {0}")]
    TripEnded(Uuid),

    #[error("Not enough spots available: requested {requested}, available {available}")]
    InsufficientCapacity { requested: u32, available: u32 },

    #[error("Invalid trip definition: {0}")]
    InvalidTrip(String),
}

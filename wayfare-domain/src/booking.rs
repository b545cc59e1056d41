use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

/// Payment status, driven by an external payment signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// A participant travelling under a booking. Pure value data, owned by
/// exactly one booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub full_name: String,
}

impl Participant {
    pub fn new(full_name: &str) -> Self {
        Self {
            full_name: full_name.trim().to_string(),
        }
    }
}

/// A customer's reservation of N seats on one trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Human-readable daily-sequential code, `BK-YYYYMMDD-NNN`. Used for
    /// on-site check-in.
    pub booking_code: String,
    pub trip_id: Uuid,
    pub tour_id: Uuid,
    pub user_id: Uuid,
    pub participants: Vec<Participant>,
    pub contact_phone: String,
    pub note: Option<String>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Frozen at creation: tour price times participant count.
    pub total_price_amount: i32,
    pub total_price_currency: String,
    pub qr_code_url: Option<String>,
    /// Owned by the trip-reminder job; the booking core never mutates it.
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Number of seats this booking holds on its trip.
    pub fn seat_count(&self) -> u32 {
        self.participants.len() as u32
    }

    /// Update lifecycle status, stamping `updated_at`.
    pub fn update_status(&mut self, new_status: BookingStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequest {
    pub trip_id: Uuid,
    pub participant_names: Vec<String>,
    pub contact_phone: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_code: String,
    pub trip_id: Uuid,
    pub tour_id: Uuid,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub total_price_amount: i32,
    pub total_price_currency: String,
    pub participant_names: Vec<String>,
    pub number_of_participants: u32,
    pub contact_phone: String,
    pub note: Option<String>,
    pub qr_code_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        let participant_names: Vec<String> = booking
            .participants
            .iter()
            .map(|p| p.full_name.clone())
            .collect();

        Self {
            id: booking.id,
            booking_code: booking.booking_code.clone(),
            trip_id: booking.trip_id,
            tour_id: booking.tour_id,
            status: booking.status.clone(),
            payment_status: booking.payment_status.clone(),
            total_price_amount: booking.total_price_amount,
            total_price_currency: booking.total_price_currency.clone(),
            number_of_participants: participant_names.len() as u32,
            participant_names,
            contact_phone: booking.contact_phone.clone(),
            note: booking.note.clone(),
            qr_code_url: booking.qr_code_url.clone(),
            created_at: booking.created_at,
        }
    }
}

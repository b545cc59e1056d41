use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use wayfare_catalog::{CapacityLedger, LedgerError, TourDirectory};
use wayfare_domain::{
    Booking, BookingResponse, BookingStatus, Caller, CreateBookingRequest, Participant,
    PaymentStatus,
};

use crate::codegen::BookingCodeGenerator;
use crate::collaborators::{EmailSink, NotificationKind, NotificationSink, QrIssuer};

/// Owns the booking lifecycle and orchestrates the capacity ledger.
///
/// The booking table sits behind a single write guard, so every status
/// transition is a serialized check-and-set: when a user cancel and the
/// expiration sweep race on one booking, exactly one flips it to CANCELLED
/// and only that winner releases the seats.
pub struct BookingManager {
    tours: Arc<TourDirectory>,
    ledger: Arc<CapacityLedger>,
    bookings: RwLock<BookingTable>,
    codes: BookingCodeGenerator,
    qr: Arc<dyn QrIssuer>,
    notifications: Arc<dyn NotificationSink>,
    email: Arc<dyn EmailSink>,
    payment_timeout: Duration,
}

#[derive(Default)]
struct BookingTable {
    by_id: HashMap<Uuid, Booking>,
    by_code: HashMap<String, Uuid>,
}

/// Outcome of one expiration sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub cancelled: Vec<String>,
    pub failed: usize,
}

impl BookingManager {
    pub fn new(
        tours: Arc<TourDirectory>,
        ledger: Arc<CapacityLedger>,
        qr: Arc<dyn QrIssuer>,
        notifications: Arc<dyn NotificationSink>,
        email: Arc<dyn EmailSink>,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            tours,
            ledger,
            bookings: RwLock::new(BookingTable::default()),
            codes: BookingCodeGenerator::new(),
            qr,
            notifications,
            email,
            payment_timeout,
        }
    }

    /// Create a booking: reserve seats, allocate a code, persist the booking
    /// PENDING/PENDING, then run side effects strictly after the commit.
    pub async fn create_booking(
        &self,
        caller: &Caller,
        request: CreateBookingRequest,
    ) -> Result<BookingResponse, BookingError> {
        let participants: Vec<Participant> = request
            .participant_names
            .iter()
            .map(|name| Participant::new(name))
            .filter(|p| !p.full_name.is_empty())
            .collect();
        if participants.is_empty() {
            return Err(BookingError::Validation(
                "at least one participant is required".to_string(),
            ));
        }
        let seats = participants.len() as u32;

        let trip = self
            .ledger
            .get(request.trip_id)
            .await
            .ok_or(BookingError::TripNotFound(request.trip_id))?;
        let tour = self
            .tours
            .get(trip.tour_id)
            .await
            .ok_or(BookingError::TourNotFound(trip.tour_id))?;

        // The ledger re-validates active/ended/capacity atomically with the
        // increment; nothing is booked past this point without seats held.
        let trip = self.ledger.reserve(request.trip_id, seats, Utc::now()).await?;

        let now = Utc::now();
        let booking_code = self.codes.next(now).await;
        let booking = Booking {
            id: Uuid::new_v4(),
            booking_code: booking_code.clone(),
            trip_id: trip.id,
            tour_id: tour.id,
            user_id: caller.user_id,
            total_price_amount: tour.price_amount * seats as i32,
            total_price_currency: tour.price_currency.clone(),
            participants,
            contact_phone: request.contact_phone,
            note: request.note,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            qr_code_url: None,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        };
        let booking_id = booking.id;

        {
            let mut table = self.bookings.write().await;
            table.by_code.insert(booking_code.clone(), booking_id);
            table.by_id.insert(booking_id, booking);
        }

        tracing::info!(
            code = %booking_code,
            trip = %trip.id,
            tour = %tour.id,
            user = %caller.user_id,
            seats,
            "booking created"
        );

        // QR issuance runs after the commit; a booking without a QR is valid
        // and the URL can be regenerated later.
        match self.qr.issue(&booking_code).await {
            Ok(url) => self.attach_qr_url(booking_id, url).await,
            Err(err) => {
                tracing::warn!(code = %booking_code, error = %err, "qr issuance failed");
            }
        }

        // Owner notification is detached from the booking path entirely.
        let notifications = Arc::clone(&self.notifications);
        let title = "New booking!".to_string();
        let body = format!(
            "{} booked {} for {} participant(s)",
            caller.display_name, tour.name, seats
        );
        let owner_id = tour.owner_id;
        let tour_id = tour.id;
        tokio::spawn(async move {
            if let Err(err) = notifications
                .notify(owner_id, NotificationKind::NewBooking, &title, &body, Some(tour_id))
                .await
            {
                tracing::error!(error = %err, "failed to notify tour owner of new booking");
            }
        });

        self.get_booking(booking_id).await
    }

    /// External payment signal: PENDING/PENDING becomes CONFIRMED/PAID.
    pub async fn confirm_payment(
        &self,
        caller: &Caller,
        booking_id: Uuid,
    ) -> Result<BookingResponse, BookingError> {
        let snapshot = {
            let mut table = self.bookings.write().await;
            let booking = table
                .by_id
                .get_mut(&booking_id)
                .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))?;

            if booking.user_id != caller.user_id {
                return Err(BookingError::Unauthorized(
                    "pay for this booking".to_string(),
                ));
            }
            if booking.status == BookingStatus::Cancelled {
                return Err(BookingError::AlreadyCancelled(booking.booking_code.clone()));
            }
            if booking.status != BookingStatus::Pending
                || booking.payment_status != PaymentStatus::Pending
            {
                return Err(BookingError::InvalidTransition {
                    from: format!("{:?}", booking.status),
                    to: "CONFIRMED".to_string(),
                });
            }

            booking.payment_status = PaymentStatus::Paid;
            booking.update_status(BookingStatus::Confirmed);
            booking.clone()
        };

        tracing::info!(code = %snapshot.booking_code, "payment confirmed");

        let email = Arc::clone(&self.email);
        tokio::spawn(async move {
            if let Err(err) = email.send_booking_confirmed(&snapshot).await {
                tracing::error!(
                    code = %snapshot.booking_code,
                    error = %err,
                    "failed to send booking confirmation email"
                );
            }
        });

        self.get_booking(booking_id).await
    }

    /// User-initiated cancellation. Releases the booking's exact seat count,
    /// exactly once.
    pub async fn cancel_booking(
        &self,
        caller: &Caller,
        booking_id: Uuid,
    ) -> Result<BookingResponse, BookingError> {
        let snapshot = {
            let mut table = self.bookings.write().await;
            let booking = table
                .by_id
                .get_mut(&booking_id)
                .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))?;

            if booking.user_id != caller.user_id {
                return Err(BookingError::Unauthorized(
                    "cancel this booking".to_string(),
                ));
            }
            if booking.status == BookingStatus::Cancelled {
                return Err(BookingError::AlreadyCancelled(booking.booking_code.clone()));
            }
            if booking.status == BookingStatus::Completed {
                return Err(BookingError::InvalidTransition {
                    from: format!("{:?}", booking.status),
                    to: "CANCELLED".to_string(),
                });
            }

            // Payment status is left as-is; a paid cancellation is settled by
            // the out-of-scope refund flow.
            booking.update_status(BookingStatus::Cancelled);
            booking.clone()
        };

        // Only the winner of the flip reaches this release.
        self.ledger
            .release(snapshot.trip_id, snapshot.seat_count())
            .await?;

        tracing::info!(code = %snapshot.booking_code, "booking cancelled");
        Ok(BookingResponse::from(&snapshot))
    }

    /// On-site check-in, keyed by booking code and authorized against the
    /// parent tour's owner. Only CONFIRMED/PAID bookings can complete.
    pub async fn check_in(
        &self,
        caller: &Caller,
        booking_code: &str,
    ) -> Result<BookingResponse, BookingError> {
        let booking = self
            .find_by_code(booking_code)
            .await
            .ok_or_else(|| BookingError::BookingNotFound(booking_code.to_string()))?;
        let tour = self
            .tours
            .get(booking.tour_id)
            .await
            .ok_or(BookingError::TourNotFound(booking.tour_id))?;

        if tour.owner_id != caller.user_id {
            return Err(BookingError::Unauthorized(
                "check in bookings for this tour".to_string(),
            ));
        }

        let snapshot = {
            let mut table = self.bookings.write().await;
            let booking = table
                .by_id
                .get_mut(&booking.id)
                .ok_or_else(|| BookingError::BookingNotFound(booking_code.to_string()))?;

            if booking.status == BookingStatus::Cancelled {
                return Err(BookingError::AlreadyCancelled(booking.booking_code.clone()));
            }
            if booking.status != BookingStatus::Confirmed
                || booking.payment_status != PaymentStatus::Paid
            {
                return Err(BookingError::InvalidTransition {
                    from: format!("{:?}", booking.status),
                    to: "COMPLETED".to_string(),
                });
            }

            booking.update_status(BookingStatus::Completed);
            booking.clone()
        };

        tracing::info!(code = %snapshot.booking_code, "check-in completed");
        Ok(BookingResponse::from(&snapshot))
    }

    /// Re-run QR issuance for a booking whose initial issue failed.
    pub async fn regenerate_qr(
        &self,
        caller: &Caller,
        booking_id: Uuid,
    ) -> Result<BookingResponse, BookingError> {
        let booking = self
            .find_by_id(booking_id)
            .await
            .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))?;
        if booking.user_id != caller.user_id {
            return Err(BookingError::Unauthorized(
                "regenerate the QR for this booking".to_string(),
            ));
        }

        let url = self
            .qr
            .issue(&booking.booking_code)
            .await
            .map_err(|err| BookingError::QrUnavailable(err.to_string()))?;
        self.attach_qr_url(booking_id, url).await;

        self.get_booking(booking_id).await
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<BookingResponse, BookingError> {
        self.find_by_id(booking_id)
            .await
            .map(|booking| BookingResponse::from(&booking))
            .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))
    }

    /// The caller's own bookings, newest first.
    pub async fn bookings_for_user(&self, caller: &Caller) -> Vec<BookingResponse> {
        let table = self.bookings.read().await;
        let mut bookings: Vec<&Booking> = table
            .by_id
            .values()
            .filter(|b| b.user_id == caller.user_id)
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings.into_iter().map(BookingResponse::from).collect()
    }

    /// Bookings on one trip; tour-owner only.
    pub async fn bookings_for_trip(
        &self,
        caller: &Caller,
        trip_id: Uuid,
    ) -> Result<Vec<BookingResponse>, BookingError> {
        let trip = self
            .ledger
            .get(trip_id)
            .await
            .ok_or(BookingError::TripNotFound(trip_id))?;
        self.ensure_tour_owner(caller, trip.tour_id).await?;

        let table = self.bookings.read().await;
        let mut bookings: Vec<&Booking> = table
            .by_id
            .values()
            .filter(|b| b.trip_id == trip_id)
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings.into_iter().map(BookingResponse::from).collect())
    }

    /// Bookings across all trips of one tour; tour-owner only.
    pub async fn bookings_for_tour(
        &self,
        caller: &Caller,
        tour_id: Uuid,
    ) -> Result<Vec<BookingResponse>, BookingError> {
        self.ensure_tour_owner(caller, tour_id).await?;

        let table = self.bookings.read().await;
        let mut bookings: Vec<&Booking> = table
            .by_id
            .values()
            .filter(|b| b.tour_id == tour_id)
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings.into_iter().map(BookingResponse::from).collect())
    }

    /// Review eligibility: the booking's owner may review only a completed
    /// booking.
    pub async fn ensure_review_eligible(
        &self,
        caller: &Caller,
        booking_id: Uuid,
    ) -> Result<(), BookingError> {
        let booking = self
            .find_by_id(booking_id)
            .await
            .ok_or_else(|| BookingError::BookingNotFound(booking_id.to_string()))?;

        if booking.user_id != caller.user_id {
            return Err(BookingError::Unauthorized(
                "review this booking".to_string(),
            ));
        }
        if booking.status != BookingStatus::Completed {
            return Err(BookingError::NotYetCompleted(booking.booking_code));
        }
        Ok(())
    }

    /// Expiration sweep body: cancel every unpaid booking older than the
    /// payment window, releasing its seats. One failing booking never aborts
    /// the rest; it stays pending and is retried next cycle.
    pub async fn cancel_expired(&self, now: DateTime<Utc>) -> SweepReport {
        let cutoff = now - self.payment_timeout;

        let expired: Vec<Uuid> = {
            let table = self.bookings.read().await;
            table
                .by_id
                .values()
                .filter(|b| {
                    b.payment_status == PaymentStatus::Pending
                        && b.status != BookingStatus::Cancelled
                        && b.created_at < cutoff
                })
                .map(|b| b.id)
                .collect()
        };

        let mut report = SweepReport::default();
        if expired.is_empty() {
            return report;
        }
        tracing::info!(count = expired.len(), "found expired unpaid bookings to cancel");

        for booking_id in expired {
            match self.expire_one(booking_id).await {
                Ok(Some(code)) => report.cancelled.push(code),
                // A user transition won the race between select and flip.
                Ok(None) => {}
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(
                        booking = %booking_id,
                        error = %err,
                        "failed to expire booking"
                    );
                }
            }
        }
        report
    }

    async fn expire_one(&self, booking_id: Uuid) -> Result<Option<String>, BookingError> {
        let snapshot = {
            let mut table = self.bookings.write().await;
            let Some(booking) = table.by_id.get_mut(&booking_id) else {
                return Ok(None);
            };
            // Re-check under the guard; a confirm or cancel may have landed
            // since the sweep selected this booking.
            if booking.payment_status != PaymentStatus::Pending
                || booking.status == BookingStatus::Cancelled
            {
                return Ok(None);
            }

            // Payment stays PENDING: it was never paid.
            booking.update_status(BookingStatus::Cancelled);
            booking.clone()
        };

        self.ledger
            .release(snapshot.trip_id, snapshot.seat_count())
            .await?;

        tracing::info!(
            code = %snapshot.booking_code,
            created_at = %snapshot.created_at,
            "auto-cancelled expired booking"
        );
        Ok(Some(snapshot.booking_code))
    }

    async fn ensure_tour_owner(&self, caller: &Caller, tour_id: Uuid) -> Result<(), BookingError> {
        let tour = self
            .tours
            .get(tour_id)
            .await
            .ok_or(BookingError::TourNotFound(tour_id))?;
        if tour.owner_id != caller.user_id {
            return Err(BookingError::Unauthorized(
                "view bookings for this tour".to_string(),
            ));
        }
        Ok(())
    }

    async fn attach_qr_url(&self, booking_id: Uuid, url: String) {
        let mut table = self.bookings.write().await;
        if let Some(booking) = table.by_id.get_mut(&booking_id) {
            booking.qr_code_url = Some(url);
            booking.updated_at = Utc::now();
        }
    }

    async fn find_by_id(&self, booking_id: Uuid) -> Option<Booking> {
        self.bookings.read().await.by_id.get(&booking_id).cloned()
    }

    async fn find_by_code(&self, booking_code: &str) -> Option<Booking> {
        let table = self.bookings.read().await;
        let id = table.by_code.get(booking_code)?;
        table.by_id.get(id).cloned()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("Tour not found: {0}")]
    TourNotFound(Uuid),

    #[error("Trip is not open for booking: {0}")]
    TripInactive(Uuid),

    #[error("Trip has already ended: {0}")]
    TripEnded(Uuid),

    #[error("Not enough spots available: requested {requested}, available {available}")]
    InsufficientCapacity { requested: u32, available: u32 },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("Not authorized to {0}")]
    Unauthorized(String),

    #[error("Booking is already cancelled: {0}")]
    AlreadyCancelled(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Booking is not completed yet: {0}")]
    NotYetCompleted(String),

    #[error("QR issuance failed: {0}")]
    QrUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl From<LedgerError> for BookingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::TripNotFound(id) => BookingError::TripNotFound(id),
            LedgerError::TripInactive(id) => BookingError::TripInactive(id),
            LedgerError::TripEnded(id) => BookingError::TripEnded(id),
            LedgerError::InsufficientCapacity {
                requested,
                available,
            } => BookingError::InsufficientCapacity {
                requested,
                available,
            },
            LedgerError::InvalidTrip(msg) => BookingError::Validation(msg),
        }
    }
}

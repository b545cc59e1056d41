use async_trait::async_trait;
use uuid::Uuid;
use wayfare_domain::Booking;

/// Side-effect collaborators are fire-and-forget: a failure here is logged
/// and never rolls back or blocks a committed booking transition.
pub type CollaboratorResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NewBooking,
}

/// Renders and hosts a QR image for a booking code.
#[async_trait]
pub trait QrIssuer: Send + Sync {
    async fn issue(&self, booking_code: &str) -> CollaboratorResult<String>;
}

/// In-app notification dispatch, e.g. to the tour owner on a new booking.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        recipient: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
        reference: Option<Uuid>,
    ) -> CollaboratorResult<()>;
}

/// Transactional email, triggered on payment confirmation.
#[async_trait]
pub trait EmailSink: Send + Sync {
    async fn send_booking_confirmed(&self, booking: &Booking) -> CollaboratorResult<()>;
}

/// Issues deterministic cdn-style URLs without touching object storage.
pub struct MockQrIssuer {
    pub base_url: String,
}

impl Default for MockQrIssuer {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.wayfare.example".to_string(),
        }
    }
}

#[async_trait]
impl QrIssuer for MockQrIssuer {
    async fn issue(&self, booking_code: &str) -> CollaboratorResult<String> {
        let url = format!("{}/qrcodes/{}.png", self.base_url, booking_code);
        tracing::info!(code = booking_code, url = %url, "qr code issued");
        Ok(url)
    }
}

/// Logs notifications instead of delivering them.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(
        &self,
        recipient: Uuid,
        kind: NotificationKind,
        title: &str,
        body: &str,
        reference: Option<Uuid>,
    ) -> CollaboratorResult<()> {
        tracing::info!(
            %recipient,
            ?kind,
            title,
            body,
            reference = ?reference,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Logs confirmation emails instead of sending them.
pub struct LogEmailSink;

#[async_trait]
impl EmailSink for LogEmailSink {
    async fn send_booking_confirmed(&self, booking: &Booking) -> CollaboratorResult<()> {
        tracing::info!(
            code = %booking.booking_code,
            user = %booking.user_id,
            "booking confirmation email sent"
        );
        Ok(())
    }
}

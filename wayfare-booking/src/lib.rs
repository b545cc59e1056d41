pub mod codegen;
pub mod collaborators;
pub mod manager;

pub use codegen::BookingCodeGenerator;
pub use collaborators::{
    EmailSink, LogEmailSink, LogNotificationSink, MockQrIssuer, NotificationKind,
    NotificationSink, QrIssuer,
};
pub use manager::{BookingError, BookingManager, SweepReport};

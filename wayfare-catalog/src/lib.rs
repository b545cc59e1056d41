pub mod directory;
pub mod ledger;

pub use directory::TourDirectory;
pub use ledger::{CapacityLedger, LedgerError};

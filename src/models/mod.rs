//! Data models for Labtrack

pub mod enums;
pub mod equipment;
pub mod pending;
pub mod person;
pub mod transaction;

// Re-export commonly used types
pub use enums::{AvailabilityStatus, OperationalStatus, PersonKind, TransactionType};
pub use equipment::{Equipment, EquipmentDetails};
pub use pending::{PendingMatch, PersonMatchPending};
pub use person::{Client, Technician};
pub use transaction::{RecordTransactionRequest, Transaction};

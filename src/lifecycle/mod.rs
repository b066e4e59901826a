//! Equipment lifecycle rules
//!
//! Pure logic with no I/O: the availability state machine, tracking code
//! issuance, person deduplication and timeline derivation. The services layer
//! wires these to Postgres and Redis.

pub mod matcher;
pub mod state_machine;
pub mod timeline;
pub mod tracking_code;

pub use matcher::{classify, MatchOutcome};
pub use state_machine::{allowed_events, transition, TransitionError};
pub use tracking_code::{CodeKind, TrackingCodeGenerator};

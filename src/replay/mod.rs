//! Trace recording and replay verification.
//!
//! - `record`: [`ActionRecord`], its text and binary encodings
//! - `recorder`: [`ReplayRecorder`], fed by the driver during a live run
//! - `verifier`: [`ReplayVerifier`], re-runs a record and compares outcomes

pub mod record;
pub mod recorder;
pub mod verifier;

pub use record::{ActionRecord, RecordedResult};
pub use recorder::ReplayRecorder;
pub use verifier::ReplayVerifier;

//! Closed-loop tuning for the weighted brush-matching engine.
//!
//! Feeds production match output and reviewer validations back into the
//! scoring configuration: confidence flagging, old/new system comparison,
//! learning reports, an optional external advisor, and transactional
//! weight updates with backup and rollback.

pub mod services;
pub mod types;

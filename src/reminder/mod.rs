//! Local reminder engine.
//!
//! Every two seconds the scan checks the signed-in owner's unpaid
//! appointments and fires each due reminder once per session. Marking
//! the reminder as sent is handed to a separate write-back task so the
//! scan never waits on storage.

pub mod clock;
pub mod engine;

pub use clock::{Clock, SystemClock};
pub use engine::{
    is_due, start_reminder_engine, ReminderContext, ReminderEngine, ReminderEngineHandle,
    WriteFailureHook,
};

//! Session state across hook invocations.
//!
//! Every hook event runs in a fresh process, so the only thing a `Stop` knows
//! about the `UserPromptSubmit` before it is what landed on disk.
//!
//! # Module Structure
//!
//! - [`store`]: keyed, file-backed record storage (`~/.claude/.sessions/<id>.json`)
//! - [`tracker`]: task-start recording, duration, idle suppression, retention sweep
//! - [`types`]: the on-disk record

mod store;
mod tracker;
mod types;

pub use store::{FileSessionStore, SessionStore, StoredSession};
pub use tracker::{SessionTracker, StopSnapshot, SweepStats};
pub use types::{SessionRecord, IDLE_SUPPRESSION_WINDOW_MS};

//! From a classified event to delivered notifications.
//!
//! # Module Structure
//!
//! - [`decision`]: eligibility rules, channel selection, message content (pure)
//! - [`fanout`]: concurrent, failure-isolated delivery

mod decision;
mod fanout;

pub use decision::{
    check_prompt_eligible, contains_error_marker, decide, notification_label, session_prefix,
    ChannelTarget, Decision, DecisionInput, DesktopContent, DispatchDecision, NotificationKind,
    NotificationPayload, SkipReason, COMPACT_SESSION_PREFIX_LEN, DEFAULT_PROMPT_MESSAGE,
    SESSION_PREFIX_LEN, TASK_COMPLETE_TITLE,
};
pub use fanout::{ChannelOutcome, DispatchReport, Fanout, CHANNEL_TIMEOUT};

//! Local notification channels: desktop banner, speech, terminal activation.

mod system;
mod terminal;

pub use system::{CommandSpec, SystemNotifier};
pub use terminal::{detect_from_env, detect_terminal, Platform, TerminalApp};

use crate::dispatch::DesktopContent;
use crate::error::Result;

/// Platform side effects the dispatcher needs. Implementations block; the
/// fan-out runs them on the blocking pool.
pub trait NotificationCapability: Send + Sync {
    fn notify_desktop(&self, content: &DesktopContent) -> Result<()>;
    fn speak(&self, text: &str) -> Result<()>;
    fn activate_terminal(&self) -> Result<()>;
}

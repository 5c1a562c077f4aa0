//! Notifier Core Library
//!
//! Session tracking and notification dispatch for Claude Code hooks. Each hook
//! event runs as its own short-lived process; everything that must survive
//! between events lives in files under `~/.claude/`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use notifier_core::{classify, load_config, Fanout, HookEngine, StorageConfig};
//!
//! let storage = StorageConfig::from_home()?;
//! let config = load_config(&storage);
//! let engine = HookEngine::new(&storage, config, fanout);
//! let outcome = engine.handle(classify(&stdin)?, chrono::Utc::now()).await;
//! ```
//!
//! ## Module Overview
//!
//! - [`event`]: stdin payload classification
//! - [`session`]: per-session records, duration, idle suppression, retention
//! - [`dispatch`]: eligibility and channel selection, concurrent fan-out
//! - [`notify`]: desktop, voice and terminal activation
//! - [`webhook`]: provider payloads, signing, HTTP delivery
//! - [`engine`]: wires the above together for one invocation
//! - [`config`], [`storage`], [`activity_log`], [`setup`]: configuration,
//!   paths, the user-facing log, Claude settings hook registration

pub mod activity_log;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod notify;
pub mod session;
pub mod setup;
pub mod storage;
pub mod webhook;

pub use activity_log::ActivityLog;
pub use config::{config_exists, load_config, save_config, NotifierConfig, WebhookConfig, WebhookKind};
pub use dispatch::{Fanout, DispatchReport};
pub use engine::{HandleOutcome, HookEngine};
pub use error::{NotifierError, Result};
pub use event::{classify, ClassifyError, HookEvent};
pub use notify::{NotificationCapability, SystemNotifier};
pub use storage::StorageConfig;
pub use webhook::{HttpWebhookSender, WebhookSender};

//! notifier-hook: Claude Code hook handler for task notifications.
//!
//! Called directly by Claude Code hooks configured in ~/.claude/settings.json.
//!
//! ## Subcommands
//!
//! - `handle`: Main hook handler, reads JSON from stdin (always exits 0)
//! - `init`, `config`: Create or show `~/.claude/webhook-config.json`
//! - `clean`: Delete the activity log and inactive session records
//! - `test`: Send a synthetic notification through every enabled channel
//! - `hooks`: Show, print, install or check the Claude settings hooks

mod commands;
mod handle;
mod logging;

use clap::{Parser, Subcommand};
use commands::{CleanTarget, HooksAction, TestKind};
use notifier_core::StorageConfig;
use std::time::Duration;

/// Time allowed for channels still running on the blocking pool at exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "notifier-hook")]
#[command(about = "Desktop, voice and webhook notifications for Claude Code")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a hook event (reads JSON from stdin)
    Handle,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration path and effective settings
    Config,

    /// Delete the activity log and/or inactive session records
    Clean {
        #[arg(value_enum, default_value_t = CleanTarget::All)]
        target: CleanTarget,
    },

    /// Send a test notification through the enabled channels
    Test {
        #[arg(value_enum, default_value_t = TestKind::All)]
        kind: TestKind,
    },

    /// Manage the hooks block in Claude Code settings
    Hooks {
        #[arg(value_enum, default_value_t = HooksAction::Show)]
        action: HooksAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = run(cli.command);
    std::process::exit(code);
}

fn run(command: Commands) -> i32 {
    let is_hook = matches!(command, Commands::Handle);
    // Hook failures are logged, never surfaced to Claude Code.
    let failure_code = if is_hook { 0 } else { 1 };

    let storage = match StorageConfig::from_home() {
        Ok(storage) => storage,
        Err(e) => {
            if !is_hook {
                eprintln!("Error: {}", e);
            }
            return failure_code;
        }
    };
    let _logging_guard = logging::init(&storage);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            if !is_hook {
                eprintln!("Error: {}", e);
            }
            return failure_code;
        }
    };

    let result = runtime.block_on(async {
        match command {
            Commands::Handle => handle::run(&storage).await,
            Commands::Init { force } => commands::init(&storage, force),
            Commands::Config => commands::show_config(&storage),
            Commands::Clean { target } => commands::clean(&storage, target),
            Commands::Test { kind } => commands::test(&storage, kind).await,
            Commands::Hooks { action } => commands::hooks(&storage, action),
        }
    });
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => 0,
        Err(e) => {
            if is_hook {
                tracing::warn!(error = %e, "notifier-hook handle failed");
            } else {
                tracing::error!(error = %e, "Command failed");
                eprintln!("Error: {}", e);
            }
            failure_code
        }
    }
}

//! Terminal detection.
//!
//! Claude Code runs inside some terminal; desktop notifications on macOS
//! activate that terminal when clicked, and `autoActivateWindow` brings it to
//! the front directly. Detection only reads environment variables.

use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalApp {
    Warp,
    ITerm,
    AppleTerminal,
    WindowsTerminal,
    VsCode,
    Cmd,
    Unknown,
}

impl TerminalApp {
    /// Bundle id passed to `terminal-notifier -activate` and AppleScript.
    /// Anything unrecognized maps to Terminal.app.
    pub fn macos_bundle_id(self) -> &'static str {
        match self {
            TerminalApp::Warp => "dev.warp.Warp-Stable",
            TerminalApp::ITerm => "com.googlecode.iterm2",
            _ => "com.apple.Terminal",
        }
    }

    /// Process name used to find the window on Windows.
    pub fn windows_process_name(self) -> Option<&'static str> {
        match self {
            TerminalApp::WindowsTerminal => Some("WindowsTerminal"),
            TerminalApp::VsCode => Some("Code"),
            _ => None,
        }
    }
}

/// Pure detection from the relevant environment values.
pub fn detect_terminal(
    platform: Platform,
    term_program: Option<&str>,
    in_windows_terminal: bool,
) -> TerminalApp {
    let term_program = term_program.unwrap_or_default();
    match platform {
        Platform::MacOs => {
            if term_program.contains("Warp") {
                TerminalApp::Warp
            } else if term_program.contains("iTerm") {
                TerminalApp::ITerm
            } else {
                TerminalApp::AppleTerminal
            }
        }
        Platform::Windows => {
            if in_windows_terminal {
                TerminalApp::WindowsTerminal
            } else if term_program == "vscode" {
                TerminalApp::VsCode
            } else {
                TerminalApp::Cmd
            }
        }
        Platform::Other => TerminalApp::Unknown,
    }
}

/// Detects the terminal from `TERM_PROGRAM` and `WT_SESSION`.
pub fn detect_from_env(platform: Platform) -> TerminalApp {
    let term_program = env::var("TERM_PROGRAM").ok();
    let in_windows_terminal = env::var_os("WT_SESSION").is_some();
    detect_terminal(platform, term_program.as_deref(), in_windows_terminal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_detection_matches_term_program() {
        assert_eq!(
            detect_terminal(Platform::MacOs, Some("WarpTerminal"), false),
            TerminalApp::Warp
        );
        assert_eq!(
            detect_terminal(Platform::MacOs, Some("iTerm.app"), false),
            TerminalApp::ITerm
        );
        assert_eq!(
            detect_terminal(Platform::MacOs, Some("Apple_Terminal"), false),
            TerminalApp::AppleTerminal
        );
        assert_eq!(
            detect_terminal(Platform::MacOs, None, false),
            TerminalApp::AppleTerminal
        );
    }

    #[test]
    fn windows_prefers_windows_terminal_session() {
        assert_eq!(
            detect_terminal(Platform::Windows, Some("vscode"), true),
            TerminalApp::WindowsTerminal
        );
        assert_eq!(
            detect_terminal(Platform::Windows, Some("vscode"), false),
            TerminalApp::VsCode
        );
        assert_eq!(
            detect_terminal(Platform::Windows, None, false),
            TerminalApp::Cmd
        );
    }

    #[test]
    fn bundle_ids() {
        assert_eq!(TerminalApp::Warp.macos_bundle_id(), "dev.warp.Warp-Stable");
        assert_eq!(TerminalApp::ITerm.macos_bundle_id(), "com.googlecode.iterm2");
        assert_eq!(TerminalApp::Unknown.macos_bundle_id(), "com.apple.Terminal");
        assert_eq!(TerminalApp::Cmd.windows_process_name(), None);
    }

    #[test]
    fn other_platforms_are_unknown() {
        assert_eq!(
            detect_terminal(Platform::Other, Some("iTerm.app"), true),
            TerminalApp::Unknown
        );
    }
}

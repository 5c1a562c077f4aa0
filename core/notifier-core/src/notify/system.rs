//! OS-backed notifications via external commands.
//!
//! Each operation is a list of candidate commands tried in order; the first
//! one that exits successfully wins. Output is always captured so nothing
//! reaches the hook's stdout.

use std::process::{Command, Stdio};

use super::terminal::{detect_from_env, Platform, TerminalApp};
use super::NotificationCapability;
use crate::dispatch::DesktopContent;
use crate::error::{NotifierError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(program: &str, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.to_string(),
            args: args.into_iter().collect(),
        }
    }

    fn run(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| NotifierError::CommandFailed {
                command: self.program.clone(),
                details: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(NotifierError::CommandFailed {
            command: self.program.clone(),
            details: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        })
    }
}

/// Runs candidates in order until one succeeds. An empty list is a no-op.
fn run_first_success(candidates: &[CommandSpec]) -> Result<()> {
    let mut last_err = None;
    for candidate in candidates {
        match candidate.run() {
            Ok(()) => return Ok(()),
            Err(err) => {
                tracing::debug!(command = %candidate.program, error = %err, "Command failed, trying fallback");
                last_err = Some(err);
            }
        }
    }
    match last_err {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn applescript_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn powershell_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn powershell(script: String) -> CommandSpec {
    CommandSpec::new(
        "powershell",
        [
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            script,
        ],
    )
}

pub struct SystemNotifier {
    platform: Platform,
    terminal: TerminalApp,
}

impl SystemNotifier {
    pub fn new(platform: Platform, terminal: TerminalApp) -> Self {
        Self { platform, terminal }
    }

    /// Detects the platform at compile time and the terminal from the environment.
    pub fn detect() -> Self {
        let platform = Platform::current();
        Self::new(platform, detect_from_env(platform))
    }

    pub fn desktop_commands(&self, content: &DesktopContent) -> Vec<CommandSpec> {
        match self.platform {
            Platform::MacOs => {
                let sound = if content.is_error { "Basso" } else { "Glass" };
                vec![
                    CommandSpec::new(
                        "terminal-notifier",
                        [
                            "-title".to_string(),
                            content.title.clone(),
                            "-message".to_string(),
                            content.body.clone(),
                            "-sound".to_string(),
                            sound.to_string(),
                            "-activate".to_string(),
                            self.terminal.macos_bundle_id().to_string(),
                        ],
                    ),
                    CommandSpec::new(
                        "osascript",
                        [
                            "-e".to_string(),
                            format!(
                                "display notification {} with title {} sound name {}",
                                applescript_string(&content.body),
                                applescript_string(&content.title),
                                applescript_string(sound)
                            ),
                        ],
                    ),
                ]
            }
            Platform::Windows => vec![powershell(format!(
                "Add-Type -AssemblyName System.Windows.Forms; \
                 $n = New-Object System.Windows.Forms.NotifyIcon; \
                 $n.Icon = [System.Drawing.SystemIcons]::Information; \
                 $n.Visible = $true; \
                 $n.ShowBalloonTip(5000, {}, {}, 'Info'); \
                 Start-Sleep -Seconds 5; $n.Dispose()",
                powershell_string(&content.title),
                powershell_string(&content.body)
            ))],
            Platform::Other => vec![CommandSpec::new(
                "notify-send",
                [content.title.clone(), content.body.clone()],
            )],
        }
    }

    pub fn speech_commands(&self, text: &str) -> Vec<CommandSpec> {
        match self.platform {
            Platform::MacOs => vec![CommandSpec::new("say", [text.to_string()])],
            Platform::Windows => vec![powershell(format!(
                "Add-Type -AssemblyName System.Speech; \
                 (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak({})",
                powershell_string(text)
            ))],
            Platform::Other => Vec::new(),
        }
    }

    pub fn activation_commands(&self) -> Vec<CommandSpec> {
        match self.platform {
            Platform::MacOs => vec![CommandSpec::new(
                "osascript",
                [
                    "-e".to_string(),
                    format!(
                        "tell application id {} to activate",
                        applescript_string(self.terminal.macos_bundle_id())
                    ),
                ],
            )],
            Platform::Windows => match self.terminal.windows_process_name() {
                Some(process) => vec![powershell(format!(
                    "Add-Type -AssemblyName Microsoft.VisualBasic; \
                     $proc = Get-Process -Name {} -ErrorAction SilentlyContinue | Select-Object -First 1; \
                     if ($proc) {{ [Microsoft.VisualBasic.Interaction]::AppActivate($proc.Id) }}",
                    process
                ))],
                None => Vec::new(),
            },
            Platform::Other => Vec::new(),
        }
    }
}

impl NotificationCapability for SystemNotifier {
    fn notify_desktop(&self, content: &DesktopContent) -> Result<()> {
        run_first_success(&self.desktop_commands(content))
    }

    fn speak(&self, text: &str) -> Result<()> {
        let commands = self.speech_commands(text);
        if commands.is_empty() {
            tracing::debug!("Voice output not supported on this platform");
        }
        run_first_success(&commands)
    }

    fn activate_terminal(&self) -> Result<()> {
        let commands = self.activation_commands();
        if commands.is_empty() {
            tracing::debug!(terminal = ?self.terminal, "No activation strategy for terminal");
        }
        run_first_success(&commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(is_error: bool) -> DesktopContent {
        DesktopContent {
            title: "✅ Task Completed".to_string(),
            body: "Session: 01234567... Took 42s".to_string(),
            is_error,
        }
    }

    #[test]
    fn macos_desktop_prefers_terminal_notifier_then_osascript() {
        let notifier = SystemNotifier::new(Platform::MacOs, TerminalApp::ITerm);
        let commands = notifier.desktop_commands(&content(false));

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].program, "terminal-notifier");
        assert!(commands[0].args.contains(&"Glass".to_string()));
        assert!(commands[0].args.contains(&"com.googlecode.iterm2".to_string()));
        assert_eq!(commands[1].program, "osascript");
    }

    #[test]
    fn error_notifications_use_error_sound() {
        let notifier = SystemNotifier::new(Platform::MacOs, TerminalApp::AppleTerminal);
        let commands = notifier.desktop_commands(&content(true));
        assert!(commands[0].args.contains(&"Basso".to_string()));
    }

    #[test]
    fn applescript_arguments_are_escaped() {
        assert_eq!(applescript_string(r#"say "hi" \ bye"#), r#""say \"hi\" \\ bye""#);
        assert_eq!(powershell_string("it's"), "'it''s'");
    }

    #[test]
    fn linux_uses_notify_send_and_has_no_voice() {
        let notifier = SystemNotifier::new(Platform::Other, TerminalApp::Unknown);
        let commands = notifier.desktop_commands(&content(false));
        assert_eq!(commands[0].program, "notify-send");
        assert!(notifier.speech_commands("hello").is_empty());
        assert!(notifier.activation_commands().is_empty());
    }

    #[test]
    fn windows_activation_needs_known_process() {
        let cmd = SystemNotifier::new(Platform::Windows, TerminalApp::Cmd);
        assert!(cmd.activation_commands().is_empty());

        let wt = SystemNotifier::new(Platform::Windows, TerminalApp::WindowsTerminal);
        let commands = wt.activation_commands();
        assert_eq!(commands[0].program, "powershell");
        assert!(commands[0].args[3].contains("WindowsTerminal"));
    }

    #[test]
    fn empty_candidate_list_is_a_no_op() {
        assert!(run_first_success(&[]).is_ok());
    }

    #[test]
    fn missing_program_is_command_failure() {
        let missing = CommandSpec::new("notifier-test-no-such-binary", Vec::new());
        assert!(matches!(
            run_first_success(&[missing]),
            Err(NotifierError::CommandFailed { .. })
        ));
    }
}

//! Terminal binding of the chat view and the interactive command syntax.

use std::io::Write;
use std::path::PathBuf;

use parley_chat::{ChatView, SettingsPanel, TranscriptEntry, TrayEntry};

// ---------------------------------------------------------------------------
// TerminalView
// ---------------------------------------------------------------------------

/// Renders the session to stdout.
#[derive(Debug, Default)]
pub struct TerminalView;

impl ChatView for TerminalView {
    fn append_entry(&mut self, entry: &TranscriptEntry) {
        println!("{}", format_entry(entry));
    }

    fn set_input(&mut self, _text: &str) {
        // The line editor owns the input; nothing to redraw.
    }

    fn show_settings(&mut self, panel: &SettingsPanel, providers: &[String]) {
        println!("── Settings ──");
        for name in providers {
            let marker = if name == panel.provider_field() { '*' } else { ' ' };
            println!("  {marker} {name}");
        }
        println!("  token: {}", mask_token(panel.token_field()));
        println!("  (/provider <name>, /token <value>, /save, /close)");
    }

    fn hide_settings(&mut self) {
        println!("── Settings closed ──");
    }

    fn show_tray(&mut self, entries: &[TrayEntry]) {
        if entries.is_empty() {
            return;
        }
        println!("Attachments:");
        for entry in entries {
            println!(
                "  [{}] {} ({}, {} bytes)",
                entry.id, entry.name, entry.media_type, entry.size
            );
        }
    }
}

pub fn format_entry(entry: &TranscriptEntry) -> String {
    format!("[{}] {}: {}", entry.at.format("%H:%M"), entry.sender, entry.text)
}

/// Describe a token without revealing it.
pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        "(not set)".to_string()
    } else {
        format!("set ({} chars)", token.chars().count())
    }
}

pub fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

// ---------------------------------------------------------------------------
// Command parsing
// ---------------------------------------------------------------------------

pub const HELP: &str = "\
Type a message and press enter to send it.
  /attach <path>...   add files to the attachment tray
  /detach <id>        remove a file from the tray
  /tray               list pending attachments
  /settings           open the settings panel
  /provider <name>    switch provider (saves the token field first)
  /token [value]      set the token field (empty clears it)
  /save               save settings and close the panel
  /close              close the panel without saving
  /providers          list providers
  /help               show this help
  /quit               exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Send(String),
    Attach(Vec<PathBuf>),
    Detach(u32),
    Tray,
    Settings,
    Provider(String),
    Token(String),
    Save,
    Close,
    Providers,
    Help,
    Quit,
    Invalid(String),
}

/// Parse one input line. Lines not starting with `/` are messages.
pub fn parse_line(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ReplCommand::Send(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "attach" if arg.is_empty() => ReplCommand::Invalid("usage: /attach <path>...".into()),
        "attach" => ReplCommand::Attach(arg.split_whitespace().map(PathBuf::from).collect()),
        "detach" => match arg.parse() {
            Ok(id) => ReplCommand::Detach(id),
            Err(_) => ReplCommand::Invalid("usage: /detach <id>".into()),
        },
        "tray" => ReplCommand::Tray,
        "settings" => ReplCommand::Settings,
        "provider" if arg.is_empty() => ReplCommand::Invalid("usage: /provider <name>".into()),
        "provider" => ReplCommand::Provider(arg.to_string()),
        "token" => ReplCommand::Token(arg.to_string()),
        "save" => ReplCommand::Save,
        "close" => ReplCommand::Close,
        "providers" => ReplCommand::Providers,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("unknown command '/{other}', try /help")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(parse_line("hello there"), ReplCommand::Send("hello there".into()));
        assert_eq!(parse_line("   "), ReplCommand::Send("   ".into()));
    }

    #[test]
    fn attach_takes_multiple_paths() {
        assert_eq!(
            parse_line("/attach a.png  b.jpg"),
            ReplCommand::Attach(vec![PathBuf::from("a.png"), PathBuf::from("b.jpg")])
        );
        assert!(matches!(parse_line("/attach"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn detach_requires_numeric_id() {
        assert_eq!(parse_line("/detach 3"), ReplCommand::Detach(3));
        assert!(matches!(parse_line("/detach x"), ReplCommand::Invalid(_)));
    }

    #[test]
    fn token_may_be_empty() {
        assert_eq!(parse_line("/token"), ReplCommand::Token(String::new()));
        assert_eq!(parse_line("/token sk-abc"), ReplCommand::Token("sk-abc".into()));
    }

    #[test]
    fn settings_commands() {
        assert_eq!(parse_line("/settings"), ReplCommand::Settings);
        assert_eq!(parse_line("/provider Claude"), ReplCommand::Provider("Claude".into()));
        assert_eq!(parse_line("/save"), ReplCommand::Save);
        assert_eq!(parse_line("/close"), ReplCommand::Close);
    }

    #[test]
    fn quit_aliases() {
        for line in ["/quit", "/exit", "/q", "  /quit  "] {
            assert_eq!(parse_line(line), ReplCommand::Quit, "{line}");
        }
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(parse_line("/frobnicate"), ReplCommand::Invalid(ref m) if m.contains("frobnicate")));
    }

    #[test]
    fn mask_token_hides_value() {
        assert_eq!(mask_token(""), "(not set)");
        assert_eq!(mask_token("sk-secret"), "set (9 chars)");
    }

    #[test]
    fn format_entry_includes_sender() {
        let entry = TranscriptEntry::new("System", "An error occurred while processing your request.");
        let line = format_entry(&entry);
        assert!(line.ends_with("System: An error occurred while processing your request."));
        assert!(line.starts_with('['));
    }
}

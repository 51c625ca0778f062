//! Parsing of REPL input lines.

use std::path::PathBuf;

use joblink_core::assistant::InteractionMode;
use joblink_core::user::UserType;

/// Slash commands offered for completion.
pub const COMMANDS: &[&str] = &[
    "/chat", "/image", "/edit", "/load", "/unload", "/user", "/state", "/help",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Quit,
    Help,
    State,
    Mode(InteractionMode),
    Load(PathBuf),
    Unload,
    User(UserType),
    /// Anything that is not a command is submitted as the prompt.
    Prompt(String),
    /// A known command used incorrectly; carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    if trimmed == "quit" || trimmed == "exit" {
        return ReplCommand::Quit;
    }
    if !trimmed.starts_with('/') {
        return ReplCommand::Prompt(trimmed.to_string());
    }

    let (command, argument) = match trimmed.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (trimmed, ""),
    };

    match command {
        "/chat" => ReplCommand::Mode(InteractionMode::Chat),
        "/image" => ReplCommand::Mode(InteractionMode::ImageGenerate),
        "/edit" => ReplCommand::Mode(InteractionMode::ImageEdit),
        "/unload" => ReplCommand::Unload,
        "/state" => ReplCommand::State,
        "/help" => ReplCommand::Help,
        "/load" if argument.is_empty() => ReplCommand::Usage("/load <path-to-image>"),
        "/load" => ReplCommand::Load(PathBuf::from(argument)),
        "/user" => match argument.parse::<UserType>() {
            Ok(user_type) => ReplCommand::User(user_type),
            Err(_) => ReplCommand::Usage("/user student|company"),
        },
        other => ReplCommand::Unknown(other.to_string()),
    }
}

pub fn help_text() -> &'static str {
    "\
/chat                 chat with the assistant
/image                generate an image from a description
/edit                 edit an image loaded with /load
/load <path>          stage the image to edit
/unload               remove the staged image
/user student|company sign in as the other demo user
/state                show the assistant state
/help                 show this help
quit | exit           leave

Anything else is sent as the prompt in the current mode."
}

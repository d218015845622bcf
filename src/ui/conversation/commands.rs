use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Attach an image to a new message
    Attach,
    /// Start an empty chat
    New,
    /// Restart the chat with a greeting
    Reset,
    /// Open the bot settings
    Settings,
    /// Set the bot name in the settings draft
    Name,
    /// Upload a bot avatar into the settings draft
    Avatar,
    /// Commit the settings draft
    Save,
    /// Close the settings without saving
    Discard,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Split `/attach <path> [caption...]` into its path and caption.
    pub fn path_and_caption(&self) -> Option<(&str, &str)> {
        let arg = self.argument()?.trim();
        match arg.split_once(char::is_whitespace) {
            Some((path, caption)) => Some((path, caption.trim())),
            None => Some((arg, "")),
        }
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Attach => "attach an image: /attach <path> [caption]",
            SlashCommand::New => "start a new, empty chat",
            SlashCommand::Reset => "restart the chat with a greeting",
            SlashCommand::Settings => "edit the bot name and avatar",
            SlashCommand::Name => "set the bot name in the settings draft",
            SlashCommand::Avatar => "upload a bot avatar: /avatar <path>",
            SlashCommand::Save => "save the settings draft",
            SlashCommand::Discard => "close the settings without saving",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let head = parts.next()?;

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "clear" => Some(SlashCommand::New),
        "restart" => Some(SlashCommand::Reset),
        "image" | "img" => Some(SlashCommand::Attach),
        "s" | "profile" => Some(SlashCommand::Settings),
        "h" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = parts
        .next()
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(str::to_string);

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /q for /quit, /clear for /new, /restart for /reset, /img for /attach");
    help.push_str("\nPageUp/PageDown scroll the history, Esc closes the settings or file prompt.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_commands() {
        let parsed = parse_slash_command("/new").unwrap();
        assert_eq!(parsed.command, SlashCommand::New);
        assert_eq!(parsed.argument(), None);

        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Quit);
        assert_eq!(parse_slash_command("/restart").unwrap().command, SlashCommand::Reset);
        assert!(parse_slash_command("/unknown").is_none());
        assert!(parse_slash_command("hello /new").is_none());
    }

    #[test]
    fn test_name_argument_keeps_inner_spaces() {
        let parsed = parse_slash_command("/name  Captain  Bot ").unwrap();
        assert_eq!(parsed.command, SlashCommand::Name);
        assert_eq!(parsed.argument(), Some("Captain  Bot"));
    }

    #[test]
    fn test_attach_path_and_caption() {
        let parsed = parse_slash_command("/attach ./cat.png what breed is this?").unwrap();
        assert_eq!(parsed.path_and_caption(), Some(("./cat.png", "what breed is this?")));

        let bare = parse_slash_command("/img cat.png").unwrap();
        assert_eq!(bare.command, SlashCommand::Attach);
        assert_eq!(bare.path_and_caption(), Some(("cat.png", "")));

        assert_eq!(parse_slash_command("/attach").unwrap().path_and_caption(), None);
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = get_help_text();
        for (keyword, _) in built_in_slash_commands() {
            assert!(help.contains(&format!("/{keyword} ")));
        }
    }
}

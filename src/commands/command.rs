//! Command parsing and handling.
//!
//! This module provides command parsing functionality for the bot, converting
//! Matrix message text into structured [`Command`] enums that can be processed
//! by the application.

use command_parser::{Command as ParserCommand, Parser};
use log::debug;

use crate::commands::markdown_response::{format_invalid_register, format_unknown_command};

/// Name every bot command starts with, after the `!` prefix.
pub const BOT_COMMAND: &str = "porter";

/// Represents a parsed bot command.
#[derive(Debug, Hash, PartialEq, Eq)]
pub enum Command {
    /// Display help information
    Help,
    /// Show the tutorial videos
    Tutorial,
    /// Show the game server dashboard link
    Dashboard,
    /// Request access with a game account name
    ///
    /// # Fields
    ///
    /// * `String` - Requested game account name
    Register(String),
    /// Withdraw the caller's registration
    RemoveMe,
    /// List every registration, owner only
    ListUsers,
}

/// Errors that can occur during command parsing.
#[derive(Debug)]
pub enum CommandParsingError {
    /// The message could not be parsed as a command
    UnableToParse,
    /// The command is not for this bot (wrong prefix)
    NotPorter,
    /// The command is not recognized
    Unknown,
    /// The register command has no username
    InvalidRegister,
}

impl Command {
    /// Parses a message string into a Command.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The message is not a command format - [`CommandParsingError::UnableToParse`]
    /// - The command is for a different bot - [`CommandParsingError::NotPorter`]
    /// - The command is not recognized - [`CommandParsingError::Unknown`]
    /// - Register command has no username - [`CommandParsingError::InvalidRegister`]
    pub fn parse(parser: &Parser, body: &str) -> Result<Self, CommandParsingError> {
        // The parser drops the last word, pad the body so nothing is lost
        let body = body.to_string() + " dummy";

        // This is normal to fails if the message is not a command
        let command = match parser.parse(&body) {
            Ok(cmd) => cmd,
            Err(_) => return Err(CommandParsingError::UnableToParse),
        };

        if command.name != BOT_COMMAND {
            return Err(CommandParsingError::NotPorter);
        }

        debug!("Parsing command: {:?}", command);

        if command.arguments.is_empty() {
            return Ok(Command::Help);
        }

        match command.arguments[0].as_str() {
            "help" => Ok(Command::Help),
            "tutorial" => Ok(Command::Tutorial),
            "dashboard" => Ok(Command::Dashboard),
            "register" => Ok(Command::Register(Self::parse_register(&command)?)),
            "removeme" => Ok(Command::RemoveMe),
            "listusers" => Ok(Command::ListUsers),
            _ => Err(CommandParsingError::Unknown),
        }
    }

    fn parse_register(command: &ParserCommand) -> Result<String, CommandParsingError> {
        // 2 arguments: register and username
        if command.arguments.len() < 2 {
            return Err(CommandParsingError::InvalidRegister);
        }

        let username = command.arguments[1].clone();

        debug!("Parsed register command - username: {}", username);

        Ok(username)
    }
}

/// Formats a command error into a user-friendly message.
///
/// Returns `None` for `UnableToParse` and `NotPorter` so that regular chat and
/// other bots' commands get no answer.
pub fn format_command_error(error: CommandParsingError) -> Option<String> {
    match error {
        CommandParsingError::Unknown => Some(format_unknown_command()),
        CommandParsingError::InvalidRegister => Some(format_invalid_register()),
        _ => None,
    }
}

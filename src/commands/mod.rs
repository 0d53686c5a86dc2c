//! Bot command parsing, routing and response formatting.
//!
//! This module is the interaction router of the bot: it turns Matrix messages
//! into commands, runs them against the registration ledger and produces the
//! reply to send back.
//!
//! # Architecture
//!
//! ```text
//! Matrix Message
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Commander  │  ← Entry point: parse() + parse_command()
//! └─────────────┘
//!      │
//!      ├── parse() ──────────► command::Command
//!      │
//!      └── parse_command() ──► Action Handlers ──► CommandResult
//!                               - handle_help             - response (MD)
//!                               - handle_tutorial         - private flag
//!                               - handle_dashboard        - ledger event
//!                               - handle_register   ─┐
//!                               - handle_removeme   ─┼─► Ledger
//!                               - handle_listusers  ─┘   (AccessGuard first)
//! ```
//!
//! Handlers never notify the owner themselves. A committed change is returned
//! as a [`LedgerEvent`] and the caller hands it to [`Commander::notify`] once
//! the user has their reply.
//!
//! # Command Structure
//!
//! All commands follow the format: `!porter <subcommand> [args...]`
//!
//! | Command | Arguments | Description |
//! |---------|-----------|-------------|
//! | `help` | None | Display help information |
//! | `tutorial` | None | Links to the tutorial videos |
//! | `dashboard` | None | Link to the server dashboard |
//! | `register` | `<username>` | Request access with a game username |
//! | `removeme` | None | Withdraw your registration |
//! | `listusers` | None | Owner only, receive all registrations privately |
//!
//! # Error Handling
//!
//! - **Silent Errors** ([`CommandParseError::NotForBot`]): regular chat and other
//!   bots' commands. These never get a response.
//! - **User Errors** ([`CommandParseError::InvalidCommand`]): unknown commands or
//!   missing arguments, answered with a usage message.
//!
//! Errors while running a command (invalid username, name taken, storage failure...)
//! are always turned into a [`CommandResult`], a command never fails.

mod actions;
mod command;
mod commander;
pub mod markdown_response;

pub use crate::commands::commander::Commander;
use crate::notifications::LedgerEvent;

/// Runtime context for command execution.
///
/// # Examples
///
/// ```
/// # use porter::commands::CommandContext;
/// let context = CommandContext {
///     room_id: "!room:example.com".to_string(),
///     user_id: "@user:example.com".to_string(),
///     display_name: "User".to_string(),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Matrix room ID where the command was issued
    pub room_id: String,
    /// Matrix user ID of the command issuer
    pub user_id: String,
    /// Display name of the command issuer, or their user ID if they have none
    pub display_name: String,
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Markdown-formatted response message
    pub response: String,
    /// Deliver the response only to the issuer, in a direct message
    pub private: bool,
    /// Ledger change to report to the owner after replying
    pub event: Option<LedgerEvent>,
}

impl CommandResult {
    /// A response posted in the room where the command was issued.
    pub fn public(response: String) -> Self {
        CommandResult {
            response,
            private: false,
            event: None,
        }
    }

    /// A response only visible to the command issuer.
    pub fn private(response: String) -> Self {
        CommandResult {
            response,
            private: true,
            event: None,
        }
    }

    /// Attaches a committed ledger change to the result.
    pub fn with_event(mut self, event: LedgerEvent) -> Self {
        self.event = Some(event);
        self
    }
}

/// Errors that can occur during command parsing.
#[derive(Debug)]
pub enum CommandParseError {
    /// Message is not for this bot (silent error)
    NotForBot,
    /// Invalid command syntax with error message
    InvalidCommand(String),
}

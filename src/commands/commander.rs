//! Command orchestration and execution.
//!
//! This module provides the [`Commander`] struct, which serves as the main entry point
//! for processing bot commands. It coordinates command parsing and execution, routing
//! commands to their appropriate handlers.
//!
//! # Flow
//!
//! ```text
//! Matrix Message → parse() → Command → parse_command() → CommandResult
//!                                                           │
//!                            reply sent, then notify(event) ◄┘
//! ```
//!
//! The commander owns the shared state every handler works with: the registration
//! ledger, the access guard, the owner notifier and the configured links. It is
//! shared between message tasks behind an `Arc` and every method takes `&self`.

use std::sync::Arc;

use command_parser::Parser;

use crate::{
    access::AccessGuard,
    commands::{
        CommandContext, CommandParseError, CommandResult,
        actions::{
            handle_dashboard, handle_help, handle_listusers, handle_register, handle_removeme,
            handle_tutorial,
        },
        command::{Command, format_command_error},
    },
    config::Links,
    notifications::{LedgerEvent, Messenger, Notifier},
    registrations::{Ledger, SnapshotStore},
};

/// Command orchestrator for parsing and executing bot commands.
///
/// # Command Prefix
///
/// All commands must start with the `!porter` prefix. Messages without this prefix
/// are silently ignored (returning [`CommandParseError::NotForBot`]).
pub struct Commander<S: SnapshotStore, M: Messenger> {
    /// Command parser for processing user commands
    parser: Parser,
    /// Registrations, shared by every message task
    ledger: Ledger<S>,
    /// Decides who may list registrations
    guard: AccessGuard,
    /// Tells the owner about registrations and removals
    notifier: Notifier<M>,
    /// Delivers private replies
    messenger: Arc<M>,
    /// Tutorial and dashboard URLs
    links: Links,
}

impl<S: SnapshotStore, M: Messenger> Commander<S, M> {
    /// Creates a new Commander.
    ///
    /// `admin_id` is the Matrix user ID of the server owner. It is the only user
    /// allowed to list registrations, and the recipient of notifications. When
    /// unset, nobody can list registrations and no notification is sent.
    pub fn new(
        ledger: Ledger<S>,
        messenger: Arc<M>,
        admin_id: Option<String>,
        links: Links,
    ) -> Self {
        let parser = Parser::new('!', '-');
        let guard = AccessGuard::new(admin_id);
        // The owner allowed to list users is the one notified
        let notifier = Notifier::new(Arc::clone(&messenger), guard.admin_id().map(str::to_owned));
        Commander {
            parser,
            ledger,
            guard,
            notifier,
            messenger,
            links,
        }
    }

    /// Parses a Matrix message body into a structured command.
    ///
    /// # Returns
    ///
    /// * `Ok(Command)` - Successfully parsed and validated command
    /// * `Err(CommandParseError::NotForBot)` - Message is not a command or for a different bot
    /// * `Err(CommandParseError::InvalidCommand)` - Command syntax is invalid, with a usage message
    pub fn parse(&self, body: &str) -> Result<Command, CommandParseError> {
        match Command::parse(&self.parser, body) {
            Ok(command) => Ok(command),
            // Only answer errors of commands meant for the bot
            Err(error) => match format_command_error(error) {
                Some(message) => Err(CommandParseError::InvalidCommand(message)),
                None => Err(CommandParseError::NotForBot),
            },
        }
    }

    /// Executes a parsed command and returns the reply.
    ///
    /// Ledger and delivery errors are turned into messages. The owner is not
    /// notified here: a committed change is returned in [`CommandResult::event`]
    /// and must be passed to [`Commander::notify`] after replying.
    ///
    /// # Returns
    ///
    /// * `Some(CommandResult)` - Reply to deliver
    /// * `None` - Command handler rejected the command (invalid command type)
    pub async fn parse_command(
        &self,
        command: &Command,
        context: &CommandContext,
    ) -> Option<CommandResult> {
        let result = match command {
            Command::Help => handle_help(),
            Command::Tutorial => handle_tutorial(&self.links),
            Command::Dashboard => handle_dashboard(&self.links),
            Command::Register(_) => handle_register(context, command, &self.ledger).await?,
            Command::RemoveMe => handle_removeme(context, &self.ledger).await,
            Command::ListUsers => {
                handle_listusers(context, &self.guard, &self.ledger, self.messenger.as_ref())
                    .await
            }
        };

        Some(result)
    }

    /// Tells the owner about a committed ledger change.
    ///
    /// Best effort, see [`Notifier::notify`].
    pub async fn notify(&self, event: &LedgerEvent) {
        self.notifier.notify(event).await;
    }
}

//! Registration command handler.
//!
//! Saves the game username of the issuer in the ledger. The new entry comes
//! back with the reply so the server owner can be told about the request.
//!
//! # Validation
//!
//! The ledger rejects:
//! - **Invalid names**: not 3 to 16 letters, digits or underscores
//! - **Existing registration**: the issuer already registered a name
//! - **Taken names**: another user registered the same name, ignoring case
//!
//! Each rejection gets its own message. Storage failures get a generic message
//! and carry no event.

use log::{debug, error};

use crate::{
    commands::{
        CommandContext, CommandResult,
        command::Command,
        markdown_response::{
            format_internal_error, format_invalid_name, format_name_taken,
            format_successful_register, format_user_already_registered,
        },
    },
    notifications::LedgerEvent,
    registrations::{Collision, Ledger, LedgerError, SnapshotStore},
};

/// Formats a registration error into a human-readable message.
fn format_register_error(error: &LedgerError) -> String {
    match error {
        LedgerError::InvalidName(_) => format_invalid_name(),
        LedgerError::AlreadyRegistered(Collision::User { resource_name }) => {
            format_user_already_registered(resource_name)
        }
        LedgerError::AlreadyRegistered(Collision::Name { resource_name }) => {
            format_name_taken(resource_name)
        }
        _ => format_internal_error(),
    }
}

/// Registers the issuer's game username.
///
/// A successful result carries [`LedgerEvent::Registered`] with the committed
/// entry. Nothing is sent to the owner from here.
///
/// # Returns
///
/// - `Some(CommandResult)`: Always returns a result (success or error message)
/// - `None`: Only if the command is not a `Register` variant
pub async fn handle_register<S: SnapshotStore>(
    context: &CommandContext,
    command: &Command,
    ledger: &Ledger<S>,
) -> Option<CommandResult> {
    debug!("handling register command: {:?}", command);

    let Command::Register(username) = command else {
        return None;
    };

    let entry = match ledger
        .register(&context.user_id, &context.display_name, username)
        .await
    {
        Ok(entry) => entry,
        Err(e) => {
            match e {
                LedgerError::StorageUnavailable(_) | LedgerError::StorageCorrupt(_) => {
                    error!("failed to register {} for {}: {}", username, context.user_id, e)
                }
                _ => debug!("rejected registration of {} for {}: {}", username, context.user_id, e),
            }
            return Some(CommandResult::public(format_register_error(&e)));
        }
    };

    let response = format_successful_register(&entry.resource_name);
    Some(CommandResult::public(response).with_event(LedgerEvent::Registered(entry)))
}

//! Registration removal command handler.
//!
//! Removes the issuer's own registration. Nobody can remove somebody else's
//! registration, and there is no way to update one in place: users remove
//! their registration and register again.

use log::{debug, error};

use crate::{
    commands::{
        CommandContext, CommandResult,
        markdown_response::{
            format_internal_error, format_not_registered, format_successful_removal,
        },
    },
    notifications::LedgerEvent,
    registrations::{Ledger, LedgerError, SnapshotStore},
};

/// Removes the issuer's registration, reporting it as [`LedgerEvent::Removed`].
pub async fn handle_removeme<S: SnapshotStore>(
    context: &CommandContext,
    ledger: &Ledger<S>,
) -> CommandResult {
    debug!("handling removeme command for {} in {}", context.user_id, context.room_id);

    let removed = match ledger.remove(&context.user_id).await {
        Ok(removed) => removed,
        Err(LedgerError::NotRegistered) => {
            return CommandResult::public(format_not_registered());
        }
        Err(e) => {
            error!("failed to remove registration of {}: {}", context.user_id, e);
            return CommandResult::public(format_internal_error());
        }
    };

    let response = format_successful_removal(&removed.resource_name);
    CommandResult::public(response).with_event(LedgerEvent::Removed(removed))
}

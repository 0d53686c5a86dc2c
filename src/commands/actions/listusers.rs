//! Registration listing command handler, owner only.
//!
//! The full list is personal data, so it never goes to the room: the owner
//! receives it in a direct message and the room only gets an acknowledgment.

use log::{debug, warn};

use crate::{
    access::AccessGuard,
    commands::{
        CommandContext, CommandResult,
        markdown_response::{
            format_forbidden, format_no_users, format_users, format_users_not_delivered,
            format_users_sent,
        },
    },
    notifications::Messenger,
    registrations::{Ledger, SnapshotStore},
};

/// Sends every registration to the issuer if they are the owner.
///
/// - Other users get a private rejection and nothing is read from the ledger
/// - An empty ledger is answered in the room directly
/// - A failed direct message is reported back in the room
pub async fn handle_listusers<S: SnapshotStore, M: Messenger>(
    context: &CommandContext,
    guard: &AccessGuard,
    ledger: &Ledger<S>,
    messenger: &M,
) -> CommandResult {
    if !guard.is_privileged(&context.user_id) {
        debug!("refusing listusers to {} in {}", context.user_id, context.room_id);
        return CommandResult::private(format_forbidden());
    }

    let entries = ledger.list_all().await;
    if entries.is_empty() {
        return CommandResult::public(format_no_users());
    }

    match messenger
        .send_direct(&context.user_id, &format_users(&entries))
        .await
    {
        Ok(()) => CommandResult::public(format_users_sent()),
        Err(e) => {
            warn!("failed to send user list to {}: {}", context.user_id, e);
            CommandResult::public(format_users_not_delivered())
        }
    }
}

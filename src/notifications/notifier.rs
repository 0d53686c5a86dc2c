//! Owner notifications for ledger changes.

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    commands::markdown_response::escape_markdown,
    notifications::{LedgerEvent, Messenger},
};

/// Sends [`LedgerEvent`]s to the server owner.
///
/// # Examples
///
/// ```no_run
/// # use std::sync::Arc;
/// # use porter::notifications::{LedgerEvent, Messenger, Notifier};
/// # async fn example<M: Messenger>(messenger: Arc<M>, event: LedgerEvent) {
/// let notifier = Notifier::new(messenger, Some("@owner:example.com".to_string()));
/// // Never fails, delivery errors are logged
/// notifier.notify(&event).await;
/// # }
/// ```
pub struct Notifier<M: Messenger> {
    /// Delivery channel for direct messages
    messenger: Arc<M>,
    /// Matrix user ID of the owner, notifications are disabled when unset
    admin_id: Option<String>,
}

impl<M: Messenger> Notifier<M> {
    pub fn new(messenger: Arc<M>, admin_id: Option<String>) -> Self {
        Notifier {
            messenger,
            admin_id,
        }
    }

    /// Sends `event` to the owner.
    ///
    /// Does nothing if no owner is configured. Delivery failures are logged as
    /// warnings and never retried.
    pub async fn notify(&self, event: &LedgerEvent) {
        let Some(admin_id) = self.admin_id.as_deref() else {
            debug!("no admin configured, skipping notification {:?}", event);
            return;
        };

        if let Err(e) = self
            .messenger
            .send_direct(admin_id, &format_event(event))
            .await
        {
            warn!("failed to notify admin {} of {:?}: {:?}", admin_id, event, e);
        }
    }
}

/// Formats a ledger event for the owner.
///
/// Display names and user IDs come from the sender and are escaped.
fn format_event(event: &LedgerEvent) -> String {
    match event {
        LedgerEvent::Registered(entry) => format!(
            "🆕 Registration request:\n\n- **Matrix**: {}\n- **Game account**: `{}`\n- **User ID**: {}",
            escape_markdown(&entry.display_tag),
            entry.resource_name,
            escape_markdown(&entry.user_id)
        ),
        LedgerEvent::Removed(entry) => format!(
            "🗑️ Removed registration:\n\n- **Matrix**: {}\n- **Game account**: `{}`",
            escape_markdown(&entry.display_tag),
            entry.resource_name
        ),
    }
}

//! Best-effort notifications to the server owner.
//!
//! When a registration is created or removed, the owner receives a direct
//! message describing it. Delivery is a side channel: it happens after the ledger
//! has committed the change, and a failed delivery is logged and forgotten.
//!
//! - [`Messenger`]: delivers direct messages, implemented by the Matrix client
//! - [`Notifier`]: formats [`LedgerEvent`]s and sends them to the owner

use mockall::automock;

mod notifier;

pub use crate::notifications::notifier::Notifier;

use crate::registrations::RegistrationEntry;

/// Sends direct messages to Matrix users.
#[automock]
pub trait Messenger {
    /// Sends `body` (Markdown) in a direct conversation with `user_id`.
    async fn send_direct(&self, user_id: &str, body: &str) -> Result<(), anyhow::Error>;
}

/// A committed change of the ledger worth telling the owner about.
///
/// Events carry a copy of the entry, never a reference into the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A new registration request
    Registered(RegistrationEntry),
    /// A user withdrew their registration
    Removed(RegistrationEntry),
}

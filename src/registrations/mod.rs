//! Registration ledger for game server access requests.
//!
//! This module holds every registration request made through the bot. It consists
//! of three parts:
//!
//! - [`RegistrationEntry`]: a single request, tying a Matrix user to a game account name
//! - [`Ledger`]: the authoritative set of entries with atomic register/remove/list
//! - [`SnapshotStore`]: the persistence seam, implemented by [`JsonSnapshotStore`]
//!
//! # Invariants
//!
//! After every mutation the ledger holds at most one entry per Matrix user and at
//! most one entry per game account name, names being compared case-insensitively.
//! A mutation is only visible once its snapshot has been durably written.

use thiserror::Error;

mod entry;
mod ledger;
mod store;

pub use crate::registrations::entry::{RegistrationEntry, is_valid_name};
pub use crate::registrations::ledger::Ledger;
pub use crate::registrations::store::{JsonSnapshotStore, Snapshot, SnapshotStore};
#[cfg(test)]
pub use crate::registrations::store::MockSnapshotStore;

/// Which uniqueness rule a registration would break.
///
/// Both variants carry the game account name already on file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collision {
    /// The user already has an entry.
    User { resource_name: String },
    /// Another user already registered this name.
    Name { resource_name: String },
}

/// Errors returned by the [`Ledger`] and its [`SnapshotStore`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The name is not 3 to 16 letters, digits or underscores.
    #[error("invalid name {0:?}")]
    InvalidName(String),
    /// The registration would break a uniqueness rule.
    #[error("already registered: {0:?}")]
    AlreadyRegistered(Collision),
    /// The user has no entry to remove.
    #[error("not registered")]
    NotRegistered,
    /// The snapshot could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    /// The stored snapshot exists but cannot be parsed.
    #[error("storage corrupt: {0}")]
    StorageCorrupt(String),
}

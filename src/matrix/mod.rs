//! Matrix client integration.
//!
//! - [`MatrixClient`]: login, sync loop, room replies and direct messages
//! - [`IncomingMessage`]: a text message received in a joined room
//!
//! The client logs in with a password on every start and keeps its state in
//! memory. Rooms the bot is invited to are joined automatically.

mod client;
mod sync;

pub use crate::matrix::client::MatrixClient;

/// User credentials for a Matrix account
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// User ID of the matrix account
    pub user_id: String,
    /// Password of the matrix account
    pub password: String,
}

/// A text message posted in a room the bot has joined.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Plain text body
    pub body: String,
    pub room_id: String,
    pub sender_id: String,
    pub event_id: String,
    /// Room display name of the sender, or their user ID if they have none
    pub display_name: String,
}

//! Command action handlers.
//!
//! Individual handler functions for each bot command. Each handler receives a
//! [`CommandContext`](crate::commands::CommandContext), the collaborators it
//! needs, and returns a [`CommandResult`](crate::commands::CommandResult).
//!
//! # Available Handlers
//!
//! - [`handle_help`] - Display help information
//! - [`handle_tutorial`] - Tutorial videos
//! - [`handle_dashboard`] - Server dashboard link, private
//! - [`handle_register`] - Save the issuer's game username
//! - [`handle_removeme`] - Remove the issuer's registration
//! - [`handle_listusers`] - Send every registration to the owner
//!
//! Handlers never fail: ledger errors are turned into user-facing messages.

mod help;
mod links;
mod listusers;
mod register;
mod removeme;

pub use crate::commands::actions::{
    help::handle_help,
    links::{handle_dashboard, handle_tutorial},
    listusers::handle_listusers,
    register::handle_register,
    removeme::handle_removeme,
};

//! Informational link handlers.
//!
//! `tutorial` posts the videos explaining how to start and join the game server,
//! `dashboard` privately sends the link to the server dashboard. Both are
//! read-only and never touch the ledger.

use log::debug;

use crate::{
    commands::{
        CommandResult,
        markdown_response::{format_dashboard, format_tutorial},
    },
    config::Links,
};

/// Returns the tutorial videos, visible to the whole room.
pub fn handle_tutorial(links: &Links) -> CommandResult {
    debug!("handling tutorial command");

    CommandResult::public(format_tutorial(links))
}

/// Returns the dashboard link, only to the issuer.
pub fn handle_dashboard(links: &Links) -> CommandResult {
    debug!("handling dashboard command");

    CommandResult::private(format_dashboard(links))
}

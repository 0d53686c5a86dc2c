//! Help command handler.
//!
//! Lists the available commands and the username rules. Stateless, always
//! returns the same message.

use log::debug;

use crate::commands::{CommandResult, markdown_response::format_help};

/// Returns formatted help information about available commands.
pub fn handle_help() -> CommandResult {
    debug!("handling help command");

    CommandResult::public(format_help())
}

//! Markdown response formatters for bot commands.
//!
//! This module provides functions to format bot responses in Markdown format
//! for display in Matrix rooms.

use crate::{config::Links, registrations::RegistrationEntry};

/// Characters with a meaning in inline Markdown or HTML.
const MARKDOWN_SPECIAL: &[char] = &[
    '\\', '`', '*', '_', '[', ']', '(', ')', '#', '!', '<', '>', '|', '~',
];

/// Escapes user-controlled text so it renders literally inside a message.
///
/// Line breaks are turned into spaces so the text stays on its list item.
///
/// # Examples
///
/// ```
/// # use porter::commands::markdown_response::escape_markdown;
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\r' => escaped.push(' '),
            c if MARKDOWN_SPECIAL.contains(&c) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Formats the help message showing available bot commands.
///
/// # Examples
///
/// ```
/// # use porter::commands::markdown_response::format_help;
/// let help = format_help();
/// assert!(help.contains("Commands:"));
/// ```
pub fn format_help() -> String {
    let body = "Commands:\n\
        - `tutorial`: how to start and join the game server\n\
        - `dashboard`: link to the server dashboard\n\
        - `register <username>`: register your game username so the owner can give you access\n\
        - `removeme`: remove your saved username\n\
        - `listusers`: show all registered users (owner only)\n\
        - `help`: show this help message\n\n\
        Usernames are 3 to 16 characters long, letters, numbers and underscores only.";

    body.to_owned()
}

/// Formats a response for an unknown command.
pub fn format_unknown_command() -> String {
    "Unknown command. Type `!porter help` for more information.".to_owned()
}

/// Formats an error response for a register command without username.
pub fn format_invalid_register() -> String {
    "Invalid register command. Usage: `!porter register <username>`".to_owned()
}

/// Formats the tutorial message with both videos.
pub fn format_tutorial(links: &Links) -> String {
    format!(
        "Here are both tutorial videos you'll need 👇\n\n\
        - 🎥 **Start the server**: {}\n\
        - 🎮 **Join the server**: {}",
        links.start_video, links.join_video
    )
}

/// Formats the server dashboard link.
pub fn format_dashboard(links: &Links) -> String {
    format!("🌐 Open the server dashboard here: {}", links.dashboard)
}

/// Formats a successful registration.
pub fn format_successful_register(resource_name: &str) -> String {
    format!(
        "🌱 Got it, I saved **{}** and notified the server owner to grant you access.",
        resource_name
    )
}

/// Formats the rejection of a malformed game username.
///
/// The rejected name is not echoed back, it can contain arbitrary Markdown.
pub fn format_invalid_name() -> String {
    "That username doesn't look valid. Usernames are 3 to 16 characters, letters, numbers and underscores only."
        .to_owned()
}

/// Formats the rejection of a user who already has a registration.
pub fn format_user_already_registered(resource_name: &str) -> String {
    format!(
        "You are already registered as **{}**! Use `!porter removeme` first if you want to change it.",
        resource_name
    )
}

/// Formats the rejection of a username registered by someone else.
pub fn format_name_taken(resource_name: &str) -> String {
    format!(
        "The username **{}** is already registered by someone else.",
        resource_name
    )
}

/// Formats a successful removal.
pub fn format_successful_removal(resource_name: &str) -> String {
    format!(
        "🗑️ Removed your username **{}** from my list.",
        resource_name
    )
}

/// Formats the answer to a removal without registration.
pub fn format_not_registered() -> String {
    "I don't have a username for you on file.".to_owned()
}

/// Formats the rejection of an owner-only command.
pub fn format_forbidden() -> String {
    "❌ Only the server owner can use this.".to_owned()
}

/// Formats the answer to `listusers` when nobody is registered.
pub fn format_no_users() -> String {
    "No users registered yet.".to_owned()
}

/// Formats the list of registrations sent to the owner.
///
/// One line per entry, in registration order: display name, username and
/// registration date. Display names are escaped, usernames are already
/// restricted to word characters.
///
/// # Examples
///
/// ```
/// # use porter::commands::markdown_response::format_users;
/// let output = format_users(&[]);
/// assert_eq!(output, "📋 Registered users:\n\n");
/// ```
pub fn format_users(entries: &[RegistrationEntry]) -> String {
    let rows = entries
        .iter()
        .map(|entry| {
            format!(
                "- {} — `{}` ({})",
                escape_markdown(&entry.display_tag),
                entry.resource_name,
                entry.registered_at.format("%Y-%m-%d")
            )
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("📋 Registered users:\n\n{}", rows)
}

/// Formats the acknowledgment that the list was sent privately.
pub fn format_users_sent() -> String {
    "✅ I sent you a direct message with all registered users!".to_owned()
}

/// Formats the failure to deliver the list privately.
pub fn format_users_not_delivered() -> String {
    "I couldn't send you the list in a direct message, please try again later.".to_owned()
}

/// Formats the generic answer to an infrastructure failure.
pub fn format_internal_error() -> String {
    "Something went wrong on my side, please try again later.".to_owned()
}

//! Configuration file structures for the Porter bot.
//!
//! The configuration is read from a YAML file, then overridden by environment
//! variables prefixed with `PORTER_`, nested keys separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Matrix account of the bot
//! matrix:
//!   user_id: "@porter:matrix.org"
//!   password: "secret-password"
//!
//! # Optional, the server owner: receives notifications and may list users
//! registration:
//!   admin_id: "@owner:matrix.org"
//!
//! # Optional, every link has a default
//! links:
//!   start_video: "https://youtu.be/0GUT7KpAoIs"
//!   join_video: "https://youtu.be/UF0Oq-WxXdw"
//!   dashboard: "https://aternos.org/go/"
//! ```
//!
//! ```bash
//! export PORTER_MATRIX__PASSWORD="secret-from-env"
//! export PORTER_REGISTRATION__ADMIN_ID="@owner:matrix.org"
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

/// Root configuration structure for the Porter bot.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Matrix account settings
    pub matrix: Matrix,

    /// Registration settings
    #[serde(default)]
    pub registration: Registration,

    /// Links shared by the tutorial and dashboard commands
    #[serde(default)]
    pub links: Links,
}

/// Matrix account credentials.
#[derive(Debug, Deserialize)]
pub struct Matrix {
    /// Fully qualified Matrix user ID, the homeserver is taken from it
    pub user_id: String,

    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Registration {
    /// Matrix user ID of the server owner.
    ///
    /// Without it, nobody may list registrations and no notification is sent.
    pub admin_id: Option<String>,
}

/// Public URLs given out by the bot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Links {
    /// Video explaining how to start the game server
    pub start_video: String,
    /// Video explaining how to join the game server
    pub join_video: String,
    /// Server dashboard
    pub dashboard: String,
}

impl Default for Links {
    fn default() -> Self {
        Links {
            start_video: "https://youtu.be/0GUT7KpAoIs".to_string(),
            join_video: "https://youtu.be/UF0Oq-WxXdw".to_string(),
            dashboard: "https://aternos.org/go/".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from the YAML file at `path`.
    ///
    /// `PORTER_` environment variables take precedence over the file.
    ///
    /// # Errors
    ///
    /// Fails if the file can't be parsed or a required key is missing from
    /// both the file and the environment.
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("PORTER_").split("__"))
            .extract()
    }
}

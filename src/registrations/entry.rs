//! Registration entries and game account name validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum length of a game account name.
const NAME_MIN_LEN: usize = 3;
/// Maximum length of a game account name.
const NAME_MAX_LEN: usize = 16;

/// A registration request made by a Matrix user.
///
/// Entries are created by [`Ledger::register`](crate::registrations::Ledger::register)
/// and destroyed by [`Ledger::remove`](crate::registrations::Ledger::remove). They are
/// never mutated in place.
///
/// The legacy `discordTag` and `mcName` keys are accepted on read so that data
/// written by older versions of the bot keeps loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEntry {
    /// Matrix user ID of the requester.
    pub user_id: String,
    /// Display name of the requester when the entry was created.
    ///
    /// Informational only, not required to be unique.
    #[serde(alias = "discordTag")]
    pub display_tag: String,
    /// Requested game account name.
    ///
    /// Unique across the ledger, compared case-insensitively.
    #[serde(alias = "mcName")]
    pub resource_name: String,
    /// Creation time of the entry.
    pub registered_at: DateTime<Utc>,
}

impl RegistrationEntry {
    /// Returns `true` if the entry claims `resource_name`, ignoring case.
    pub fn claims(&self, resource_name: &str) -> bool {
        self.resource_name.eq_ignore_ascii_case(resource_name)
    }
}

/// Checks that `name` looks like a game account name.
///
/// Valid names are 3 to 16 characters long and only contain ASCII letters,
/// digits and underscores.
///
/// # Examples
///
/// ```
/// # use porter::registrations::is_valid_name;
/// assert!(is_valid_name("Steve_123"));
/// assert!(!is_valid_name("ab"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    (NAME_MIN_LEN..=NAME_MAX_LEN).contains(&name.len())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry(resource_name: &str) -> RegistrationEntry {
        RegistrationEntry {
            user_id: "@alex:example.com".to_string(),
            display_tag: "Alex".to_string(),
            resource_name: resource_name.to_string(),
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("Steve123"));
        assert!(is_valid_name("abc"));
        assert!(is_valid_name("a_b_c_d_e_f_g_h_"));
        assert!(is_valid_name("___"));
    }

    #[test]
    fn test_is_valid_name_too_short() {
        assert!(!is_valid_name("ab"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_is_valid_name_too_long() {
        assert!(!is_valid_name("abcdefghijklmnopq"));
    }

    #[test]
    fn test_is_valid_name_forbidden_characters() {
        assert!(!is_valid_name("steve-123"));
        assert!(!is_valid_name("steve 123"));
        assert!(!is_valid_name("stéve"));
        assert!(!is_valid_name("<b>hey</b>"));
    }

    #[test]
    fn test_claims_ignores_case() {
        let entry = create_test_entry("Steve123");
        assert!(entry.claims("steve123"));
        assert!(entry.claims("STEVE123"));
        assert!(!entry.claims("Steve1234"));
    }

    #[test]
    fn test_serialize_uses_camel_case_keys() {
        let entry = create_test_entry("Steve123");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["userId"], "@alex:example.com");
        assert_eq!(json["displayTag"], "Alex");
        assert_eq!(json["resourceName"], "Steve123");
        assert!(json["registeredAt"].is_string());
    }

    #[test]
    fn test_deserialize_legacy_keys() {
        let json = r#"{
            "userId": "1234",
            "discordTag": "alex#0001",
            "mcName": "Alex",
            "registeredAt": "2024-05-01T10:20:30.000Z"
        }"#;

        let entry: RegistrationEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.user_id, "1234");
        assert_eq!(entry.display_tag, "alex#0001");
        assert_eq!(entry.resource_name, "Alex");
        assert_eq!(entry.registered_at.to_rfc3339(), "2024-05-01T10:20:30+00:00");
    }
}

//! Well-known per-user setting keys and their implicit defaults.
//!
//! A missing `settings` row means the default applies; rows are only
//! written when a user changes a preference.

/// Whether scheduled reminders are sent to the user. Only the exact value
/// [`ON`] enables them.
pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";

/// Value of [`NOTIFICATIONS_ENABLED`] when the user never set it.
pub const NOTIFICATIONS_DEFAULT: &str = "on";

/// Interface language override.
pub const LANGUAGE: &str = "lang";

pub const ON: &str = "on";
pub const OFF: &str = "off";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_notifications_are_on() {
        assert_eq!(NOTIFICATIONS_DEFAULT, ON);
        assert_ne!(NOTIFICATIONS_DEFAULT, OFF);
    }
}

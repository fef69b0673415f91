//! Configuration access port trait.

/// Sectioned key/value access.
///
/// Only `get_string` is required. The typed getters fall back to `default`
/// when the key is missing or does not parse; strict checking lives in
/// `domain::config_validation`.
pub trait ConfigPort {
    /// Trimmed value, `None` when the key is missing or blank.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.get_string(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage tier the authentication context caches tokens in.
///
/// # Examples
///
/// ```
/// use core_auth::CacheLocation;
///
/// assert_eq!(CacheLocation::parse("sessionStorage"), Some(CacheLocation::SessionStorage));
/// assert_eq!(CacheLocation::default(), CacheLocation::SessionStorage);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CacheLocation {
    /// Tokens live in memory for the lifetime of the process
    #[default]
    SessionStorage,
    /// Tokens are persisted and survive restarts
    LocalStorage,
}

impl CacheLocation {
    /// Get the identifier string used in configuration documents
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::CacheLocation;
    ///
    /// assert_eq!(CacheLocation::LocalStorage.as_str(), "localStorage");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLocation::SessionStorage => "sessionStorage",
            CacheLocation::LocalStorage => "localStorage",
        }
    }

    /// Parse a cache location from a string identifier
    ///
    /// Matching is case-insensitive and accepts the camelCase, snake_case and
    /// short forms.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_auth::CacheLocation;
    ///
    /// assert_eq!(CacheLocation::parse("local"), Some(CacheLocation::LocalStorage));
    /// assert_eq!(CacheLocation::parse("cookies"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sessionstorage" | "session_storage" | "session" => Some(CacheLocation::SessionStorage),
            "localstorage" | "local_storage" | "local" => Some(CacheLocation::LocalStorage),
            _ => None,
        }
    }

    /// Whether cached tokens outlive the current process
    pub fn is_persistent(&self) -> bool {
        matches!(self, CacheLocation::LocalStorage)
    }
}

impl fmt::Display for CacheLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cached bearer token.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts the value
/// and the type deliberately has no `Display` implementation.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
///
/// let token = AccessToken::new("eyJ0eXAi...");
/// assert_eq!(token.as_str(), "eyJ0eXAi...");
/// assert!(!format!("{:?}", token).contains("eyJ0eXAi"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token, e.g. for an `Authorization` header
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the raw token
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_location_as_str() {
        assert_eq!(CacheLocation::SessionStorage.as_str(), "sessionStorage");
        assert_eq!(CacheLocation::LocalStorage.as_str(), "localStorage");
    }

    #[test]
    fn test_cache_location_parse() {
        assert_eq!(
            CacheLocation::parse("sessionStorage"),
            Some(CacheLocation::SessionStorage)
        );
        assert_eq!(
            CacheLocation::parse("SESSION_STORAGE"),
            Some(CacheLocation::SessionStorage)
        );
        assert_eq!(
            CacheLocation::parse(" localStorage "),
            Some(CacheLocation::LocalStorage)
        );
        assert_eq!(CacheLocation::parse("local"), Some(CacheLocation::LocalStorage));
        assert_eq!(CacheLocation::parse("indexedDb"), None);
    }

    #[test]
    fn test_cache_location_persistence() {
        assert!(!CacheLocation::SessionStorage.is_persistent());
        assert!(CacheLocation::LocalStorage.is_persistent());
    }

    #[test]
    fn test_cache_location_serialization() {
        let json = serde_json::to_string(&CacheLocation::SessionStorage).unwrap();
        assert_eq!(json, "\"sessionStorage\"");

        let parsed: CacheLocation = serde_json::from_str("\"localStorage\"").unwrap();
        assert_eq!(parsed, CacheLocation::LocalStorage);
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = AccessToken::new("secret_access_token");
        let debug_str = format!("{:?}", token);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("secret_access_token"));
    }

    #[test]
    fn test_access_token_conversions() {
        let token: AccessToken = "T1".into();
        assert_eq!(token.as_str(), "T1");
        assert_eq!(token.clone().into_string(), "T1".to_string());
        assert_eq!(token, AccessToken::from("T1".to_string()));
    }
}

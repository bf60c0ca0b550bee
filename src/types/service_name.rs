// ABOUTME: DNS-compatible service/instance name validation.
// ABOUTME: Names must be valid RFC 1123 labels so proxies and runtimes accept them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceNameError {
    #[error("service name cannot be empty")]
    Empty,

    #[error("service name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("service name cannot start or end with a hyphen")]
    EdgeHyphen,

    #[error("invalid character in service name: '{0}'")]
    InvalidChar(char),
}

/// A validated service or instance name.
///
/// The same character set is accepted everywhere a name crosses a boundary:
/// container names, router service references, and workspace directory names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, ServiceNameError> {
        if value.is_empty() {
            return Err(ServiceNameError::Empty);
        }
        if value.len() > 63 {
            return Err(ServiceNameError::TooLong);
        }
        if value.starts_with('-') || value.ends_with('-') {
            return Err(ServiceNameError::EdgeHyphen);
        }
        for c in value.chars() {
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ServiceNameError::InvalidChar(c));
            }
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ServiceName {
    type Error = ServiceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        assert!(ServiceName::new("myapp").is_ok());
        assert!(ServiceName::new("my-app-2").is_ok());
        assert!(ServiceName::new("a").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(ServiceName::new("").unwrap_err(), ServiceNameError::Empty);
    }

    #[test]
    fn rejects_uppercase_and_symbols() {
        assert!(matches!(
            ServiceName::new("MyApp"),
            Err(ServiceNameError::InvalidChar('M'))
        ));
        assert!(matches!(
            ServiceName::new("my_app"),
            Err(ServiceNameError::InvalidChar('_'))
        ));
    }

    #[test]
    fn rejects_edge_hyphens() {
        assert_eq!(
            ServiceName::new("-app").unwrap_err(),
            ServiceNameError::EdgeHyphen
        );
        assert_eq!(
            ServiceName::new("app-").unwrap_err(),
            ServiceNameError::EdgeHyphen
        );
    }

    #[test]
    fn rejects_names_over_63_chars() {
        let long = "a".repeat(64);
        assert_eq!(ServiceName::new(&long).unwrap_err(), ServiceNameError::TooLong);
    }
}

//! Credential handling for the generation service.
//!
//! The bearer token is wrapped in [`secrecy::SecretString`] as soon as it is
//! read and only exposed when the `Authorization` header is built.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::ServiceError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential. `Debug` and `Display` never show
/// the value.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: String,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name: name.into(),
        }
    }

    /// Load from the named environment variable. Unset and empty values
    /// are both rejected.
    pub fn from_env(env_var: &str) -> Result<Self, ServiceError> {
        let not_set = || {
            ServiceError::NotConfigured(format!(
                "API key not set: configure '{}' environment variable",
                env_var
            ))
        };

        let credential = std::env::var(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, env_var))
            .map_err(|_| not_set())?;

        if credential.is_empty() {
            return Err(not_set());
        }
        Ok(credential)
    }

    /// Expose the value at the point of use. Never store the result.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted() {
        let cred = ApiCredential::new("sk-secret", CredentialSource::Programmatic, "test key");
        assert!(!format!("{:?}", cred).contains("sk-secret"));
        assert!(!format!("{}", cred).contains("sk-secret"));
        assert_eq!(cred.expose(), "sk-secret");
        assert!(!cred.is_empty());
    }

    #[test]
    fn test_env_credential_records_source() {
        std::env::set_var("RUBRIC_TEST_SECRET_KEY", "sk-env");
        let cred = ApiCredential::from_env("RUBRIC_TEST_SECRET_KEY").unwrap();
        assert_eq!(cred.source(), CredentialSource::Environment);
        assert_eq!(cred.name(), "RUBRIC_TEST_SECRET_KEY");
        assert_eq!(
            format!("{}", cred),
            "RUBRIC_TEST_SECRET_KEY from environment [REDACTED]"
        );
    }

    #[test]
    fn test_empty_env_var_rejected() {
        std::env::set_var("RUBRIC_TEST_EMPTY_KEY", "");
        let result = ApiCredential::from_env("RUBRIC_TEST_EMPTY_KEY");
        assert!(matches!(result, Err(ServiceError::NotConfigured(_))));
    }

    #[test]
    fn test_missing_env_var() {
        let result = ApiCredential::from_env("RUBRIC_TEST_DEFINITELY_UNSET_KEY");
        assert!(matches!(result, Err(ServiceError::NotConfigured(_))));
    }
}

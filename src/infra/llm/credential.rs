use crate::domain::{AdapterError, Credential};
use crate::infra::env::read_env_var;

/// Supplies the API key at call time. Implementations must not perform network I/O.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self) -> Result<Credential, AdapterError>;
}

/// Reads the key from one environment variable on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCredential {
    variable: String,
}

impl EnvCredential {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl CredentialSource for EnvCredential {
    fn resolve(&self) -> Result<Credential, AdapterError> {
        let secret = read_env_var(&self.variable)?.ok_or_else(|| {
            AdapterError::configuration(format!(
                "{} is not set; export it with your API key",
                self.variable
            ))
        })?;
        Credential::new(secret)
    }
}

/// A key fixed at construction, or deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredential {
    credential: Option<Credential>,
}

impl StaticCredential {
    pub fn new(secret: impl Into<String>) -> Result<Self, AdapterError> {
        Ok(Self {
            credential: Some(Credential::new(secret)?),
        })
    }

    pub fn missing() -> Self {
        Self { credential: None }
    }
}

impl CredentialSource for StaticCredential {
    fn resolve(&self) -> Result<Credential, AdapterError> {
        self.credential
            .clone()
            .ok_or_else(|| AdapterError::configuration("API key is not configured"))
    }
}

//! Worker configuration.

use embassy_time::Duration;

use crate::error::ValidationError;
use crate::identity::{self, ClientId, DEFAULT_CLIENT_ID_PREFIX, IdentitySource};

/// Configuration passed to
/// [`MqttContext::start_worker`](crate::runtime::MqttContext::start_worker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Client identifier presented to the broker on every `Connect`.
    pub client_id: ClientId,
    /// How long the dispatcher waits for a command before looping. `None`
    /// waits forever.
    pub receive_timeout: Option<Duration>,
}

impl WorkerConfig {
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            receive_timeout: None,
        }
    }

    /// Derives the client identifier from a hardware address, e.g.
    /// `pub-240ac4123456`.
    pub fn from_identity<I>(identity: &I) -> Result<Self, ValidationError>
    where
        I: IdentitySource + ?Sized,
    {
        identity::client_id_from(DEFAULT_CLIENT_ID_PREFIX, identity).map(Self::new)
    }

    pub fn with_client_id(self, client_id: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            client_id: identity::client_id(client_id)?,
            ..self
        })
    }

    pub fn with_receive_timeout(self, timeout: Duration) -> Self {
        Self {
            receive_timeout: Some(timeout),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = WorkerConfig::from_identity(&[1, 2, 3, 4, 5, 6])
            .unwrap()
            .with_receive_timeout(Duration::from_secs(1));
        assert_eq!(config.client_id.as_str(), "pub-010203040506");
        assert_eq!(config.receive_timeout, Some(Duration::from_secs(1)));

        let config = config.with_client_id("node-7").unwrap();
        assert_eq!(config.client_id.as_str(), "node-7");
        assert_eq!(
            config.with_client_id(""),
            Err(ValidationError::EmptyClientId)
        );
    }
}

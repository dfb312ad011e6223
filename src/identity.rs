//! Client identifiers derived from a hardware address.

use heapless::String;

use crate::error::ValidationError;
use crate::util::{bounded_str, hex_with_prefix};

/// Maximum length of an MQTT client identifier.
pub const MAX_CLIENT_ID_LEN: usize = 32;

/// Prefix used by [`client_id_from`] when none is configured.
pub const DEFAULT_CLIENT_ID_PREFIX: &str = "pub-";

pub type ClientId = String<MAX_CLIENT_ID_LEN>;

/// A source of a stable hardware identifier, typically the base MAC address
/// of the network interface.
pub trait IdentitySource {
    fn hardware_address(&self) -> [u8; 6];
}

impl IdentitySource for [u8; 6] {
    fn hardware_address(&self) -> [u8; 6] {
        *self
    }
}

/// Derives `prefix` + 12 lowercase hex digits of the hardware address.
pub fn client_id_from<I>(prefix: &str, identity: &I) -> Result<ClientId, ValidationError>
where
    I: IdentitySource + ?Sized,
{
    let address = identity.hardware_address();
    hex_with_prefix(prefix, &address).ok_or(ValidationError::ClientIdTooLong {
        len: prefix.len() + 2 * address.len(),
        max: MAX_CLIENT_ID_LEN,
    })
}

/// Validates an explicitly configured client identifier.
pub fn client_id(value: &str) -> Result<ClientId, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyClientId);
    }
    bounded_str(value).ok_or(ValidationError::ClientIdTooLong {
        len: value.len(),
        max: MAX_CLIENT_ID_LEN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_id_from_mac() {
        let mac = [0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56];
        let id = client_id_from(DEFAULT_CLIENT_ID_PREFIX, &mac).unwrap();
        assert_eq!(id.as_str(), "pub-240ac4123456");
    }

    #[test]
    fn long_prefix_is_rejected() {
        let prefix = "a-very-long-client-prefix-";
        assert_eq!(
            client_id_from(prefix, &[0u8; 6]),
            Err(ValidationError::ClientIdTooLong {
                len: prefix.len() + 12,
                max: MAX_CLIENT_ID_LEN
            })
        );
    }

    #[test]
    fn explicit_id_is_validated() {
        assert_eq!(client_id("sensor-1").unwrap().as_str(), "sensor-1");
        assert_eq!(client_id(""), Err(ValidationError::EmptyClientId));
        assert!(client_id(&"x".repeat(MAX_CLIENT_ID_LEN + 1)).is_err());
    }
}

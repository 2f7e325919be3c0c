use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::{DecodeError, DecodeSliceError, Engine};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::{self, FromStr};

/// A freshly generated session identifier: 128 random bits, displayed as 22
/// characters of URL-safe base64.
#[derive(Copy, Clone, Debug, Deserialize, Serialize, Eq, Hash, PartialEq)]
pub struct Id([u8; 16]);

impl Default for Id {
    fn default() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut encoded = [0; 22];
        URL_SAFE_NO_PAD
            .encode_slice(self.0, &mut encoded)
            .map_err(|_| fmt::Error)?;
        let encoded = str::from_utf8(&encoded).map_err(|_| fmt::Error)?;

        f.write_str(encoded)
    }
}

impl FromStr for Id {
    type Err = DecodeSliceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut decoded = [0; 16];
        let bytes_decoded = URL_SAFE_NO_PAD.decode_slice(s.as_bytes(), &mut decoded)?;
        if bytes_decoded != 16 {
            let err = DecodeError::InvalidLength(bytes_decoded);
            return Err(DecodeSliceError::DecodeError(err));
        }

        Ok(Self(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parses_back() {
        let id = Id::default();
        let encoded = id.to_string();

        assert_eq!(encoded.len(), 22);
        assert_eq!(encoded.parse::<Id>().unwrap(), id);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("invalid_session_id".parse::<Id>().is_err());
        assert!("".parse::<Id>().is_err());
        assert!("not base64 at all!!".parse::<Id>().is_err());
    }

    #[test]
    fn test_ids_differ() {
        assert_ne!(Id::default(), Id::default());
    }
}

//! Host string representation.
//!
//! Host runtimes store text as UTF-16 code units; native code uses UTF-8.
//! Conversion is lossless for well-formed text and fails on unpaired
//! surrogates instead of substituting replacement characters.

use std::fmt;

use crate::error::MarshalError;

/// A string as the host runtime stores it: a sequence of UTF-16 code units.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct HostString {
    units: Vec<u16>,
}

impl HostString {
    /// Wrap raw code units. The units are not validated until decoded.
    pub fn from_units(units: Vec<u16>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Decode into a native UTF-8 string.
    pub fn decode(&self) -> Result<String, MarshalError> {
        let mut out = String::with_capacity(self.units.len());
        let mut index = 0usize;
        for decoded in char::decode_utf16(self.units.iter().copied()) {
            match decoded {
                Ok(c) => {
                    index += c.len_utf16();
                    out.push(c);
                }
                Err(e) => {
                    return Err(MarshalError::Encoding {
                        reason: format!(
                            "unpaired surrogate 0x{:04X} at code unit {}",
                            e.unpaired_surrogate(),
                            index
                        ),
                    });
                }
            }
        }
        Ok(out)
    }
}

impl From<&str> for HostString {
    fn from(s: &str) -> Self {
        Self {
            units: s.encode_utf16().collect(),
        }
    }
}

impl From<String> for HostString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.units))
    }
}

impl fmt::Debug for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostString({:?})", String::from_utf16_lossy(&self.units))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_non_ascii() {
        let s = "héllo wörld 🎉";
        let host = HostString::from(s);
        // the emoji is a surrogate pair
        assert_eq!(host.len(), s.chars().count() + 1);
        assert_eq!(host.decode().ok().as_deref(), Some(s));
    }

    #[test]
    fn test_unpaired_surrogate_is_an_error() {
        let host = HostString::from_units(vec![0x0061, 0xD800, 0x0062]);
        match host.decode() {
            Err(MarshalError::Encoding { reason }) => {
                assert!(reason.contains("0xD800"), "{reason}");
                assert!(reason.contains("code unit 1"), "{reason}");
            }
            other => panic!("expected encoding error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty() {
        let host = HostString::default();
        assert!(host.is_empty());
        assert_eq!(host.decode().ok().as_deref(), Some(""));
    }
}

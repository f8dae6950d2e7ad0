//! SNMP protocol version.

/// Version number carried in the first field of every message.
///
/// The gateway speaks v2c; v1 is kept because some deployments still tag
/// their messages with 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// SNMPv1 (wire value 0)
    V1,
    /// SNMPv2c (wire value 1)
    #[default]
    V2c,
}

impl Version {
    /// Wire value.
    pub fn as_i32(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
        }
    }

    /// Parse the wire value.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            _ => None,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "v1"),
            Version::V2c => write!(f, "v2c"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(Version::default(), Version::V2c);
        assert_eq!(Version::V2c.as_i32(), 1);
        assert_eq!(Version::from_i32(0), Some(Version::V1));
        assert_eq!(Version::from_i32(3), None);
    }
}

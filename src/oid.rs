//! Object Identifier (OID) type.
//!
//! Callers hand the client OIDs as numeric arc arrays; parsing dotted
//! strings is offered for convenience but the wire only ever sees arcs.
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for the
//! common short case.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// RFC 2578 Section 3.5 caps an OID at 128 sub-identifiers. Enforced by
/// [`Oid::from_ber()`] and checkable with [`Oid::validate_length()`].
pub const MAX_OID_LEN: usize = 128;

/// Fewest arcs an OID may have on the wire.
///
/// The first two arcs share one subidentifier, so a lone arc has no encoding
/// of its own: `1` would go out as `1.0`.
pub const MIN_OID_LEN: usize = 2;

/// Object Identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// ```
    /// use snmp_stream::oid::Oid;
    ///
    /// let oid = Oid::new(vec![1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1]);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted decimal (e.g. `"1.3.6.1.2.1.1.3.0"`).
    ///
    /// A leading dot is tolerated. Arc constraints are not checked here; call
    /// [`validate()`](Self::validate) for that.
    ///
    /// ```
    /// use snmp_stream::oid::Oid;
    ///
    /// let uptime = Oid::parse(".1.3.6.1.2.1.1.3.0").unwrap();
    /// assert_eq!(uptime.to_string(), "1.3.6.1.2.1.1.3.0");
    /// assert!(Oid::parse("1.3.x").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut arcs = SmallVec::new();

        for part in s.split('.').filter(|p| !p.is_empty()) {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether `self` lies in the subtree rooted at `other`.
    ///
    /// Every OID starts with itself and with the empty OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// Create a child OID by appending an arc.
    ///
    /// ```
    /// use snmp_stream::oid;
    ///
    /// let system = oid!(1, 3, 6, 1, 2, 1, 1);
    /// assert_eq!(system.child(3).child(0), oid!(1, 3, 6, 1, 2, 1, 1, 3, 0));
    /// ```
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Validate arcs per X.690 Section 8.19.4.
    ///
    /// arc1 must be 0, 1, or 2, and arc2 must be at most 39 unless arc1 is 2.
    pub fn validate(&self) -> Result<()> {
        let Some(&arc1) = self.arcs.first() else {
            return Ok(());
        };

        if arc1 > 2 {
            return Err(Error::invalid_oid(OidErrorKind::InvalidFirstArc(arc1)));
        }

        if let Some(&arc2) = self.arcs.get(1) {
            if arc1 < 2 && arc2 >= 40 {
                return Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                    first: arc1,
                    second: arc2,
                }));
            }
            // 2.x folds into one subidentifier; it must still fit in u32.
            if arc1 == 2 && arc2 > u32::MAX - 80 {
                return Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                    first: arc1,
                    second: arc2,
                }));
            }
        }

        Ok(())
    }

    /// Validate that the OID doesn't exceed [`MAX_OID_LEN`].
    pub fn validate_length(&self) -> Result<()> {
        if self.arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                count: self.arcs.len(),
                max: MAX_OID_LEN,
            }));
        }
        Ok(())
    }

    /// Everything an OID must satisfy before it is sent: arc constraints,
    /// at most [`MAX_OID_LEN`] arcs and at least [`MIN_OID_LEN`].
    pub fn validate_all(&self) -> Result<()> {
        if self.arcs.len() < MIN_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooFewArcs {
                count: self.arcs.len(),
                min: MIN_OID_LEN,
            }));
        }
        self.validate()?;
        self.validate_length()
    }

    /// Encode the OID content octets (no tag or length).
    ///
    /// The first subidentifier is `arc1 * 40 + arc2`; every subidentifier is
    /// base-128 with the continuation bit set on all but its last octet.
    /// An empty OID has empty content.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        match self.arcs.as_slice() {
            [] => {}
            [arc1] => encode_subidentifier(&mut bytes, arc1.saturating_mul(40)),
            [arc1, arc2, rest @ ..] => {
                encode_subidentifier(&mut bytes, arc1.saturating_mul(40).saturating_add(*arc2));
                for &arc in rest {
                    encode_subidentifier(&mut bytes, arc);
                }
            }
        }

        bytes
    }

    /// Encode the OID content octets into a `Vec`.
    pub fn to_ber(&self) -> Vec<u8> {
        self.to_ber_smallvec().to_vec()
    }

    /// Decode OID content octets.
    ///
    /// Error offsets are relative to `data`. Enforces [`MAX_OID_LEN`].
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        // The first subidentifier may be multi-byte when arc1 is 2.
        let (first_subid, consumed) = decode_subidentifier(data, 0)?;
        let arc1 = (first_subid / 40).min(2);
        arcs.push(arc1);
        arcs.push(first_subid - arc1 * 40);

        let mut i = consumed;
        while i < data.len() {
            let (arc, n) = decode_subidentifier(&data[i..], i)?;
            arcs.push(arc);
            i += n;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(
                    i,
                    DecodeErrorKind::OidTooLong {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                ));
            }
        }

        Ok(Self { arcs })
    }
}

fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    // Number of 7-bit groups, at least one so zero encodes as 0x00.
    let groups = ((32 - value.leading_zeros()).max(1)).div_ceil(7);

    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode one subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8], base: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(Error::decode(base + i, DecodeErrorKind::IntegerOverflow));
        }

        value = (value << 7) | (byte & 0x7F) as u32;

        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    // Continuation bit set on the final content octet.
    Err(Error::decode(base + data.len(), DecodeErrorKind::TruncatedData))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.arcs.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{}", first)?;
            for arc in arcs {
                write!(f, ".{}", arc)?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_stream::oid;
///
/// let uptime = oid!(1, 3, 6, 1, 2, 1, 1, 3, 0);
/// assert_eq!(uptime.to_string(), "1.3.6.1.2.1.1.3.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

//! Community-based SNMP message format.
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::version::Version;
use bytes::Bytes;

/// Community-based SNMP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityMessage {
    /// SNMP version
    pub version: Version,
    /// Community string, sent in the clear
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl CommunityMessage {
    /// Create a new community message.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Create a V2c message (convenience constructor).
    pub fn v2c(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self::new(Version::V2c, community, pdu)
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();

        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });

        buf.finish()
    }

    /// Decode a complete message from BER.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        let mut seq = decoder.read_sequence()?;
        let (version, community) = read_header(&mut seq)?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(CommunityMessage {
            version,
            community,
            pdu,
        })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}

/// Read the version and community that precede every PDU.
pub(crate) fn read_header(seq: &mut Decoder) -> Result<(Version, Bytes)> {
    let version_offset = seq.offset();
    let version_num = seq.read_integer()?;
    let version = Version::from_i32(version_num).ok_or_else(|| {
        let kind = DecodeErrorKind::UnknownVersion(version_num);
        tracing::debug!(target: "snmp_stream::ber", { snmp.offset = %version_offset, kind = %kind }, "decode error");
        Error::decode(version_offset, kind)
    })?;
    let community = seq.read_octet_string()?;
    Ok((version, community))
}

//! BER tag definitions.
//!
//! Tag encoding follows X.690 Section 8.1.2:
//! - Bits 7-6: Class (00=Universal, 01=Application, 10=Context-specific, 11=Private)
//! - Bit 5: Primitive (0) or Constructed (1)
//! - Bits 4-0: Tag number (0-30, or 31 for long form)
//!
//! Only the tags this client exchanges with the gateway are listed.

/// Tag class bits (bits 7-6)
pub mod class {
    pub const UNIVERSAL: u8 = 0x00;
    pub const APPLICATION: u8 = 0x40;
    pub const CONTEXT_SPECIFIC: u8 = 0x80;
}

/// Constructed bit (bit 5)
pub const CONSTRUCTED: u8 = 0x20;

/// Universal tags (class bits 00)
pub mod universal {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    /// Constructed OCTET STRING (0x24) - not supported, rejected on decode
    pub const OCTET_STRING_CONSTRUCTED: u8 = 0x24;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30; // Constructed
}

/// Application tags (class bits 01)
pub mod application {
    pub const TIMETICKS: u8 = 0x43;
    pub const COUNTER64: u8 = 0x46;
}

/// Context-specific tags (class bits 10) - Exception values
pub mod context {
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;
}

/// PDU tags (context-specific, constructed)
///
/// `SUBSCRIBE` and `GET_SUBTREE` are gateway extensions outside the RFC 3416
/// tag set.
pub mod pdu {
    use super::CONSTRUCTED;
    use super::class::CONTEXT_SPECIFIC;

    pub const GET_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED; // 0xA0
    pub const RESPONSE: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x02; // 0xA2
    pub const SET_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x03; // 0xA3
    pub const GET_BULK_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x05; // 0xA5
    pub const INFORM_REQUEST: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x06; // 0xA6
    pub const TRAP_V2: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x07; // 0xA7
    pub const SUBSCRIBE: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x0A; // 0xAA
    pub const GET_SUBTREE: u8 = CONTEXT_SPECIFIC | CONSTRUCTED | 0x0B; // 0xAB
}

/// Check if a tag indicates a constructed type
#[inline]
pub const fn is_constructed(tag: u8) -> bool {
    tag & CONSTRUCTED != 0
}

/// Get the class of a tag
#[inline]
pub const fn tag_class(tag: u8) -> u8 {
    tag & 0xC0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdu_tag_values() {
        assert_eq!(pdu::GET_REQUEST, 0xA0);
        assert_eq!(pdu::RESPONSE, 0xA2);
        assert_eq!(pdu::SET_REQUEST, 0xA3);
        assert_eq!(pdu::GET_BULK_REQUEST, 0xA5);
        assert_eq!(pdu::INFORM_REQUEST, 0xA6);
        assert_eq!(pdu::TRAP_V2, 0xA7);
        assert_eq!(pdu::SUBSCRIBE, 0xAA);
        assert_eq!(pdu::GET_SUBTREE, 0xAB);
    }

    #[test]
    fn test_classification() {
        assert!(is_constructed(universal::SEQUENCE));
        assert!(is_constructed(pdu::GET_SUBTREE));
        assert!(!is_constructed(universal::INTEGER));
        assert_eq!(tag_class(application::TIMETICKS), class::APPLICATION);
        assert_eq!(tag_class(context::END_OF_MIB_VIEW), class::CONTEXT_SPECIFIC);
        assert_eq!(tag_class(universal::OBJECT_IDENTIFIER), class::UNIVERSAL);
    }
}

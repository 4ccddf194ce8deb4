//! OBD-II Protocol Definitions

use serde::{Deserialize, Serialize};

/// Bus protocols an ELM327 adapter can negotiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ObdProtocol {
    /// Automatic protocol detection
    #[default]
    Auto,
    /// SAE J1850 PWM (41.6 kbaud)
    J1850Pwm,
    /// SAE J1850 VPW (10.4 kbaud)
    J1850Vpw,
    /// ISO 9141-2 (10.4 kbaud, 5 baud init)
    Iso9141_2,
    /// ISO 14230-4 KWP (slow init, 10.4 kbaud)
    Iso14230_4Kwp,
    /// ISO 14230-4 KWP (fast init, 10.4 kbaud)
    Iso14230_4KwpFast,
    /// ISO 15765-4 CAN (11 bit ID, 500 kbaud)
    Iso15765_4Can11bit500,
    /// ISO 15765-4 CAN (29 bit ID, 500 kbaud)
    Iso15765_4Can29bit500,
    /// ISO 15765-4 CAN (11 bit ID, 250 kbaud)
    Iso15765_4Can11bit250,
    /// ISO 15765-4 CAN (29 bit ID, 250 kbaud)
    Iso15765_4Can29bit250,
}

impl ObdProtocol {
    /// Get the ELM327 AT command for this protocol
    pub fn to_elm_command(&self) -> &'static str {
        match self {
            ObdProtocol::Auto => "ATSP0",
            ObdProtocol::J1850Pwm => "ATSP1",
            ObdProtocol::J1850Vpw => "ATSP2",
            ObdProtocol::Iso9141_2 => "ATSP3",
            ObdProtocol::Iso14230_4Kwp => "ATSP4",
            ObdProtocol::Iso14230_4KwpFast => "ATSP5",
            ObdProtocol::Iso15765_4Can11bit500 => "ATSP6",
            ObdProtocol::Iso15765_4Can29bit500 => "ATSP7",
            ObdProtocol::Iso15765_4Can11bit250 => "ATSP8",
            ObdProtocol::Iso15765_4Can29bit250 => "ATSP9",
        }
    }

    /// Parse the reply to `ATDPN` (e.g. `"A6"` or `"6"`)
    pub fn from_elm_number(reply: &str) -> Option<Self> {
        let digit = reply.trim().trim_start_matches('A').chars().next()?;
        match digit {
            '0' => Some(ObdProtocol::Auto),
            '1' => Some(ObdProtocol::J1850Pwm),
            '2' => Some(ObdProtocol::J1850Vpw),
            '3' => Some(ObdProtocol::Iso9141_2),
            '4' => Some(ObdProtocol::Iso14230_4Kwp),
            '5' => Some(ObdProtocol::Iso14230_4KwpFast),
            '6' => Some(ObdProtocol::Iso15765_4Can11bit500),
            '7' => Some(ObdProtocol::Iso15765_4Can29bit500),
            '8' => Some(ObdProtocol::Iso15765_4Can11bit250),
            '9' => Some(ObdProtocol::Iso15765_4Can29bit250),
            _ => None,
        }
    }

    /// Check if this is a CAN protocol
    pub fn is_can(&self) -> bool {
        matches!(
            self,
            ObdProtocol::Iso15765_4Can11bit500
                | ObdProtocol::Iso15765_4Can29bit500
                | ObdProtocol::Iso15765_4Can11bit250
                | ObdProtocol::Iso15765_4Can29bit250
        )
    }

    /// Check if this is a 29 bit CAN protocol
    pub fn is_can_29bit(&self) -> bool {
        matches!(
            self,
            ObdProtocol::Iso15765_4Can29bit500 | ObdProtocol::Iso15765_4Can29bit250
        )
    }

    /// Number of header bytes printed per frame when headers are on.
    ///
    /// 11 bit CAN headers are printed as a single three digit token and
    /// are handled by the frame parser directly.
    pub fn header_bytes(&self) -> usize {
        match self {
            ObdProtocol::Iso15765_4Can29bit500 | ObdProtocol::Iso15765_4Can29bit250 => 4,
            ObdProtocol::Iso15765_4Can11bit500 | ObdProtocol::Iso15765_4Can11bit250 => 0,
            ObdProtocol::Auto => 0,
            _ => 3,
        }
    }

    /// Legacy protocols append a checksum byte to every frame
    pub fn has_checksum(&self) -> bool {
        !self.is_can() && *self != ObdProtocol::Auto
    }
}

/// Baud rates tried, in order, when none is configured
pub const BAUD_RATE_CANDIDATES: [u32; 6] = [38400, 9600, 230400, 115200, 57600, 19200];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_elm_number() {
        assert_eq!(
            ObdProtocol::from_elm_number("A6"),
            Some(ObdProtocol::Iso15765_4Can11bit500)
        );
        assert_eq!(
            ObdProtocol::from_elm_number("3"),
            Some(ObdProtocol::Iso9141_2)
        );
        assert_eq!(ObdProtocol::from_elm_number("?"), None);
    }

    #[test]
    fn test_header_layout() {
        assert!(ObdProtocol::Iso15765_4Can29bit500.is_can_29bit());
        assert_eq!(ObdProtocol::Iso15765_4Can29bit500.header_bytes(), 4);
        assert_eq!(ObdProtocol::J1850Vpw.header_bytes(), 3);
        assert!(ObdProtocol::J1850Vpw.has_checksum());
        assert!(!ObdProtocol::Iso15765_4Can11bit500.has_checksum());
    }
}

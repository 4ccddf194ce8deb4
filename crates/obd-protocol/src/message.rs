//! Raw ECU Messages
//!
//! Turns the text lines an ELM327 prints for one request into one
//! [`RawMessage`] per responding ECU. Multi-frame ISO-TP replies are
//! reassembled here so decoders only ever see contiguous payloads.

use crate::catalog::Ecu;
use crate::protocol::ObdProtocol;
use serde::Serialize;
use tracing::debug;

/// Text an ELM327 prints in place of data when something went wrong
pub const ERROR_MARKERS: [&str; 12] = [
    "NO DATA",
    "BUS ERROR",
    "CAN ERROR",
    "BUS BUSY",
    "DATA ERROR",
    "FB ERROR",
    "RX ERROR",
    "BUFFER FULL",
    "STOPPED",
    "UNABLE TO CONNECT",
    "LV RESET",
    "ACT ALERT",
];

/// Status lines that carry no information about the request
const INFORMATIONAL: [&str; 2] = ["SEARCHING", "BUS INIT"];

/// One line of adapter output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Text exactly as received (without the line terminator)
    pub raw: String,
    /// Transmitter address when headers are enabled
    pub tx_id: Option<u32>,
    /// Bytes following the header
    pub data: Vec<u8>,
}

impl Frame {
    /// Frame that carries only text
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            tx_id: None,
            data: Vec::new(),
        }
    }

    /// Whether the raw text is an adapter-level error
    pub fn is_error(&self) -> bool {
        let text = self.raw.trim().to_ascii_uppercase();
        if text == "?" || is_err_code(&text) {
            return true;
        }
        ERROR_MARKERS.iter().any(|marker| text.contains(marker))
    }
}

/// `ERR94`, `ERR71`, … but not arbitrary words that start with ERR
fn is_err_code(text: &str) -> bool {
    text.strip_prefix("ERR")
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// One ECU's reply to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawMessage {
    /// ECU the reply came from
    pub ecu: Ecu,
    /// Frames that made up the reply, in arrival order
    pub frames: Vec<Frame>,
    /// Reassembled payload, including the mode + PID echo for OBD requests
    pub data: Vec<u8>,
}

impl RawMessage {
    /// Create a message from its parts
    pub fn new(ecu: Ecu, frames: Vec<Frame>, data: Vec<u8>) -> Self {
        Self { ecu, frames, data }
    }

    /// Single-frame message from raw bytes
    pub fn from_bytes(ecu: Ecu, data: Vec<u8>) -> Self {
        let raw = hex_text(&data);
        Self {
            ecu,
            frames: vec![Frame {
                raw,
                tx_id: None,
                data: data.clone(),
            }],
            data,
        }
    }

    /// Message made of a single text line (adapter replies, error strings)
    pub fn from_text(ecu: Ecu, raw: &str) -> Self {
        Self {
            ecu,
            frames: vec![Frame::text(raw)],
            data: Vec::new(),
        }
    }

    /// Whether any frame carries an adapter error string
    pub fn has_error(&self) -> bool {
        self.frames.iter().any(Frame::is_error)
    }
}

/// Render bytes as space separated upper-case hex
pub fn hex_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse every line of one adapter reply into per-ECU messages
pub fn parse_response(lines: &[String], protocol: ObdProtocol, headers: bool) -> Vec<RawMessage> {
    let mut groups: Vec<(Option<u32>, Vec<Frame>)> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() || INFORMATIONAL.iter().any(|s| trimmed.starts_with(s)) {
            continue;
        }

        let frame = parse_frame(trimmed, protocol, headers);
        match groups.iter_mut().find(|(tx, _)| *tx == frame.tx_id) {
            Some((_, frames)) => frames.push(frame),
            None => groups.push((frame.tx_id, vec![frame])),
        }
    }

    groups
        .into_iter()
        .map(|(tx_id, frames)| {
            let can = protocol.is_can() || protocol == ObdProtocol::Auto;
            let data = if can && tx_id.is_some() {
                reassemble_can(&frames)
            } else {
                reassemble_legacy(&frames)
            };
            RawMessage::new(ecu_for(tx_id, protocol), frames, data)
        })
        .collect()
}

fn parse_frame(line: &str, protocol: ObdProtocol, headers: bool) -> Frame {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let header_token = tokens.first().map(|t| t.len() == 3).unwrap_or(false);

    let well_formed = tokens.iter().enumerate().all(|(i, t)| {
        let width_ok = t.len() == 2 || (i == 0 && header_token);
        width_ok && t.chars().all(|c| c.is_ascii_hexdigit())
    });
    if !well_formed {
        return Frame::text(line);
    }

    // 11 bit CAN header, e.g. "7E8 06 41 0C 1A F8"
    if header_token {
        let tx_id = u32::from_str_radix(tokens[0], 16).ok();
        let data = tokens[1..]
            .iter()
            .filter_map(|t| u8::from_str_radix(t, 16).ok())
            .collect();
        return Frame {
            raw: line.to_string(),
            tx_id,
            data,
        };
    }

    let bytes: Vec<u8> = tokens
        .iter()
        .filter_map(|t| u8::from_str_radix(t, 16).ok())
        .collect();

    let header_len = protocol.header_bytes();
    if headers && header_len > 0 && bytes.len() > header_len {
        let tx_id = if protocol.is_can_29bit() {
            bytes[..4]
                .iter()
                .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
        } else {
            u32::from(bytes[2])
        };
        let end = if protocol.has_checksum() {
            bytes.len() - 1
        } else {
            bytes.len()
        };
        return Frame {
            raw: line.to_string(),
            tx_id: Some(tx_id),
            data: bytes[header_len..end].to_vec(),
        };
    }

    Frame {
        raw: line.to_string(),
        tx_id: None,
        data: bytes,
    }
}

/// Strip ISO-TP PCI bytes and join first + consecutive frames
fn reassemble_can(frames: &[Frame]) -> Vec<u8> {
    let mut payload = Vec::new();
    let mut total_len: Option<usize> = None;

    for frame in frames.iter().filter(|f| !f.data.is_empty()) {
        let pci = frame.data[0];
        match pci >> 4 {
            // Single frame
            0x0 => {
                let len = usize::from(pci & 0x0F);
                let end = (1 + len).min(frame.data.len());
                return frame.data[1..end].to_vec();
            }
            // First frame
            0x1 => {
                if frame.data.len() < 2 {
                    continue;
                }
                total_len = Some((usize::from(pci & 0x0F) << 8) | usize::from(frame.data[1]));
                payload.clear();
                payload.extend_from_slice(&frame.data[2..]);
            }
            // Consecutive frame
            0x2 => payload.extend_from_slice(&frame.data[1..]),
            _ => {}
        }
    }

    if let Some(len) = total_len {
        if payload.len() < len {
            debug!(
                "Incomplete multi-frame reply: {} of {} bytes",
                payload.len(),
                len
            );
            return Vec::new();
        }
        payload.truncate(len);
    }
    payload
}

/// Legacy protocols repeat the mode/PID echo and a sequence byte per frame
fn reassemble_legacy(frames: &[Frame]) -> Vec<u8> {
    let data_frames: Vec<&Frame> = frames.iter().filter(|f| !f.data.is_empty()).collect();
    match data_frames.as_slice() {
        [] => Vec::new(),
        [single] => single.data.clone(),
        [first, ..] if first.data.len() >= 3 => {
            let mut ordered = data_frames.clone();
            ordered.sort_by_key(|f| f.data.get(2).copied().unwrap_or(0));

            let mut payload = first.data[..2].to_vec();
            for frame in ordered {
                if frame.data.len() > 3 {
                    payload.extend_from_slice(&frame.data[3..]);
                }
            }
            payload
        }
        [first, ..] => first.data.clone(),
    }
}

fn ecu_for(tx_id: Option<u32>, protocol: ObdProtocol) -> Ecu {
    let Some(id) = tx_id else {
        return Ecu::Unknown;
    };

    if protocol.header_bytes() == 0 {
        return match id {
            0x7E8 => Ecu::Engine,
            0x7E9 => Ecu::Transmission,
            other => Ecu::Other(other),
        };
    }

    match id & 0xFF {
        0x10 => Ecu::Engine,
        0x18 => Ecu::Transmission,
        _ => Ecu::Other(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_frame_can() {
        let messages = parse_response(
            &lines(&["7E8 04 41 0C 1A F8"]),
            ObdProtocol::Iso15765_4Can11bit500,
            true,
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].ecu, Ecu::Engine);
        assert_eq!(messages[0].data, vec![0x41, 0x0C, 0x1A, 0xF8]);
    }

    #[test]
    fn test_multi_frame_can() {
        let messages = parse_response(
            &lines(&[
                "7E8 10 14 49 02 01 31 47 31",
                "7E8 21 4A 43 35 34 34 34 52",
                "7E8 22 37 32 35 32 33 36 37",
            ]),
            ObdProtocol::Iso15765_4Can11bit500,
            true,
        );
        assert_eq!(messages.len(), 1);
        let data = &messages[0].data;
        assert_eq!(data.len(), 0x14);
        assert_eq!(&data[..3], &[0x49, 0x02, 0x01]);
        assert_eq!(&data[3..], b"1G1JC5444R7252367");
    }

    #[test]
    fn test_multi_frame_cut_short_has_no_data() {
        let messages = parse_response(
            &lines(&["7E8 10 14 49 02 01 31 47 31", "7E8 21 4A 43 35 34 34 34 52"]),
            ObdProtocol::Iso15765_4Can11bit500,
            true,
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].ecu, Ecu::Engine);
        assert!(messages[0].data.is_empty());
    }

    #[test]
    fn test_two_ecus() {
        let messages = parse_response(
            &lines(&["7E8 06 41 00 BE 3E B8 11", "7E9 06 41 00 80 10 00 00"]),
            ObdProtocol::Iso15765_4Can11bit500,
            true,
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].ecu, Ecu::Transmission);
    }

    #[test]
    fn test_legacy_header_and_checksum() {
        let messages = parse_response(
            &lines(&["48 6B 10 41 0C 1A F8 C4"]),
            ObdProtocol::J1850Vpw,
            true,
        );
        assert_eq!(messages[0].ecu, Ecu::Engine);
        assert_eq!(messages[0].data, vec![0x41, 0x0C, 0x1A, 0xF8]);
    }

    #[test]
    fn test_error_text() {
        let messages = parse_response(
            &lines(&["SEARCHING...", "NO DATA"]),
            ObdProtocol::Iso15765_4Can11bit500,
            true,
        );
        assert_eq!(messages.len(), 1);
        assert!(messages[0].has_error());
        assert!(messages[0].data.is_empty());
    }

    #[test]
    fn test_error_markers() {
        assert!(Frame::text("CAN ERROR").is_error());
        assert!(Frame::text("<DATA ERROR").is_error());
        assert!(Frame::text("ERR94").is_error());
        assert!(Frame::text("?").is_error());
        assert!(!Frame::text("ELM327 v1.5").is_error());
    }
}

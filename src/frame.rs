//! Request frame construction and response frame validation.
//!
//! Frame format:
//! - START (1 byte): `0x02`
//! - ADDRESS (1 byte): `0x03`, the bill validator peripheral
//! - LENGTH (1 byte): total frame length, or `0` if unconstrained
//! - COMMAND (1 byte): command code, echoed back in substantive responses
//! - PAYLOAD (0..=249 bytes): command-specific data
//! - CRC (2 bytes): little-endian [crc16](crate::crc::crc16) of every preceding byte

use crate::crc;
use crate::{Error, Result};

/// Frame synchronization byte.
pub const START_CODE: u8 = 0x02;
/// Peripheral address of the bill validator.
pub const PERIPHERAL_ADDRESS: u8 = 0x03;
/// Header length: start, address and length bytes.
pub const HEADER_LEN: usize = 3;
/// Checksum length.
pub const CRC_LEN: usize = 2;
/// Smallest valid frame: header, one command byte and the checksum.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1 + CRC_LEN;
/// Largest frame expressible by the one-byte length field.
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;

/// Control replies, carried in a frame with a single byte between header and checksum.
pub mod control {
    /// Positive acknowledgement.
    pub const ACK: u8 = 0x00;
    /// Negative acknowledgement.
    pub const NACK: u8 = 0xff;
    /// The device does not support the requested command.
    pub const ILLEGAL_COMMAND: u8 = 0x30;
}

/// Index of the length byte.
pub const LEN_INDEX: usize = 2;
/// Index of the command byte.
pub const COMMAND_INDEX: usize = 3;

/// A validated response frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Bare ACK, no payload.
    Ack,
    /// Substantive response.
    Data {
        /// Echoed command byte.
        command: u8,
        /// Bytes following the echoed command.
        payload: Vec<u8>,
    },
}

impl Reply {
    /// Whether the reply carries data, and must therefore be acknowledged.
    pub fn is_substantive(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Consumes the reply, returning its payload (empty for a bare ACK).
    pub fn into_payload(self) -> Vec<u8> {
        match self {
            Self::Ack => Vec::new(),
            Self::Data { payload, .. } => payload,
        }
    }
}

/// Builds a request frame for `command` carrying `payload`.
///
/// Fails with [Error::FrameFormat] if the frame would not fit the length byte.
pub fn build_request(command: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let len = MIN_FRAME_LEN + payload.len();
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameFormat(format!(
            "request too long: {len} bytes, max {MAX_FRAME_LEN}"
        )));
    }

    let mut frame = Vec::with_capacity(len);
    frame.extend_from_slice(&[START_CODE, PERIPHERAL_ADDRESS, len as u8, command]);
    frame.extend_from_slice(payload);

    let crc = crc::crc16(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());

    Ok(frame)
}

/// Validates a complete response frame and extracts its content.
pub fn parse_response(raw: &[u8]) -> Result<Reply> {
    if raw.len() < MIN_FRAME_LEN {
        return Err(Error::FrameFormat(format!(
            "frame too short: {} bytes, min {MIN_FRAME_LEN}",
            raw.len()
        )));
    }

    if raw[0] != START_CODE || raw[1] != PERIPHERAL_ADDRESS {
        return Err(Error::FrameFormat(format!(
            "unexpected start {:#04x} / address {:#04x}",
            raw[0], raw[1]
        )));
    }

    crc::verify(raw)
        .map_err(|(expected, received)| Error::ChecksumMismatch { expected, received })?;

    let body = &raw[HEADER_LEN..raw.len() - CRC_LEN];
    let command = body[0];

    if body.len() == 1 {
        match command {
            control::ACK => return Ok(Reply::Ack),
            control::NACK => return Err(Error::DeviceNack),
            control::ILLEGAL_COMMAND => return Err(Error::IllegalCommand),
            _ => (),
        }
    }

    Ok(Reply::Data {
        command,
        payload: body[1..].to_vec(),
    })
}

/// Whether the accumulated `buf` holds a complete frame.
///
/// A zero length byte leaves the frame length unconstrained, so any buffer of
/// at least [MIN_FRAME_LEN] bytes is complete.
pub fn is_complete(buf: &[u8]) -> bool {
    if buf.len() < MIN_FRAME_LEN {
        return false;
    }

    let len = buf[LEN_INDEX] as usize;
    len == 0 || len == buf.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &[u8]) -> Vec<u8> {
        let mut frame = vec![START_CODE, PERIPHERAL_ADDRESS, (body.len() + 5) as u8];
        frame.extend_from_slice(body);
        let crc = crc::crc16(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame
    }

    #[test]
    fn test_build_request_empty() -> Result<()> {
        assert_eq!(
            build_request(0x33, &[])?,
            [0x02, 0x03, 0x06, 0x33, 0xda, 0x81]
        );

        Ok(())
    }

    #[test]
    fn test_build_request_payload() -> Result<()> {
        let frame = build_request(0x34, &[0x00, 0x00, 0x07, 0x00, 0x00, 0x00])?;

        assert_eq!(frame.len(), 12);
        assert_eq!(frame[LEN_INDEX], 12);
        assert_eq!(frame[COMMAND_INDEX], 0x34);
        assert_eq!(&frame[4..10], &[0x00, 0x00, 0x07, 0x00, 0x00, 0x00]);
        assert!(crc::verify(&frame).is_ok());

        Ok(())
    }

    #[test]
    fn test_build_request_too_long() {
        assert!(matches!(
            build_request(0x3a, &[0u8; 250]),
            Err(Error::FrameFormat(_))
        ));
        assert!(build_request(0x3a, &[0u8; 249]).is_ok());
    }

    #[test]
    fn test_parse_bad_start() {
        let mut frame = response(&[0x33, 0x14]);
        frame[0] = 0x01;
        assert!(matches!(parse_response(&frame), Err(Error::FrameFormat(_))));

        let mut frame = response(&[0x33, 0x14]);
        frame[1] = 0x04;
        assert!(matches!(parse_response(&frame), Err(Error::FrameFormat(_))));
    }

    #[test]
    fn test_parse_short_frame() {
        assert!(matches!(
            parse_response(&[0x02, 0x03, 0x05]),
            Err(Error::FrameFormat(_))
        ));
    }

    #[test]
    fn test_parse_checksum_mismatch() {
        let mut frame = response(&[0x33, 0x14]);
        let last = frame.len() - 1;
        frame[last] ^= 0xff;

        assert!(matches!(
            parse_response(&frame),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_control_replies() -> Result<()> {
        assert_eq!(parse_response(&response(&[0x00]))?, Reply::Ack);
        assert!(matches!(
            parse_response(&response(&[0xff])),
            Err(Error::DeviceNack)
        ));
        assert!(matches!(
            parse_response(&response(&[0x30])),
            Err(Error::IllegalCommand)
        ));

        Ok(())
    }

    #[test]
    fn test_parse_data() -> Result<()> {
        let reply = parse_response(&response(&[0x33, 0x1c, 0x68]))?;

        assert!(reply.is_substantive());
        assert_eq!(
            reply,
            Reply::Data {
                command: 0x33,
                payload: vec![0x1c, 0x68],
            }
        );

        // single non-control byte is a substantive reply with no payload
        let reply = parse_response(&response(&[0x33]))?;
        assert_eq!(reply.into_payload(), Vec::<u8>::new());

        Ok(())
    }

    #[test]
    fn test_is_complete() {
        assert!(!is_complete(&[0x02, 0x03, 0x06, 0x00, 0xc2]));
        assert!(is_complete(&[0x02, 0x03, 0x06, 0x00, 0xc2, 0x82]));
        assert!(!is_complete(&[0x02, 0x03, 0x08, 0x33, 0x14, 0x00]));
        assert!(is_complete(&[0x02, 0x03, 0x00, 0x33, 0x14, 0x00]));
    }
}

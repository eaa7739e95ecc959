//! CRC-16 frame checksum.
//!
//! The validator uses the bit-reversed CCITT polynomial (`0x8408`) with a zero
//! initial value, processed LSB-first. This is the same algorithm known as
//! CRC-16/KERMIT.

/// Bit-reversed CRC-16 polynomial.
pub const POLYNOMIAL: u16 = 0x8408;

const KERMIT: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_KERMIT);

/// Computes the 16-bit checksum over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    KERMIT.checksum(data)
}

/// Checks that the trailing two bytes of `frame` are the little-endian checksum of the rest.
///
/// Returns the `(expected, received)` pair on mismatch.
pub fn verify(frame: &[u8]) -> std::result::Result<(), (u16, u16)> {
    if frame.len() < 2 {
        return Err((crc16(&[]), 0));
    }

    let (body, tail) = frame.split_at(frame.len() - 2);
    let expected = crc16(body);
    let received = u16::from_le_bytes([tail[0], tail[1]]);

    if expected == received {
        Ok(())
    } else {
        Err((expected, received))
    }
}

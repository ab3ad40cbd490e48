use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Convert an epoch timestamp to a `DateTime`.
pub fn dt_from_timestamp(ts: u32) -> DateTime<Utc> {
    DateTime::<Utc>::from_utc(NaiveDateTime::from_timestamp(i64::from(ts), 0), Utc)
}

pub fn write_be_u16(buf: &mut Vec<u8>, val: u16) {
    let mut tmp = [0u8; 2];
    BigEndian::write_u16(&mut tmp, val);
    buf.extend_from_slice(&tmp);
}

pub fn write_be_u32(buf: &mut Vec<u8>, val: u32) {
    let mut tmp = [0u8; 4];
    BigEndian::write_u32(&mut tmp, val);
    buf.extend_from_slice(&tmp);
}

/// Write a new format packet length.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-4.2.2
pub fn write_packet_length(buf: &mut Vec<u8>, len: usize) {
    if len < 192 {
        buf.push(len as u8);
    } else if len < 8384 {
        let val = len - 192;
        buf.push(((val >> 8) + 192) as u8);
        buf.push((val & 0xff) as u8);
    } else {
        buf.push(255);
        write_be_u32(buf, len as u32);
    }
}

/// Write a new format packet header for `tag`, followed by the body length.
pub fn write_packet_header(buf: &mut Vec<u8>, tag: u8, body_len: usize) {
    buf.push(0x80 | 0x40 | (tag & 0x3f));
    write_packet_length(buf, body_len);
}

/// Hex rendering for logs and debug output, truncated after `max` bytes so
/// arbitrarily large input never lands in a message verbatim.
pub fn hex_fragment(bytes: &[u8], max: usize) -> String {
    if bytes.len() <= max {
        hex::encode(bytes)
    } else {
        format!("{}..", hex::encode(&bytes[..max]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_packet_length() {
        let mut buf = Vec::new();
        write_packet_length(&mut buf, 0);
        assert_eq!(buf, vec![0x00]);

        let mut buf = Vec::new();
        write_packet_length(&mut buf, 191);
        assert_eq!(buf, vec![0xbf]);

        let mut buf = Vec::new();
        write_packet_length(&mut buf, 192);
        assert_eq!(buf, vec![0xc0, 0x00]);

        let mut buf = Vec::new();
        write_packet_length(&mut buf, 8383);
        assert_eq!(buf, vec![0xdf, 0xff]);

        let mut buf = Vec::new();
        write_packet_length(&mut buf, 8384);
        assert_eq!(buf, vec![0xff, 0x00, 0x00, 0x20, 0xc0]);
    }

    #[test]
    fn test_write_packet_header() {
        let mut buf = Vec::new();
        write_packet_header(&mut buf, 13, 9);
        assert_eq!(buf, vec![0xcd, 0x09]);
    }

    #[test]
    fn test_hex_fragment() {
        assert_eq!(hex_fragment(&[0xab, 0xcd], 4), "abcd");
        assert_eq!(hex_fragment(&[0xab, 0xcd], 2), "abcd");
        assert_eq!(hex_fragment(&[0xab, 0xcd, 0xef], 2), "abcd..");
    }

    #[test]
    fn test_dt_from_timestamp() {
        assert_eq!(
            dt_from_timestamp(0).to_rfc3339(),
            "1970-01-01T00:00:00+00:00"
        );
    }
}

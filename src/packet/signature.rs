use chrono::{DateTime, Utc};
use num_traits::FromPrimitive;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::packet::events::{Event, Sink};
use crate::packet::parse::Parser;
use crate::packet::reader::Source;
use crate::types::{Mpi, PublicKeyAlgorithm, SignatureType, SignatureVersion};
use crate::util::dt_from_timestamp;

/// A signature packet.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Signature {
    pub version: SignatureVersion,
    pub typ: SignatureType,
    /// For v4 signatures, filled from a parsed creation time subpacket.
    pub created_at: u32,
    /// For v4 signatures, filled from a parsed issuer subpacket.
    pub signer_key_id: [u8; 8],
    pub key_algorithm: PublicKeyAlgorithm,
    pub hash_algorithm: HashAlgorithm,
    /// Leftmost two bytes of the signed digest.
    pub hash2: [u8; 2],
    pub material: SignatureMaterial,
    /// Where the hashed area of a v4 signature sits in the raw packet.
    pub hashed_range: Option<HashedRange>,
}

/// Byte range of the v4 hashed area, as offsets into the accumulated raw
/// packet: version byte through the end of the hashed subpacket set. These
/// exact bytes, plus the trailer, are what the signature hash covers.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct HashedRange {
    pub start: usize,
    pub length: u32,
}

/// The algorithm-specific signature material.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SignatureMaterial {
    Rsa { sig: Mpi },
    Dsa { r: Mpi, s: Mpi },
}

impl Signature {
    pub fn created(&self) -> DateTime<Utc> {
        dt_from_timestamp(self.created_at)
    }
}

/// Signature fields that subpacket decoding feeds back into the packet.
#[derive(Debug, Default)]
pub(crate) struct SigScratch {
    pub signer_key_id: [u8; 8],
    pub created_at: u32,
}

impl<'a, R: Source, S: Sink> Parser<'a, R, S> {
    /// Parse a signature packet, v2/v3 or v4.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2
    pub(crate) fn parse_signature(&mut self) -> Result<()> {
        // the hashed area of a v4 signature starts at the version byte
        let hashed_start = self.acc.length();

        let version_byte = self.read_u8()?;
        match version_byte {
            // v2 signatures are structured exactly like v3 ones; keep the
            // version they claim rather than relabeling them
            2 => self.parse_v3_signature(SignatureVersion::V2),
            3 => self.parse_v3_signature(SignatureVersion::V3),
            4 => self.parse_v4_signature(hashed_start),
            v => bail!("bad signature version ({})", v),
        }
    }

    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.2
    fn parse_v3_signature(&mut self, version: SignatureVersion) -> Result<()> {
        let hash_len = self.read_u8()?;
        ensure!(hash_len == 5, "bad hash info length ({})", hash_len);

        let typ = self.read_signature_type()?;
        let created_at = self.read_time()?;

        let mut signer_key_id = [0u8; 8];
        self.limited_read(&mut signer_key_id)?;

        let key_algorithm = self.read_key_algorithm()?;
        let hash_algorithm = self.read_hash_algorithm()?;

        let mut hash2 = [0u8; 2];
        self.limited_read(&mut hash2)?;

        let material = self.read_signature_material(key_algorithm)?;
        self.check_consumed()?;

        self.emit(Event::Signature(Signature {
            version,
            typ,
            created_at,
            signer_key_id,
            key_algorithm,
            hash_algorithm,
            hash2,
            material,
            hashed_range: None,
        }));

        Ok(())
    }

    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3
    fn parse_v4_signature(&mut self, hashed_start: usize) -> Result<()> {
        let typ = self.read_signature_type()?;
        let key_algorithm = self.read_key_algorithm()?;
        let hash_algorithm = self.read_hash_algorithm()?;

        let mut scratch = SigScratch::default();

        self.parse_subpacket_set(&mut scratch)?;
        // the hashed area closes with the hashed subpacket set
        let hashed_length = (self.acc.length() - hashed_start) as u32;

        self.parse_subpacket_set(&mut scratch)?;

        let mut hash2 = [0u8; 2];
        self.limited_read(&mut hash2)?;

        let material = self.read_signature_material(key_algorithm)?;
        self.check_consumed()?;

        self.emit(Event::Signature(Signature {
            version: SignatureVersion::V4,
            typ,
            created_at: scratch.created_at,
            signer_key_id: scratch.signer_key_id,
            key_algorithm,
            hash_algorithm,
            hash2,
            material,
            hashed_range: Some(HashedRange {
                start: hashed_start,
                length: hashed_length,
            }),
        }));

        Ok(())
    }

    fn read_signature_type(&mut self) -> Result<SignatureType> {
        let byte = self.read_u8()?;
        SignatureType::from_u8(byte)
            .ok_or_else(|| format_err!("unknown signature type (0x{:02x})", byte))
    }

    fn read_key_algorithm(&mut self) -> Result<PublicKeyAlgorithm> {
        let byte = self.read_u8()?;
        PublicKeyAlgorithm::from_u8(byte)
            .ok_or_else(|| format_err!("unknown public key algorithm ({})", byte))
    }

    fn read_hash_algorithm(&mut self) -> Result<HashAlgorithm> {
        let byte = self.read_u8()?;
        HashAlgorithm::from_u8(byte)
            .ok_or_else(|| format_err!("unknown hash algorithm ({})", byte))
    }

    fn read_signature_material(
        &mut self,
        algorithm: PublicKeyAlgorithm,
    ) -> Result<SignatureMaterial> {
        match algorithm {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => Ok(SignatureMaterial::Rsa {
                sig: self.read_mpi(false)?,
            }),
            PublicKeyAlgorithm::DSA => Ok(SignatureMaterial::Dsa {
                r: self.read_mpi(false)?,
                s: self.read_mpi(false)?,
            }),
            other => bail!("bad signature key algorithm ({})", other as u8),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::packet::events::{Disposition, ParseOptions, PacketHeader};
    use crate::packet::parse::parse;
    use crate::packet::reader::SliceSource;
    use crate::packet::subpacket::Subpacket;
    use crate::types::LengthType;
    use crate::util::dt_from_timestamp;

    fn run_parser(data: &[u8], options: ParseOptions) -> (crate::errors::Result<()>, Vec<Event>) {
        let mut events = Vec::new();
        let res = parse(SliceSource::new(data), options, &mut |event: Event| {
            events.push(event)
        });
        (res, events)
    }

    fn v3_signature_packet() -> Vec<u8> {
        #[rustfmt::skip]
        let body = vec![
            // version 3, hash material length 5, type 0x10, created 2
            0x03, 0x05, 0x10, 0x00, 0x00, 0x00, 0x02,
            // signer key id
            0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11,
            // RSA, SHA1
            0x01, 0x02,
            // hash2
            0x12, 0x34,
            // signature MPI, 15 bits
            0x00, 0x0f, 0x60, 0x01,
        ];

        let mut packet = vec![0xc2, body.len() as u8];
        packet.extend(body);
        packet
    }

    #[test]
    fn test_v3_signature() {
        let input = v3_signature_packet();
        let (res, events) = run_parser(&input, ParseOptions::default());
        res.unwrap();

        assert_eq!(
            events[0],
            Event::Header(PacketHeader {
                new_format: true,
                tag: 2,
                length_type: LengthType::NewFormat,
                length: Some((input.len() - 2) as u32),
            })
        );
        match &events[1] {
            Event::Signature(sig) => {
                assert_eq!(sig.version, SignatureVersion::V3);
                assert_eq!(sig.typ, SignatureType::CertGeneric);
                assert_eq!(sig.created_at, 2);
                assert_eq!(
                    sig.signer_key_id,
                    [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11]
                );
                assert_eq!(sig.key_algorithm, PublicKeyAlgorithm::RSA);
                assert_eq!(sig.hash_algorithm, HashAlgorithm::SHA1);
                assert_eq!(sig.hash2, [0x12, 0x34]);
                assert_eq!(sig.hashed_range, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_v3_bad_hash_info_length() {
        let mut input = v3_signature_packet();
        input[3] = 4;
        let (res, _) = run_parser(&input, ParseOptions::default());
        assert!(res.unwrap_err().to_string().contains("bad hash info length"));
    }

    #[test]
    fn test_v2_signature_keeps_its_version() {
        let mut input = v3_signature_packet();
        input[2] = 2;
        let (res, events) = run_parser(&input, ParseOptions::default());
        res.unwrap();
        match &events[1] {
            Event::Signature(sig) => assert_eq!(sig.version, SignatureVersion::V2),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_bad_signature_version() {
        let input = [0xc2, 0x01, 0x05];
        let (res, _) = run_parser(&input, ParseOptions::default());
        assert_eq!(
            res.unwrap_err().to_string(),
            "format error: bad signature version (5)"
        );
    }

    fn v4_signature_packet() -> Vec<u8> {
        #[rustfmt::skip]
        let body = vec![
            // version 4, type 0x13, RSA, SHA1
            0x04, 0x13, 0x01, 0x02,
            // hashed subpacket set: creation time (type 2), created 3
            0x00, 0x06,
            0x05, 0x02, 0x00, 0x00, 0x00, 0x03,
            // unhashed subpacket set: issuer key id (type 16)
            0x00, 0x0a,
            0x09, 0x10, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11,
            // hash2
            0x56, 0x78,
            // signature MPI, 15 bits
            0x00, 0x0f, 0x60, 0x01,
        ];

        let mut packet = vec![0xc2, body.len() as u8];
        packet.extend(body);
        packet
    }

    #[test]
    fn test_v4_signature_with_issuer_subpacket() {
        let input = v4_signature_packet();
        let options = ParseOptions::new()
            .accumulate(true)
            .all_subpackets(Disposition::Parsed);
        let (res, events) = run_parser(&input, options);
        res.unwrap();

        assert_eq!(
            events[1],
            Event::Subpacket {
                critical: false,
                content: Subpacket::SignatureCreationTime(dt_from_timestamp(3)),
            }
        );
        assert_eq!(
            events[2],
            Event::Subpacket {
                critical: false,
                content: Subpacket::Issuer([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11]),
            }
        );

        let sig = match &events[3] {
            Event::Signature(sig) => sig,
            other => panic!("unexpected event: {:?}", other),
        };
        assert_eq!(sig.version, SignatureVersion::V4);
        assert_eq!(sig.created_at, 3);
        assert_eq!(
            sig.signer_key_id,
            [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x11]
        );

        // the hashed area runs from the version byte to the end of the
        // hashed subpacket set: 4 header bytes, 2 count bytes, 6 set bytes
        let range = sig.hashed_range.as_ref().unwrap();
        assert_eq!(range.start, 2);
        assert_eq!(range.length, 12);

        // and inside the raw packet, the set's count prefix matches
        let raw = match &events[4] {
            Event::PacketEnd(packet) => &packet.raw,
            other => panic!("unexpected event: {:?}", other),
        };
        assert_eq!(raw, &input);
        let set_prefix =
            u32::from(raw[range.start + 4]) << 8 | u32::from(raw[range.start + 5]);
        assert_eq!(set_prefix, range.length - 6);
    }

    #[test]
    fn test_v4_unconsumed_data() {
        let mut input = v4_signature_packet();
        // grow the declared packet length past the actual content
        input[1] += 1;
        input.push(0x00);
        let (res, _) = run_parser(&input, ParseOptions::default());
        assert_eq!(
            res.unwrap_err().to_string(),
            "format error: unconsumed data (1)"
        );
    }
}

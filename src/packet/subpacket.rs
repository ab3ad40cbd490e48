use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use log::debug;
use num_traits::FromPrimitive;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::packet::events::{Disposition, Event, Sink};
use crate::packet::parse::Parser;
use crate::packet::reader::Source;
use crate::packet::signature::SigScratch;
use crate::types::{
    CompressionAlgorithm, PublicKeyAlgorithm, RevocationCode, SubpacketType,
    SymmetricKeyAlgorithm,
};
use crate::util::dt_from_timestamp;

/// A parsed signature subpacket.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3.1
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Subpacket {
    /// The time the signature was made.
    SignatureCreationTime(DateTime<Utc>),
    /// The time the signature will expire.
    SignatureExpirationTime(DateTime<Utc>),
    /// When the key is going to expire.
    KeyExpirationTime(DateTime<Utc>),
    Issuer([u8; 8]),
    /// Symmetric algorithms the key holder prefers to use.
    PreferredSymmetricAlgorithms(Vec<SymmetricKeyAlgorithm>),
    /// Hash algorithms the key holder prefers to use.
    PreferredHashAlgorithms(Vec<HashAlgorithm>),
    /// Compression algorithms the key holder prefers to use.
    PreferredCompressionAlgorithms(Vec<CompressionAlgorithm>),
    KeyServerPreferences(Vec<u8>),
    KeyFlags(Vec<u8>),
    Features(Vec<u8>),
    RevocationReason(RevocationCode, Vec<u8>),
    IsPrimary(bool),
    Revocable(bool),
    ExportableCertification(bool),
    PreferredKeyServer(String),
    Notation { name: String, value: String },
    RevocationKey {
        class: u8,
        algorithm: PublicKeyAlgorithm,
        fingerprint: [u8; 20],
    },
    SignersUserId(String),
    PolicyUri(String),
    TrustSignature { level: u8, amount: u8 },
    RegularExpression(String),
}

impl<'a, R: Source, S: Sink> Parser<'a, R, S> {
    /// Parse one subpacket set: a 2-octet length followed by back-to-back
    /// subpackets, each delivered per its configured disposition.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3
    pub(crate) fn parse_subpacket_set(&mut self, scratch: &mut SigScratch) -> Result<()> {
        let set_len = self.read_scalar(2)?;
        self.regions.push(Some(set_len));

        let res = self.parse_subpacket_set_inner(scratch);
        let region = self.regions.pop();
        res?;

        if let Some(region) = region {
            ensure!(region.is_consumed(), "subpacket set length mismatch");
        }
        Ok(())
    }

    fn parse_subpacket_set_inner(&mut self, scratch: &mut SigScratch) -> Result<()> {
        while self
            .regions
            .current()
            .map_or(false, |region| !region.is_consumed())
        {
            self.parse_one_subpacket(scratch)?;
        }
        Ok(())
    }

    fn parse_one_subpacket(&mut self, scratch: &mut SigScratch) -> Result<()> {
        let len = self.read_new_length()?;
        ensure!(len >= 1, "zero-length signature subpacket");

        self.regions.push(Some(len));
        let res = self.parse_one_subpacket_inner(scratch, len - 1);
        self.regions.pop();
        res
    }

    fn parse_one_subpacket_inner(
        &mut self,
        scratch: &mut SigScratch,
        body_len: u32,
    ) -> Result<()> {
        let type_byte = self.read_u8()?;
        let critical = type_byte & 0x80 != 0;
        let typ = type_byte & 0x7f;

        match self.options.disposition(typ) {
            Disposition::Raw => {
                let body = self.read_body(body_len)?;
                self.emit(Event::RawSubpacket {
                    typ,
                    critical,
                    body,
                });
                Ok(())
            }
            Disposition::Parsed => {
                let content = self.parse_subpacket_content(typ, body_len, scratch)?;
                self.check_consumed()?;
                self.emit(Event::Subpacket { critical, content });
                Ok(())
            }
            Disposition::Ignore => {
                if critical {
                    bail!("critical signature subpacket ignored ({})", typ);
                }
                debug!("skipping subpacket type {} ({} bytes)", typ, body_len);
                self.skip(body_len)
            }
        }
    }

    fn read_body(&mut self, len: u32) -> Result<Vec<u8>> {
        let mut body = vec![0u8; len as usize];
        if !body.is_empty() {
            self.limited_read(&mut body)?;
        }
        Ok(body)
    }

    fn read_utf8(&mut self, len: u32, what: &str) -> Result<String> {
        String::from_utf8(self.read_body(len)?)
            .map_err(|_| format_err!("invalid UTF-8 in {} subpacket", what))
    }

    fn parse_subpacket_content(
        &mut self,
        typ: u8,
        body_len: u32,
        scratch: &mut SigScratch,
    ) -> Result<Subpacket> {
        let typ = SubpacketType::from_u8(typ)
            .ok_or_else(|| format_err!("unknown signature subpacket type ({})", typ))?;

        match typ {
            SubpacketType::SignatureCreationTime => {
                let ts = self.read_time()?;
                scratch.created_at = ts;
                Ok(Subpacket::SignatureCreationTime(dt_from_timestamp(ts)))
            }
            SubpacketType::SignatureExpirationTime => {
                let ts = self.read_time()?;
                Ok(Subpacket::SignatureExpirationTime(dt_from_timestamp(ts)))
            }
            SubpacketType::KeyExpirationTime => {
                let ts = self.read_time()?;
                Ok(Subpacket::KeyExpirationTime(dt_from_timestamp(ts)))
            }
            SubpacketType::Issuer => {
                let mut key_id = [0u8; 8];
                self.limited_read(&mut key_id)?;
                scratch.signer_key_id = key_id;
                Ok(Subpacket::Issuer(key_id))
            }
            SubpacketType::TrustSignature => {
                let level = self.read_u8()?;
                let amount = self.read_u8()?;
                Ok(Subpacket::TrustSignature { level, amount })
            }
            SubpacketType::ExportableCertification => {
                Ok(Subpacket::ExportableCertification(self.read_u8()? == 1))
            }
            SubpacketType::Revocable => Ok(Subpacket::Revocable(self.read_u8()? == 1)),
            SubpacketType::PrimaryUserId => Ok(Subpacket::IsPrimary(self.read_u8()? == 1)),
            SubpacketType::PreferredSymmetricAlgorithms => {
                let algs = self
                    .read_body(body_len)?
                    .into_iter()
                    .map(|b| {
                        SymmetricKeyAlgorithm::from_u8(b).ok_or_else(|| {
                            format_err!("unknown symmetric key algorithm ({})", b)
                        })
                    })
                    .collect::<Result<_>>()?;
                Ok(Subpacket::PreferredSymmetricAlgorithms(algs))
            }
            SubpacketType::PreferredHashAlgorithms => {
                let algs = self
                    .read_body(body_len)?
                    .into_iter()
                    .map(|b| {
                        HashAlgorithm::from_u8(b)
                            .ok_or_else(|| format_err!("unknown hash algorithm ({})", b))
                    })
                    .collect::<Result<_>>()?;
                Ok(Subpacket::PreferredHashAlgorithms(algs))
            }
            SubpacketType::PreferredCompressionAlgorithms => {
                let algs = self
                    .read_body(body_len)?
                    .into_iter()
                    .map(|b| {
                        CompressionAlgorithm::from_u8(b)
                            .ok_or_else(|| format_err!("unknown compression algorithm ({})", b))
                    })
                    .collect::<Result<_>>()?;
                Ok(Subpacket::PreferredCompressionAlgorithms(algs))
            }
            SubpacketType::KeyServerPreferences => {
                Ok(Subpacket::KeyServerPreferences(self.read_body(body_len)?))
            }
            SubpacketType::KeyFlags => Ok(Subpacket::KeyFlags(self.read_body(body_len)?)),
            SubpacketType::Features => Ok(Subpacket::Features(self.read_body(body_len)?)),
            SubpacketType::PreferredKeyServer => Ok(Subpacket::PreferredKeyServer(
                self.read_utf8(body_len, "preferred key server")?,
            )),
            SubpacketType::SignersUserId => Ok(Subpacket::SignersUserId(
                self.read_utf8(body_len, "signer's user id")?,
            )),
            SubpacketType::PolicyUri => {
                Ok(Subpacket::PolicyUri(self.read_utf8(body_len, "policy URI")?))
            }
            SubpacketType::RegularExpression => Ok(Subpacket::RegularExpression(
                self.read_utf8(body_len, "regular expression")?,
            )),
            SubpacketType::NotationData => {
                let mut header = [0u8; 8];
                self.limited_read(&mut header)?;
                let name_len = u32::from(BigEndian::read_u16(&header[4..6]));
                let value_len = u32::from(BigEndian::read_u16(&header[6..8]));
                let name = self.read_utf8(name_len, "notation name")?;
                let value = self.read_utf8(value_len, "notation value")?;
                Ok(Subpacket::Notation { name, value })
            }
            SubpacketType::RevocationReason => {
                let code_byte = self.read_u8()?;
                let code = RevocationCode::from_u8(code_byte)
                    .ok_or_else(|| format_err!("unknown revocation code ({})", code_byte))?;
                let reason = self.read_body(body_len - 1)?;
                Ok(Subpacket::RevocationReason(code, reason))
            }
            SubpacketType::RevocationKey => {
                let class = self.read_u8()?;
                let alg_byte = self.read_u8()?;
                let algorithm = PublicKeyAlgorithm::from_u8(alg_byte)
                    .ok_or_else(|| format_err!("unknown public key algorithm ({})", alg_byte))?;
                let mut fingerprint = [0u8; 20];
                self.limited_read(&mut fingerprint)?;
                Ok(Subpacket::RevocationKey {
                    class,
                    algorithm,
                    fingerprint,
                })
            }
            SubpacketType::SignatureTarget | SubpacketType::EmbeddedSignature => {
                bail!("unsupported signature subpacket type ({})", typ as u8)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::packet::events::ParseOptions;
    use crate::packet::parse::parse;
    use crate::packet::reader::SliceSource;

    /// Wrap subpacket set bytes into a minimal v4 RSA signature packet.
    fn v4_packet_with_hashed_set(set: &[u8]) -> Vec<u8> {
        let mut body = vec![0x04, 0x13, 0x01, 0x02];
        body.push((set.len() >> 8) as u8);
        body.push(set.len() as u8);
        body.extend_from_slice(set);
        // empty unhashed set, hash2, signature MPI
        body.extend_from_slice(&[0x00, 0x00]);
        body.extend_from_slice(&[0x56, 0x78]);
        body.extend_from_slice(&[0x00, 0x0f, 0x60, 0x01]);

        let mut packet = vec![0xc2, body.len() as u8];
        packet.extend(body);
        packet
    }

    fn run_parser(data: &[u8], options: ParseOptions) -> (crate::errors::Result<()>, Vec<Event>) {
        let mut events = Vec::new();
        let res = parse(SliceSource::new(data), options, &mut |event: Event| {
            events.push(event)
        });
        (res, events)
    }

    #[test]
    fn test_critical_ignored_subpacket_is_an_error() {
        // unknown type 33 with the critical bit set
        let input = v4_packet_with_hashed_set(&[0x02, 0xa1, 0x00]);
        let (res, events) = run_parser(&input, ParseOptions::default());

        assert_eq!(
            res.unwrap_err().to_string(),
            "format error: critical signature subpacket ignored (33)"
        );
        assert!(matches!(events.last(), Some(Event::Error { .. })));
    }

    #[test]
    fn test_critical_raw_subpacket_is_delivered() {
        let input = v4_packet_with_hashed_set(&[0x02, 0xa1, 0x42]);
        let options = ParseOptions::new().subpacket(33, Disposition::Raw);
        let (res, events) = run_parser(&input, options);
        res.unwrap();

        assert_eq!(
            events[1],
            Event::RawSubpacket {
                typ: 33,
                critical: true,
                body: vec![0x42],
            }
        );
    }

    #[test]
    fn test_noncritical_unknown_is_skipped() {
        let input = v4_packet_with_hashed_set(&[0x02, 0x21, 0x42]);
        let (res, events) = run_parser(&input, ParseOptions::default());
        res.unwrap();

        // header, signature: nothing in between
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unknown_type_under_parsed_disposition() {
        let input = v4_packet_with_hashed_set(&[0x02, 0x21, 0x42]);
        let options = ParseOptions::new().all_subpackets(Disposition::Parsed);
        let (res, _) = run_parser(&input, options);
        assert_eq!(
            res.unwrap_err().to_string(),
            "format error: unknown signature subpacket type (33)"
        );
    }

    #[test]
    fn test_trust_signature_level_and_amount() {
        let input = v4_packet_with_hashed_set(&[0x03, 0x05, 0x01, 0x78]);
        let options = ParseOptions::new().all_subpackets(Disposition::Parsed);
        let (res, events) = run_parser(&input, options);
        res.unwrap();

        assert_eq!(
            events[1],
            Event::Subpacket {
                critical: false,
                content: Subpacket::TrustSignature {
                    level: 1,
                    amount: 0x78,
                },
            }
        );
    }

    #[test]
    fn test_preferred_hash_algorithms() {
        let input = v4_packet_with_hashed_set(&[0x03, 0x15, 0x02, 0x08]);
        let options = ParseOptions::new().all_subpackets(Disposition::Parsed);
        let (res, events) = run_parser(&input, options);
        res.unwrap();

        assert_eq!(
            events[1],
            Event::Subpacket {
                critical: false,
                content: Subpacket::PreferredHashAlgorithms(vec![
                    HashAlgorithm::SHA1,
                    HashAlgorithm::SHA256,
                ]),
            }
        );
    }

    #[test]
    fn test_subpacket_with_trailing_garbage() {
        // a creation time subpacket one byte too long
        let input = v4_packet_with_hashed_set(&[0x06, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00]);
        let options = ParseOptions::new().all_subpackets(Disposition::Parsed);
        let (res, _) = run_parser(&input, options);
        assert_eq!(
            res.unwrap_err().to_string(),
            "format error: unconsumed data (1)"
        );
    }

    #[test]
    fn test_subpacket_overruns_its_set() {
        // subpacket claims 8 bytes but the set only holds 3
        let input = v4_packet_with_hashed_set(&[0x08, 0x02, 0x00]);
        let (res, _) = run_parser(&input, ParseOptions::default());
        assert!(res.is_err());
    }

    #[test]
    fn test_notation_subpacket() {
        #[rustfmt::skip]
        let set = [
            0x13, 0x14,
            // flags: human readable
            0x80, 0x00, 0x00, 0x00,
            // name len 4, value len 6
            0x00, 0x04, 0x00, 0x06,
            b'n', b'a', b'm', b'e',
            b's', b'e', b'c', b'r', b'e', b't',
        ];
        let input = v4_packet_with_hashed_set(&set);
        let options = ParseOptions::new().all_subpackets(Disposition::Parsed);
        let (res, events) = run_parser(&input, options);
        res.unwrap();

        assert_eq!(
            events[1],
            Event::Subpacket {
                critical: false,
                content: Subpacket::Notation {
                    name: "name".into(),
                    value: "secret".into(),
                },
            }
        );
    }
}

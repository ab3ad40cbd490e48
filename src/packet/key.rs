use chrono::{DateTime, Utc};
use num_traits::FromPrimitive;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::packet::events::{Event, Sink};
use crate::packet::parse::Parser;
use crate::packet::reader::Source;
use crate::types::{KeyVersion, Mpi, PublicKeyAlgorithm, Tag};
use crate::util::{dt_from_timestamp, write_be_u16, write_be_u32, write_packet_header};

/// A public key or public subkey packet.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.5.2
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicKey {
    pub version: KeyVersion,
    pub created_at: u32,
    /// v2/v3 only: validity period in days, 0 meaning forever.
    pub expiration: Option<u16>,
    pub algorithm: PublicKeyAlgorithm,
    pub params: PublicParams,
}

/// The algorithm-specific key material.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum PublicParams {
    Rsa { n: Mpi, e: Mpi },
    Dsa { p: Mpi, q: Mpi, g: Mpi, y: Mpi },
    Elgamal { p: Mpi, g: Mpi, y: Mpi },
}

impl PublicParams {
    fn write_mpis(&self, buf: &mut Vec<u8>) {
        match self {
            PublicParams::Rsa { n, e } => {
                n.write(buf);
                e.write(buf);
            }
            PublicParams::Dsa { p, q, g, y } => {
                p.write(buf);
                q.write(buf);
                g.write(buf);
                y.write(buf);
            }
            PublicParams::Elgamal { p, g, y } => {
                p.write(buf);
                g.write(buf);
                y.write(buf);
            }
        }
    }
}

impl PublicKey {
    pub fn created(&self) -> DateTime<Utc> {
        dt_from_timestamp(self.created_at)
    }

    /// The canonical serialized form: the packet body as written to the
    /// wire, and the bytes certification hashing runs over.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(self.version as u8);
        write_be_u32(&mut buf, self.created_at);
        if let Some(days) = self.expiration {
            if self.version != KeyVersion::V4 {
                write_be_u16(&mut buf, days);
            }
        }
        buf.push(self.algorithm as u8);
        self.params.write_mpis(&mut buf);
        buf
    }

    /// The complete packet with new format framing.
    pub fn to_packet_bytes(&self, tag: Tag) -> Vec<u8> {
        let body = self.to_bytes();
        let mut buf = Vec::with_capacity(body.len() + 6);
        write_packet_header(&mut buf, tag as u8, body.len());
        buf.extend_from_slice(&body);
        buf
    }

    /// Key fingerprint: v4 keys hash the `0x99` framed body with SHA-1,
    /// v2/v3 keys hash the bare MPI magnitudes with MD5.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-12.2
    pub fn fingerprint(&self) -> Vec<u8> {
        match self.version {
            KeyVersion::V4 => {
                let body = self.to_bytes();
                let mut len = Vec::with_capacity(2);
                write_be_u16(&mut len, body.len() as u16);

                let mut hasher = HashAlgorithm::SHA1.new_hasher();
                hasher.update(&[0x99]);
                hasher.update(&len);
                hasher.update(&body);
                hasher.finish()
            }
            KeyVersion::V2 | KeyVersion::V3 => {
                let mut hasher = HashAlgorithm::MD5.new_hasher();
                match &self.params {
                    PublicParams::Rsa { n, e } => {
                        hasher.update(n.as_bytes());
                        hasher.update(e.as_bytes());
                    }
                    PublicParams::Dsa { p, q, g, y } => {
                        hasher.update(p.as_bytes());
                        hasher.update(q.as_bytes());
                        hasher.update(g.as_bytes());
                        hasher.update(y.as_bytes());
                    }
                    PublicParams::Elgamal { p, g, y } => {
                        hasher.update(p.as_bytes());
                        hasher.update(g.as_bytes());
                        hasher.update(y.as_bytes());
                    }
                }
                hasher.finish()
            }
        }
    }

    /// The 8-octet key id, if the key has one.
    pub fn key_id(&self) -> Option<[u8; 8]> {
        let bytes = match self.version {
            // low 64 bits of the fingerprint
            KeyVersion::V4 => self.fingerprint()[12..].to_vec(),
            // low 64 bits of the RSA modulus
            KeyVersion::V2 | KeyVersion::V3 => match &self.params {
                PublicParams::Rsa { n, .. } if n.byte_len() >= 8 => {
                    n.as_bytes()[n.byte_len() - 8..].to_vec()
                }
                _ => return None,
            },
        };

        let mut id = [0u8; 8];
        id.copy_from_slice(&bytes);
        Some(id)
    }
}

impl<'a, R: Source, S: Sink> Parser<'a, R, S> {
    /// Parse a v2/v3/v4 public key or public subkey packet for RSA, DSA and
    /// Elgamal keys.
    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.5.2
    pub(crate) fn parse_public_key(&mut self, tag: Tag) -> Result<()> {
        let version_byte = self.read_u8()?;
        let version = KeyVersion::from_u8(version_byte)
            .ok_or_else(|| format_err!("bad public key version (0x{:02x})", version_byte))?;

        let created_at = self.read_time()?;
        let expiration = match version {
            KeyVersion::V2 | KeyVersion::V3 => Some(self.read_scalar(2)? as u16),
            KeyVersion::V4 => None,
        };

        let alg_byte = self.read_u8()?;
        let algorithm = PublicKeyAlgorithm::from_u8(alg_byte)
            .ok_or_else(|| format_err!("unknown public key algorithm ({})", alg_byte))?;

        let params = match algorithm {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => PublicParams::Rsa {
                n: self.read_mpi(false)?,
                e: self.read_mpi(false)?,
            },
            PublicKeyAlgorithm::DSA => PublicParams::Dsa {
                p: self.read_mpi(false)?,
                q: self.read_mpi(false)?,
                g: self.read_mpi(false)?,
                y: self.read_mpi(false)?,
            },
            PublicKeyAlgorithm::Elgamal | PublicKeyAlgorithm::ElgamalLegacy => {
                PublicParams::Elgamal {
                    p: self.read_mpi(false)?,
                    g: self.read_mpi(false)?,
                    y: self.read_mpi(false)?,
                }
            }
            other => unsupported_err!("public key algorithm {:?} ({})", other, alg_byte),
        };

        self.check_consumed()?;

        let key = PublicKey {
            version,
            created_at,
            expiration,
            algorithm,
            params,
        };
        let event = match tag {
            Tag::PublicSubkey => Event::PublicSubkey(key),
            _ => Event::PublicKey(key),
        };
        self.emit(event);

        Ok(())
    }
}

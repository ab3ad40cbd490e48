use byteorder::{BigEndian, ByteOrder};
use rand::{CryptoRng, Rng};

use crate::crypto::hash::{HashAlgorithm, Hasher};
use crate::crypto::{dsa, rsa, DsaSecretKey, RsaSecretKey};
use crate::errors::Result;
use crate::packet::{PublicKey, PublicParams, UserId};
use crate::sig::{hash_key, hash_user_id};
use crate::types::{PublicKeyAlgorithm, SignatureType, SignatureVersion, SubpacketType, Tag};
use crate::util::{write_be_u32, write_packet_header, write_packet_length};

/// Builds a v4 certification signature packet.
///
/// Subpacket sets are length-prefixed, so the body is staged in memory with
/// placeholder counts that are backfilled once each set is complete. The
/// digest runs alongside: it is seeded with the key and user id preambles at
/// construction, and finalized over the staged body up to the unhashed
/// count, plus the trailer, when signing.
pub struct SignatureBuilder {
    typ: SignatureType,
    key_algorithm: PublicKeyAlgorithm,
    hash_algorithm: HashAlgorithm,
    hasher: Hasher,
    buf: Vec<u8>,
    hashed_count_offset: usize,
    unhashed_count_offset: Option<usize>,
}

impl SignatureBuilder {
    /// Start a certification signature binding `id` to `key`. Subpacket
    /// writers called before [`end_hashed_subpackets`](Self::end_hashed_subpackets)
    /// land in the hashed set, later ones in the unhashed set.
    pub fn certification(
        key: &PublicKey,
        id: &UserId,
        typ: SignatureType,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let mut hasher = hash_algorithm.new_hasher();
        hash_key(&mut hasher, key);
        hash_user_id(&mut hasher, SignatureVersion::V4, id);

        SignatureBuilder::new(key, typ, hash_algorithm, hasher)
    }

    /// Start a subkey binding signature over `key` and `subkey`.
    pub fn subkey_binding(
        key: &PublicKey,
        subkey: &PublicKey,
        hash_algorithm: HashAlgorithm,
    ) -> Self {
        let mut hasher = hash_algorithm.new_hasher();
        hash_key(&mut hasher, key);
        hash_key(&mut hasher, subkey);

        SignatureBuilder::new(key, SignatureType::SubkeyBinding, hash_algorithm, hasher)
    }

    fn new(
        key: &PublicKey,
        typ: SignatureType,
        hash_algorithm: HashAlgorithm,
        hasher: Hasher,
    ) -> Self {
        let mut buf = Vec::with_capacity(100);
        buf.push(SignatureVersion::V4 as u8);
        buf.push(typ as u8);
        buf.push(key.algorithm as u8);
        buf.push(hash_algorithm as u8);

        // hashed subpacket count, backfilled
        let hashed_count_offset = buf.len();
        buf.extend_from_slice(&[0, 0]);

        SignatureBuilder {
            typ,
            key_algorithm: key.algorithm,
            hash_algorithm,
            hasher,
            buf,
            hashed_count_offset,
            unhashed_count_offset: None,
        }
    }

    pub fn typ(&self) -> SignatureType {
        self.typ
    }

    fn write_subpacket_header(&mut self, body_len: usize, typ: SubpacketType) {
        write_packet_length(&mut self.buf, body_len + 1);
        self.buf.push(typ as u8);
    }

    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3.4
    pub fn add_creation_time(&mut self, when: u32) {
        self.write_subpacket_header(4, SubpacketType::SignatureCreationTime);
        write_be_u32(&mut self.buf, when);
    }

    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3.5
    pub fn add_issuer_key_id(&mut self, key_id: [u8; 8]) {
        self.write_subpacket_header(8, SubpacketType::Issuer);
        self.buf.extend_from_slice(&key_id);
    }

    /// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3.19
    pub fn add_primary_user_id(&mut self, primary: bool) {
        self.write_subpacket_header(1, SubpacketType::PrimaryUserId);
        self.buf.push(primary as u8);
    }

    /// Close the hashed subpacket set: backfill its count and open the
    /// unhashed set.
    pub fn end_hashed_subpackets(&mut self) {
        let count = self.buf.len() - self.hashed_count_offset - 2;
        BigEndian::write_u16(
            &mut self.buf[self.hashed_count_offset..self.hashed_count_offset + 2],
            count as u16,
        );

        let offset = self.buf.len();
        self.buf.extend_from_slice(&[0, 0]);
        self.unhashed_count_offset = Some(offset);
    }

    /// Backfill the unhashed count and finalize the digest: the body up to
    /// the unhashed count, then the `04 FF <length>` trailer. Returns the
    /// digest and the completed body, ready for the signature material.
    fn finalize(mut self) -> Result<(Vec<u8>, Vec<u8>)> {
        let offset = self
            .unhashed_count_offset
            .ok_or_else(|| format_err!("hashed subpacket set was not closed"))?;

        let count = self.buf.len() - offset - 2;
        BigEndian::write_u16(&mut self.buf[offset..offset + 2], count as u16);

        self.hasher.update(&self.buf[..offset]);
        self.hasher.update(&[SignatureVersion::V4 as u8, 0xff]);
        let mut len = Vec::with_capacity(4);
        write_be_u32(&mut len, offset as u32);
        self.hasher.update(&len);

        Ok((self.hasher.finish(), self.buf))
    }

    /// Sign with an RSA secret key and return the complete signature packet.
    pub fn sign_rsa(self, secret: &RsaSecretKey) -> Result<Vec<u8>> {
        ensure!(
            matches!(
                self.key_algorithm,
                PublicKeyAlgorithm::RSA
                    | PublicKeyAlgorithm::RSAEncrypt
                    | PublicKeyAlgorithm::RSASign
            ),
            "RSA signature on a {:?} key",
            self.key_algorithm
        );

        let hash_algorithm = self.hash_algorithm;
        let (digest, mut body) = self.finalize()?;

        body.extend_from_slice(&digest[..2]);
        let sig = rsa::sign_rsa(secret, hash_algorithm, &digest)?;
        body.extend_from_slice(&sig.to_vec());

        Ok(frame_packet(body))
    }

    /// Sign with a DSA secret key; the domain parameters come from the
    /// signer's public key.
    pub fn sign_dsa<R: Rng + CryptoRng>(
        self,
        rng: &mut R,
        signer: &PublicKey,
        secret: &DsaSecretKey,
    ) -> Result<Vec<u8>> {
        let (p, q, g) = match &signer.params {
            PublicParams::Dsa { p, q, g, .. } => (p, q, g),
            _ => bail!("DSA signature on a {:?} key", signer.algorithm),
        };

        let hash_algorithm = self.hash_algorithm;
        let (digest, mut body) = self.finalize()?;

        body.extend_from_slice(&digest[..2]);
        let (r, s) = dsa::sign_dsa(rng, p, q, g, secret, &digest)?;
        body.extend_from_slice(&r.to_vec());
        body.extend_from_slice(&s.to_vec());

        Ok(frame_packet(body))
    }
}

fn frame_packet(body: Vec<u8>) -> Vec<u8> {
    let mut packet = Vec::with_capacity(body.len() + 6);
    write_packet_header(&mut packet, Tag::Signature as u8, body.len());
    packet.extend_from_slice(&body);
    packet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyVersion, Mpi};

    fn dummy_key() -> PublicKey {
        PublicKey {
            version: KeyVersion::V4,
            created_at: 7,
            expiration: None,
            algorithm: PublicKeyAlgorithm::RSA,
            params: PublicParams::Rsa {
                n: Mpi::from_parts(15, vec![0x60, 0x01], false).unwrap(),
                e: Mpi::from_parts(5, vec![0x11], false).unwrap(),
            },
        }
    }

    #[test]
    fn test_subpacket_counts_are_backfilled() {
        let key = dummy_key();
        let mut builder = SignatureBuilder::certification(
            &key,
            &UserId::from("Alice"),
            SignatureType::CertGeneric,
            HashAlgorithm::SHA1,
        );

        builder.add_creation_time(1);
        builder.end_hashed_subpackets();
        builder.add_issuer_key_id([1, 2, 3, 4, 5, 6, 7, 8]);

        let (digest, body) = builder.finalize().unwrap();
        assert_eq!(digest.len(), 20);

        // header
        assert_eq!(&body[..4], &[0x04, 0x10, 0x01, 0x02]);
        // hashed set: one creation time subpacket, 6 bytes
        assert_eq!(&body[4..6], &[0x00, 0x06]);
        assert_eq!(&body[6..12], &[0x05, 0x02, 0x00, 0x00, 0x00, 0x01]);
        // unhashed set: one issuer subpacket, 10 bytes
        assert_eq!(&body[12..14], &[0x00, 0x0a]);
        assert_eq!(&body[14..16], &[0x09, 0x10]);
        assert_eq!(&body[16..24], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(body.len(), 24);
    }

    #[test]
    fn test_signing_requires_closing_the_hashed_set() {
        let key = dummy_key();
        let builder = SignatureBuilder::certification(
            &key,
            &UserId::from("Alice"),
            SignatureType::CertGeneric,
            HashAlgorithm::SHA1,
        );

        assert!(builder.finalize().is_err());
    }
}

//! The signature engine: assembles the signed-data digest according to the
//! framing rules for certification-style signatures, and verifies or
//! produces the RSA/DSA material over it.

mod build;

pub use self::build::SignatureBuilder;

use log::debug;

use crate::crypto::hash::Hasher;
use crate::crypto::{dsa, rsa};
use crate::errors::Result;
use crate::packet::{PublicKey, PublicParams, Signature, SignatureMaterial, UserId};
use crate::types::SignatureVersion;
use crate::util::{hex_fragment, write_be_u16, write_be_u32};

/// Feed the key-binding preamble: `0x99`, the 2-octet length of the
/// canonical serialized key, then the key itself. Common to all
/// certification-style signatures.
pub fn hash_key(hasher: &mut Hasher, key: &PublicKey) {
    let body = key.to_bytes();
    let mut len = Vec::with_capacity(2);
    write_be_u16(&mut len, body.len() as u16);

    hasher.update(&[0x99]);
    hasher.update(&len);
    hasher.update(&body);
}

/// Feed a user id. v4 signatures frame it with `0xB4` and a 4-octet length;
/// v2/v3 signatures hash the bare bytes.
pub fn hash_user_id(hasher: &mut Hasher, version: SignatureVersion, id: &UserId) {
    match version {
        SignatureVersion::V4 => {
            let mut len = Vec::with_capacity(4);
            write_be_u32(&mut len, id.as_bytes().len() as u32);
            hasher.update(&[0xb4]);
            hasher.update(&len);
            hasher.update(id.as_bytes());
        }
        SignatureVersion::V2 | SignatureVersion::V3 => {
            hasher.update(id.as_bytes());
        }
    }
}

/// Start the digest for `sig`: a fresh hash context seeded with the
/// preamble for the key being certified.
fn init_signature_hash(sig: &Signature, key: &PublicKey) -> Hasher {
    let mut hasher = sig.hash_algorithm.new_hasher();
    hash_key(&mut hasher, key);
    hasher
}

/// Feed the closing bytes. A v4 signature hashes its own hashed area (a
/// slice of the raw packet) followed by the `04 FF <length>` trailer; a
/// v2/v3 signature hashes its type and creation time.
fn hash_trailer(hasher: &mut Hasher, sig: &Signature, raw_packet: &[u8]) -> Result<()> {
    match sig.version {
        SignatureVersion::V4 => {
            let range = sig
                .hashed_range
                .as_ref()
                .ok_or_else(|| format_err!("v4 signature without hashed area offsets"))?;
            let end = range.start + range.length as usize;
            ensure!(
                end <= raw_packet.len(),
                "hashed area extends past the raw packet ({} > {})",
                end,
                raw_packet.len()
            );

            hasher.update(&raw_packet[range.start..end]);
            hasher.update(&[sig.version as u8, 0xff]);
            let mut len = Vec::with_capacity(4);
            write_be_u32(&mut len, range.length);
            hasher.update(&len);
        }
        SignatureVersion::V2 | SignatureVersion::V3 => {
            hasher.update(&[sig.typ as u8]);
            let mut time = Vec::with_capacity(4);
            write_be_u32(&mut time, sig.created_at);
            hasher.update(&time);
        }
    }

    Ok(())
}

/// Finalize the digest and check it against the signature material and the
/// signer's key. A failed check is `Ok(false)`.
fn check_signature(hasher: Hasher, sig: &Signature, signer: &PublicKey) -> Result<bool> {
    let alg = hasher.algorithm();
    let digest = hasher.finish();
    debug!("signature digest: {}", hex_fragment(&digest, 64));

    // the stored digest prefix is a cheap mismatch filter
    if digest[..2] != sig.hash2 {
        debug!("digest prefix mismatch");
        return Ok(false);
    }

    match (&sig.material, &signer.params) {
        (SignatureMaterial::Rsa { sig }, PublicParams::Rsa { n, e }) => {
            rsa::verify_rsa(n, e, alg, &digest, sig)
        }
        (SignatureMaterial::Dsa { r, s }, PublicParams::Dsa { p, q, g, y }) => {
            dsa::verify_dsa(p, q, g, y, &digest, r, s)
        }
        _ => bail!("signature material does not match the signer's key algorithm"),
    }
}

/// Verify a certification signature binding `id` to `key`.
///
/// `raw_packet` is the accumulated raw signature packet, as delivered by the
/// `PacketEnd` event of an accumulating parse; v4 hashing replays a slice of
/// it.
pub fn verify_certification_signature(
    key: &PublicKey,
    id: &UserId,
    sig: &Signature,
    signer: &PublicKey,
    raw_packet: &[u8],
) -> Result<bool> {
    let mut hasher = init_signature_hash(sig, key);
    hash_user_id(&mut hasher, sig.version, id);
    hash_trailer(&mut hasher, sig, raw_packet)?;
    check_signature(hasher, sig, signer)
}

/// Verify a subkey binding signature over `key` and `subkey`.
pub fn verify_subkey_signature(
    key: &PublicKey,
    subkey: &PublicKey,
    sig: &Signature,
    signer: &PublicKey,
    raw_packet: &[u8],
) -> Result<bool> {
    let mut hasher = init_signature_hash(sig, key);
    hash_key(&mut hasher, subkey);
    hash_trailer(&mut hasher, sig, raw_packet)?;
    check_signature(hasher, sig, signer)
}

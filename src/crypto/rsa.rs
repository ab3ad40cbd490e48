use log::debug;
use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::types::Mpi;
use crate::util::hex_fragment;

/// ASN.1 DER DigestInfo prefixes for EMSA-PKCS1-v1_5.
/// Ref: https://tools.ietf.org/html/rfc8017#section-9.2
const PREFIX_MD5: &[u8] = &[
    0x30, 0x20, 0x30, 0x0c, 0x06, 0x08, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x02, 0x05, 0x05,
    0x00, 0x04, 0x10,
];
const PREFIX_SHA1: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];
const PREFIX_RIPEMD160: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x24, 0x03, 0x02, 0x01, 0x05, 0x00, 0x04, 0x14,
];
const PREFIX_SHA256: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01,
    0x05, 0x00, 0x04, 0x20,
];
const PREFIX_SHA384: &[u8] = &[
    0x30, 0x41, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02,
    0x05, 0x00, 0x04, 0x30,
];
const PREFIX_SHA512: &[u8] = &[
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03,
    0x05, 0x00, 0x04, 0x40,
];
const PREFIX_SHA224: &[u8] = &[
    0x30, 0x2d, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04,
    0x05, 0x00, 0x04, 0x1c,
];

fn digest_info_prefix(alg: HashAlgorithm) -> &'static [u8] {
    match alg {
        HashAlgorithm::MD5 => PREFIX_MD5,
        HashAlgorithm::SHA1 => PREFIX_SHA1,
        HashAlgorithm::RIPEMD160 => PREFIX_RIPEMD160,
        HashAlgorithm::SHA256 => PREFIX_SHA256,
        HashAlgorithm::SHA384 => PREFIX_SHA384,
        HashAlgorithm::SHA512 => PREFIX_SHA512,
        HashAlgorithm::SHA224 => PREFIX_SHA224,
    }
}

/// Assemble the EMSA-PKCS1-v1_5 block for a modulus of `k` bytes:
/// `00 01 FF..FF 00 <DigestInfo prefix> <digest>`, with at least 8 bytes of
/// FF padding.
/// Ref: https://tools.ietf.org/html/rfc8017#section-9.2
fn emsa_pkcs1_v15(alg: HashAlgorithm, digest: &[u8], k: usize) -> Result<Vec<u8>> {
    let prefix = digest_info_prefix(alg);
    ensure_eq!(digest.len(), alg.digest_size(), "digest length mismatch");

    let t_len = prefix.len() + digest.len();
    ensure!(
        k >= t_len + 11,
        "RSA modulus too small for {:?} signature",
        alg
    );

    let mut em = vec![0xff; k];
    em[0] = 0x00;
    em[1] = 0x01;
    em[k - t_len - 1] = 0x00;
    em[k - t_len..k - digest.len()].copy_from_slice(prefix);
    em[k - digest.len()..].copy_from_slice(digest);

    Ok(em)
}

/// Verify an RSA signature over `digest`: raise the signature to the public
/// exponent and compare against the expected block, byte for byte.
pub fn verify_rsa(n: &Mpi, e: &Mpi, alg: HashAlgorithm, digest: &[u8], sig: &Mpi) -> Result<bool> {
    let n_int = n.to_biguint();
    let k = (usize::from(n.bits()) + 7) / 8;
    let expected = emsa_pkcs1_v15(alg, digest, k)?;

    let s = sig.to_biguint();
    if s >= n_int {
        return Ok(false);
    }

    let m = s.modpow(&e.to_biguint(), &n_int);
    let raw = m.to_bytes_be();
    if raw.len() > k {
        return Ok(false);
    }

    // left-pad to the modulus size
    let mut em = vec![0u8; k - raw.len()];
    em.extend_from_slice(&raw);
    debug!("rsa em: {}", hex_fragment(&em, 64));

    Ok(em == expected)
}

/// RSA secret key material. Wiped on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct RsaSecretKey {
    pub n: BigUint,
    pub d: BigUint,
}

/// Produce an RSA signature over `digest`.
pub fn sign_rsa(key: &RsaSecretKey, alg: HashAlgorithm, digest: &[u8]) -> Result<Mpi> {
    let k = (key.n.bits() + 7) / 8;
    let em = emsa_pkcs1_v15(alg, digest, k)?;

    let m = BigUint::from_bytes_be(&em);
    let s = m.modpow(&key.d, &key.n);

    Ok(Mpi::from_biguint(&s))
}

#[cfg(test)]
mod tests {
    use num_bigint::{ModInverse, RandPrime};
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    use super::*;

    #[test]
    fn test_emsa_layout() {
        let digest = HashAlgorithm::SHA1.digest(b"abc");
        let em = emsa_pkcs1_v15(HashAlgorithm::SHA1, &digest, 64).unwrap();

        assert_eq!(em.len(), 64);
        assert_eq!(em[0], 0x00);
        assert_eq!(em[1], 0x01);
        let t_len = PREFIX_SHA1.len() + 20;
        assert!(em[2..64 - t_len - 1].iter().all(|&b| b == 0xff));
        assert!(em[2..64 - t_len - 1].len() >= 8);
        assert_eq!(em[64 - t_len - 1], 0x00);
        assert_eq!(&em[64 - t_len..64 - 20], PREFIX_SHA1);
        assert_eq!(&em[64 - 20..], &digest[..]);
    }

    #[test]
    fn test_emsa_rejects_small_modulus() {
        let digest = HashAlgorithm::SHA1.digest(b"abc");
        assert!(emsa_pkcs1_v15(HashAlgorithm::SHA1, &digest, 40).is_err());
    }

    /// Deterministic 512-bit test key.
    fn test_key() -> (Mpi, Mpi, RsaSecretKey) {
        let mut rng = ChaChaRng::seed_from_u64(0x70617273);
        let e = BigUint::from(65537u32);

        loop {
            let p: BigUint = rng.gen_prime(256);
            let q: BigUint = rng.gen_prime(256);
            if p == q {
                continue;
            }
            let n = &p * &q;
            let phi = (&p - 1u8) * (&q - 1u8);
            if let Some(d) = (&e).mod_inverse(&phi).and_then(|d| d.to_biguint()) {
                return (
                    Mpi::from_biguint(&n),
                    Mpi::from_biguint(&e),
                    RsaSecretKey { n, d },
                );
            }
        }
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let (n, e, secret) = test_key();
        let digest = HashAlgorithm::SHA1.digest(b"hello world");

        let sig = sign_rsa(&secret, HashAlgorithm::SHA1, &digest).unwrap();
        assert!(verify_rsa(&n, &e, HashAlgorithm::SHA1, &digest, &sig).unwrap());

        // a different message does not verify
        let other = HashAlgorithm::SHA1.digest(b"hello worle");
        assert!(!verify_rsa(&n, &e, HashAlgorithm::SHA1, &other, &sig).unwrap());

        // neither does a damaged signature
        let mut bytes = sig.as_bytes().to_vec();
        bytes[7] ^= 0x01;
        let bad = Mpi::from_biguint(&BigUint::from_bytes_be(&bytes));
        assert!(!verify_rsa(&n, &e, HashAlgorithm::SHA1, &digest, &bad).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_hash_algorithm() {
        let (n, e, secret) = test_key();
        let digest = HashAlgorithm::SHA256.digest(b"hello world");

        let sig = sign_rsa(&secret, HashAlgorithm::SHA256, &digest).unwrap();
        assert!(verify_rsa(&n, &e, HashAlgorithm::SHA256, &digest, &sig).unwrap());

        // same digest bytes presented under the wrong DigestInfo
        let truncated = &digest[..20];
        assert!(!verify_rsa(&n, &e, HashAlgorithm::SHA1, truncated, &sig).unwrap());
    }
}

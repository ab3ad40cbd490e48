use num_bigint::{BigUint, ModInverse, RandBigInt};
use num_traits::Zero;
use rand::{CryptoRng, Rng};
use zeroize::Zeroize;

use crate::errors::Result;
use crate::types::Mpi;

/// DSA secret key material. Wiped on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct DsaSecretKey {
    pub x: BigUint,
}

/// The digest, truncated to the size of `q`, as an integer.
fn digest_to_int(q: &BigUint, digest: &[u8]) -> BigUint {
    let q_len = (q.bits() + 7) / 8;
    let take = digest.len().min(q_len);
    BigUint::from_bytes_be(&digest[..take])
}

/// Verify a DSA `(r, s)` signature over `digest`.
pub fn verify_dsa(
    p: &Mpi,
    q: &Mpi,
    g: &Mpi,
    y: &Mpi,
    digest: &[u8],
    r: &Mpi,
    s: &Mpi,
) -> Result<bool> {
    let (p, q, g, y) = (p.to_biguint(), q.to_biguint(), g.to_biguint(), y.to_biguint());
    let (r, s) = (r.to_biguint(), s.to_biguint());

    if r.is_zero() || r >= q || s.is_zero() || s >= q {
        return Ok(false);
    }

    let w = match (&s).mod_inverse(&q).and_then(|w| w.to_biguint()) {
        Some(w) => w,
        None => return Ok(false),
    };

    let z = digest_to_int(&q, digest);
    let u1 = (&z * &w) % &q;
    let u2 = (&r * &w) % &q;
    let v = ((g.modpow(&u1, &p) * y.modpow(&u2, &p)) % &p) % &q;

    Ok(v == r)
}

/// Produce a DSA `(r, s)` signature over `digest`.
pub fn sign_dsa<R: Rng + CryptoRng>(
    rng: &mut R,
    p: &Mpi,
    q: &Mpi,
    g: &Mpi,
    key: &DsaSecretKey,
    digest: &[u8],
) -> Result<(Mpi, Mpi)> {
    let (p, q, g) = (p.to_biguint(), q.to_biguint(), g.to_biguint());
    let z = digest_to_int(&q, digest);

    loop {
        let k = rng.gen_biguint_below(&q);
        if k.is_zero() {
            continue;
        }

        let r = g.modpow(&k, &p) % &q;
        if r.is_zero() {
            continue;
        }

        let k_inv = match (&k).mod_inverse(&q).and_then(|k| k.to_biguint()) {
            Some(k_inv) => k_inv,
            None => continue,
        };

        let s = (k_inv * (&z + &key.x * &r)) % &q;
        if s.is_zero() {
            continue;
        }

        return Ok((Mpi::from_biguint(&r), Mpi::from_biguint(&s)));
    }
}

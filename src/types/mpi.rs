use std::fmt;

use num_bigint::BigUint;

use crate::errors::Result;
use crate::util::{hex_fragment, write_be_u16};

/// Multiprecision integer: a 2-octet bit count followed by that many bits of
/// big-endian magnitude.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-3.2
#[derive(Clone, PartialEq, Eq)]
pub struct Mpi {
    bits: u16,
    bytes: Vec<u8>,
}

impl Mpi {
    /// Build an `Mpi` from a decoded bit count and magnitude.
    ///
    /// For plaintext MPIs the bit count must be exact: the most significant
    /// byte carries `((bits - 1) mod 8) + 1` significant bits, its top bit is
    /// set and the bits above it are clear. Encrypted MPIs carry a bit count
    /// that refers to the plaintext, so the checks do not apply to them.
    pub fn from_parts(bits: u16, bytes: Vec<u8>, encrypted: bool) -> Result<Self> {
        ensure_eq!(
            bytes.len(),
            (bits as usize + 7) / 8,
            "MPI length mismatch"
        );

        if !encrypted {
            ensure!(bits > 0, "MPI format error");
            // significant bits in the most significant byte, 1..=8
            let nonzero = ((u32::from(bits) - 1) % 8) + 1;
            let top = u32::from(bytes[0]);
            ensure!(
                (top >> nonzero) == 0 && (top & (1 << (nonzero - 1))) != 0,
                "MPI format error"
            );
        }

        Ok(Mpi { bits, bytes })
    }

    pub fn from_biguint(n: &BigUint) -> Self {
        let bits = n.bits() as u16;
        let bytes = if bits == 0 { Vec::new() } else { n.to_bytes_be() };

        Mpi { bits, bytes }
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// The magnitude, big-endian, without the bit-count prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.bytes)
    }

    /// Append the wire form (bit count, then magnitude).
    pub fn write(&self, buf: &mut Vec<u8>) {
        write_be_u16(buf, self.bits);
        buf.extend_from_slice(&self.bytes);
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(2 + self.bytes.len());
        self.write(&mut buf);
        buf
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mpi({} bits, {})", self.bits, hex_fragment(&self.bytes, 64))
    }
}

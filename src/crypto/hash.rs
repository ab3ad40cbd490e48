use digest::Digest;
use md5::Md5;
use num_derive::FromPrimitive;
use ripemd160::Ripemd160;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

/// Available hash algorithms.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-9.4
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum HashAlgorithm {
    MD5 = 1,
    SHA1 = 2,
    RIPEMD160 = 3,
    SHA256 = 8,
    SHA384 = 9,
    SHA512 = 10,
    SHA224 = 11,
}

impl HashAlgorithm {
    /// Digest size in bytes.
    pub fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::MD5 => 16,
            HashAlgorithm::SHA1 => 20,
            HashAlgorithm::RIPEMD160 => 20,
            HashAlgorithm::SHA256 => 32,
            HashAlgorithm::SHA384 => 48,
            HashAlgorithm::SHA512 => 64,
            HashAlgorithm::SHA224 => 28,
        }
    }

    pub fn new_hasher(self) -> Hasher {
        match self {
            HashAlgorithm::MD5 => Hasher::Md5(Md5::new()),
            HashAlgorithm::SHA1 => Hasher::Sha1(Sha1::new()),
            HashAlgorithm::RIPEMD160 => Hasher::Ripemd160(Ripemd160::new()),
            HashAlgorithm::SHA256 => Hasher::Sha256(Sha256::new()),
            HashAlgorithm::SHA384 => Hasher::Sha384(Sha384::new()),
            HashAlgorithm::SHA512 => Hasher::Sha512(Sha512::new()),
            HashAlgorithm::SHA224 => Hasher::Sha224(Sha224::new()),
        }
    }

    /// One-shot digest.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.new_hasher();
        hasher.update(data);
        hasher.finish()
    }
}

/// A running hash context.
pub enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Ripemd160(Ripemd160),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha224(Sha224),
}

impl Hasher {
    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            Hasher::Md5(_) => HashAlgorithm::MD5,
            Hasher::Sha1(_) => HashAlgorithm::SHA1,
            Hasher::Ripemd160(_) => HashAlgorithm::RIPEMD160,
            Hasher::Sha256(_) => HashAlgorithm::SHA256,
            Hasher::Sha384(_) => HashAlgorithm::SHA384,
            Hasher::Sha512(_) => HashAlgorithm::SHA512,
            Hasher::Sha224(_) => HashAlgorithm::SHA224,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha1(h) => h.update(data),
            Hasher::Ripemd160(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
            Hasher::Sha384(h) => h.update(data),
            Hasher::Sha512(h) => h.update(data),
            Hasher::Sha224(h) => h.update(data),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        match self {
            Hasher::Md5(h) => h.finalize().to_vec(),
            Hasher::Sha1(h) => h.finalize().to_vec(),
            Hasher::Ripemd160(h) => h.finalize().to_vec(),
            Hasher::Sha256(h) => h.finalize().to_vec(),
            Hasher::Sha384(h) => h.finalize().to_vec(),
            Hasher::Sha512(h) => h.finalize().to_vec(),
            Hasher::Sha224(h) => h.finalize().to_vec(),
        }
    }
}

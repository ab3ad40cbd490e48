pub mod dsa;
pub mod hash;
pub mod rsa;

pub use self::dsa::{sign_dsa, verify_dsa, DsaSecretKey};
pub use self::hash::{HashAlgorithm, Hasher};
pub use self::rsa::{sign_rsa, verify_rsa, RsaSecretKey};

use num_derive::FromPrimitive;

mod mpi;

pub use self::mpi::Mpi;

/// Packet content tags the core knows how to decode.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-4.3
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum Tag {
    Signature = 2,
    PublicKey = 6,
    UserId = 13,
    PublicSubkey = 14,
}

/// How the length of a packet was encoded on the wire.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LengthType {
    OneOctet,
    TwoOctet,
    FourOctet,
    /// Old format, length unknown; the packet extends to the end of the stream.
    Indeterminate,
    NewFormat,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum KeyVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum SignatureVersion {
    /// Deprecated
    V2 = 2,
    V3 = 3,
    V4 = 4,
}

/// Ref: https://tools.ietf.org/html/rfc4880.html#section-9.1
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum PublicKeyAlgorithm {
    /// RSA (Encrypt and Sign)
    RSA = 1,
    /// DEPRECATED: RSA (Encrypt-Only)
    RSAEncrypt = 2,
    /// DEPRECATED: RSA (Sign-Only)
    RSASign = 3,
    /// Elgamal (Encrypt-Only)
    Elgamal = 16,
    /// DSA (Digital Signature Algorithm)
    DSA = 17,
    /// Elliptic Curve Diffie-Hellman: RFC 6637
    ECDH = 18,
    /// ECDSA: RFC 6637
    ECDSA = 19,
    /// DEPRECATED: Elgamal (Encrypt or Sign)
    ElgamalLegacy = 20,
    /// Reserved for Diffie-Hellman (X9.42, as defined for IETF-S/MIME)
    DiffieHellman = 21,
    /// EdDSA (not yet assigned)
    EdDSA = 22,
}

/// Ref: https://tools.ietf.org/html/rfc4880.html#section-9.2
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    IDEA = 1,
    /// TripleDES (DES-EDE, 168 bit key derived from 192)
    TripleDES = 2,
    /// CAST5 (128 bit key, as per [RFC2144])
    CAST5 = 3,
    /// Blowfish (128 bit key, 16 rounds)
    Blowfish = 4,
    AES128 = 7,
    AES192 = 8,
    AES256 = 9,
    /// Twofish with 256-bit key [TWOFISH]
    Twofish = 10,
}

/// Ref: https://tools.ietf.org/html/rfc4880.html#section-9.3
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum CompressionAlgorithm {
    Uncompressed = 0,
    ZIP = 1,
    ZLIB = 2,
    BZip2 = 3,
}

/// Codes for revocation reasons.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3.23
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum RevocationCode {
    /// No reason specified (key revocations or cert revocations)
    NoReason = 0,
    /// Key is superseded (key revocations)
    KeySuperseded = 1,
    /// Key material has been compromised (key revocations)
    KeyCompromised = 2,
    /// Key is retired and no longer used (key revocations)
    KeyRetired = 3,
    /// User ID information is no longer valid (cert revocations)
    CertUserIdInvalid = 32,
}

/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.1
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document.
    Binary = 0x00,
    /// Signature of a canonical text document. The signature is calculated
    /// over the text data with its line endings converted to <CR><LF>.
    Text = 0x01,
    /// Standalone signature: a signature of only its own subpacket contents.
    Standalone = 0x02,
    /// Generic certification of a User ID and Public-Key packet.
    CertGeneric = 0x10,
    /// Persona certification of a User ID and Public-Key packet.
    CertPersona = 0x11,
    /// Casual certification of a User ID and Public-Key packet.
    CertCasual = 0x12,
    /// Positive certification of a User ID and Public-Key packet.
    CertPositive = 0x13,
    /// Subkey Binding Signature: a statement by the top-level signing key
    /// that it owns the subkey.
    SubkeyBinding = 0x18,
    /// Primary Key Binding Signature: a statement by a signing subkey that
    /// it is owned by the primary key.
    KeyBinding = 0x19,
    /// Signature calculated directly on a key.
    Key = 0x1F,
    /// Key revocation signature, calculated directly on the key being revoked.
    KeyRevocation = 0x20,
    /// Subkey revocation signature.
    SubkeyRevocation = 0x28,
    /// Certification revocation signature, revoking an earlier User ID
    /// certification or direct-key signature.
    CertRevocation = 0x30,
    /// Timestamp signature.
    Timestamp = 0x40,
    /// Third-Party Confirmation signature.
    ThirdParty = 0x50,
}

/// Signature subpacket types with a parsed representation.
/// Ref: https://tools.ietf.org/html/rfc4880.html#section-5.2.3.1
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum SubpacketType {
    SignatureCreationTime = 2,
    SignatureExpirationTime = 3,
    ExportableCertification = 4,
    TrustSignature = 5,
    RegularExpression = 6,
    Revocable = 7,
    KeyExpirationTime = 9,
    PreferredSymmetricAlgorithms = 11,
    RevocationKey = 12,
    Issuer = 16,
    NotationData = 20,
    PreferredHashAlgorithms = 21,
    PreferredCompressionAlgorithms = 22,
    KeyServerPreferences = 23,
    PreferredKeyServer = 24,
    PrimaryUserId = 25,
    PolicyUri = 26,
    KeyFlags = 27,
    SignersUserId = 28,
    RevocationReason = 29,
    Features = 30,
    SignatureTarget = 31,
    EmbeddedSignature = 32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_tag_from_u8() {
        assert_eq!(Tag::from_u8(2), Some(Tag::Signature));
        assert_eq!(Tag::from_u8(6), Some(Tag::PublicKey));
        assert_eq!(Tag::from_u8(13), Some(Tag::UserId));
        assert_eq!(Tag::from_u8(14), Some(Tag::PublicSubkey));
        assert_eq!(Tag::from_u8(5), None);
    }

    #[test]
    fn test_algorithm_values() {
        assert_eq!(PublicKeyAlgorithm::from_u8(1), Some(PublicKeyAlgorithm::RSA));
        assert_eq!(PublicKeyAlgorithm::from_u8(17), Some(PublicKeyAlgorithm::DSA));
        assert_eq!(
            PublicKeyAlgorithm::from_u8(16),
            Some(PublicKeyAlgorithm::Elgamal)
        );
        assert_eq!(PublicKeyAlgorithm::from_u8(99), None);
    }
}

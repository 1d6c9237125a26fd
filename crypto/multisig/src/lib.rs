//! BLS12-381 Aggregate Multisignatures for ISTHMUS heads
//!
//! Implements the N-of-N aggregate multisignature scheme the head protocol
//! relies on:
//! - Per-participant BLS signatures over blake3 message hashes
//! - Signature aggregation into a single combined signature
//! - Single-pairing verification against an aggregate public key
//!
//! Uses the `blst` library (industry standard, used by Ethereum 2.0).
//! Aggregation of public keys is commutative, so the aggregate key of a
//! participant set does not depend on the order the keys are supplied in.

use blst::min_pk::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature as BlsSignature};
use blst::BLST_ERROR;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Domain separation tag for head multisignatures
const DST_MULTISIG: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_ISTHMUS_HEAD_";

/// Errors from multisignature operations
#[derive(Error, Debug)]
pub enum MultisigError {
    /// Key bytes did not decode to a valid curve point
    #[error("Invalid verification key: {0}")]
    InvalidKey(String),

    /// Signature bytes did not decode to a valid curve point
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Aggregation over an empty key set
    #[error("Cannot aggregate an empty key set")]
    EmptyKeySet,

    /// Aggregation over an empty signature set
    #[error("Cannot combine an empty signature set")]
    EmptySignatureSet,

    /// blst aggregation failure
    #[error("Aggregation error: {0}")]
    Aggregation(String),
}

/// Result type for multisignature operations
pub type MultisigResult<T> = Result<T, MultisigError>;

/// Hash arbitrary bytes with blake3 (the protocol's only message hash)
pub fn hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple byte strings as one message
pub fn hash_many(inputs: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    *hasher.finalize().as_bytes()
}

/// A participant's secret signing key
///
/// Stores the 32-byte key seed; the BLS secret key is derived on demand so
/// the seed can be zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    seed: [u8; 32],
}

impl SigningKey {
    /// Generate a fresh signing key from system entropy
    pub fn generate() -> Self {
        let mut rng = ChaCha20Rng::from_entropy();
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self { seed }
    }

    /// Deterministic key from a fixed seed (tests, fixtures)
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    /// The corresponding verification key
    pub fn verification_key(&self) -> VerificationKey {
        VerificationKey {
            inner: self.secret_key().sk_to_pk(),
        }
    }

    /// Sign a 32-byte message hash
    pub fn sign(&self, message: &[u8; 32]) -> Signature {
        Signature {
            inner: self.secret_key().sign(message, DST_MULTISIG, &[]),
        }
    }

    fn secret_key(&self) -> SecretKey {
        // key_gen only fails for seed material shorter than 32 bytes
        SecretKey::key_gen(&self.seed, &[]).unwrap()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

/// A participant's public verification key (48-byte compressed G1 point)
#[derive(Clone)]
pub struct VerificationKey {
    inner: PublicKey,
}

impl VerificationKey {
    /// Serialize to compressed bytes
    pub fn to_bytes(&self) -> [u8; 48] {
        self.inner.to_bytes()
    }

    /// Deserialize from compressed bytes, validating the point
    pub fn from_bytes(bytes: &[u8; 48]) -> MultisigResult<Self> {
        let inner = PublicKey::from_bytes(bytes)
            .map_err(|e| MultisigError::InvalidKey(format!("{:?}", e)))?;
        inner
            .validate()
            .map_err(|e| MultisigError::InvalidKey(format!("{:?}", e)))?;
        Ok(Self { inner })
    }

    /// blake3 hash of the compressed key, used as the participant identity
    /// and as the deterministic participation-token name
    pub fn hash(&self) -> [u8; 32] {
        hash(&self.to_bytes())
    }

    fn inner(&self) -> &PublicKey {
        &self.inner
    }
}

impl PartialEq for VerificationKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for VerificationKey {}

impl PartialOrd for VerificationKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VerificationKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_bytes().cmp(&other.to_bytes())
    }
}

impl std::hash::Hash for VerificationKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl std::fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VerificationKey")
            .field(&hex::encode(&self.to_bytes()[..8]))
            .finish()
    }
}

impl Serialize for VerificationKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for VerificationKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        if bytes.len() != 48 {
            return Err(D::Error::custom("Invalid verification key length"));
        }
        let mut arr = [0u8; 48];
        arr.copy_from_slice(&bytes);
        VerificationKey::from_bytes(&arr).map_err(D::Error::custom)
    }
}

/// A single participant's signature (96-byte compressed G2 point)
#[derive(Clone)]
pub struct Signature {
    inner: BlsSignature,
}

impl Signature {
    /// Serialize to compressed bytes
    pub fn to_bytes(&self) -> [u8; 96] {
        self.inner.to_bytes()
    }

    /// Deserialize from compressed bytes
    pub fn from_bytes(bytes: &[u8; 96]) -> MultisigResult<Self> {
        let inner = BlsSignature::from_bytes(bytes)
            .map_err(|e| MultisigError::InvalidSignature(format!("{:?}", e)))?;
        Ok(Self { inner })
    }

    /// Verify against a single verification key
    pub fn verify(&self, message: &[u8; 32], key: &VerificationKey) -> bool {
        self.inner.verify(true, message, DST_MULTISIG, &[], key.inner(), true)
            == BLST_ERROR::BLST_SUCCESS
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signature")
            .field(&hex::encode(&self.to_bytes()[..8]))
            .finish()
    }
}

/// A combined signature standing in for all participants' signatures
///
/// One verification against the matching [`AggregateKey`] replaces N
/// individual checks.
#[derive(Clone, PartialEq, Eq)]
pub struct MultiSignature {
    bytes: [u8; 96],
}

impl MultiSignature {
    /// Combine individual signatures over the same message
    pub fn combine(signatures: &[Signature]) -> MultisigResult<Self> {
        let first = signatures.first().ok_or(MultisigError::EmptySignatureSet)?;
        let mut agg = AggregateSignature::from_signature(&first.inner);
        for sig in &signatures[1..] {
            agg.add_signature(&sig.inner, false)
                .map_err(|e| MultisigError::Aggregation(format!("{:?}", e)))?;
        }
        Ok(Self {
            bytes: agg.to_signature().to_bytes(),
        })
    }

    /// Serialize to compressed bytes
    pub fn to_bytes(&self) -> [u8; 96] {
        self.bytes
    }

    /// Deserialize from compressed bytes
    pub fn from_bytes(bytes: &[u8; 96]) -> MultisigResult<Self> {
        // Decode eagerly so malformed wire data is rejected at the boundary
        BlsSignature::from_bytes(bytes)
            .map_err(|e| MultisigError::InvalidSignature(format!("{:?}", e)))?;
        Ok(Self { bytes: *bytes })
    }

    fn to_signature(&self) -> MultisigResult<BlsSignature> {
        BlsSignature::from_bytes(&self.bytes)
            .map_err(|e| MultisigError::InvalidSignature(format!("{:?}", e)))
    }
}

impl std::fmt::Debug for MultiSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MultiSignature")
            .field(&hex::encode(&self.bytes[..8]))
            .finish()
    }
}

impl Serialize for MultiSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for MultiSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        if bytes.len() != 96 {
            return Err(D::Error::custom("Invalid multisignature length"));
        }
        let mut arr = [0u8; 96];
        arr.copy_from_slice(&bytes);
        MultiSignature::from_bytes(&arr).map_err(D::Error::custom)
    }
}

/// The aggregate public key of a participant set
#[derive(Clone)]
pub struct AggregateKey {
    inner: PublicKey,
}

impl AggregateKey {
    /// Aggregate a set of verification keys
    ///
    /// Point addition is commutative, so any ordering of the same key set
    /// produces the same aggregate key.
    pub fn aggregate(keys: &[VerificationKey]) -> MultisigResult<Self> {
        if keys.is_empty() {
            return Err(MultisigError::EmptyKeySet);
        }
        let refs: Vec<&PublicKey> = keys.iter().map(|k| k.inner()).collect();
        let agg = AggregatePublicKey::aggregate(&refs, false)
            .map_err(|e| MultisigError::Aggregation(format!("{:?}", e)))?;
        Ok(Self {
            inner: agg.to_public_key(),
        })
    }

    /// Verify a combined signature with a single pairing check
    pub fn verify(&self, message: &[u8; 32], signature: &MultiSignature) -> bool {
        let sig = match signature.to_signature() {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        sig.verify(true, message, DST_MULTISIG, &[], &self.inner, true) == BLST_ERROR::BLST_SUCCESS
    }

    /// Serialize to compressed bytes
    pub fn to_bytes(&self) -> [u8; 48] {
        self.inner.to_bytes()
    }

    /// Deserialize from compressed bytes
    pub fn from_bytes(bytes: &[u8; 48]) -> MultisigResult<Self> {
        let inner = PublicKey::from_bytes(bytes)
            .map_err(|e| MultisigError::InvalidKey(format!("{:?}", e)))?;
        Ok(Self { inner })
    }
}

impl PartialEq for AggregateKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for AggregateKey {}

impl std::fmt::Debug for AggregateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AggregateKey")
            .field(&hex::encode(&self.to_bytes()[..8]))
            .finish()
    }
}

impl Serialize for AggregateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> Deserialize<'de> for AggregateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        if bytes.len() != 48 {
            return Err(D::Error::custom("Invalid aggregate key length"));
        }
        let mut arr = [0u8; 48];
        arr.copy_from_slice(&bytes);
        AggregateKey::from_bytes(&arr).map_err(D::Error::custom)
    }
}

/// Have every key in a set sign the same message and combine the result
///
/// Convenience for the head's N-of-N flow; verification still goes through
/// [`AggregateKey::verify`].
pub fn sign_all(keys: &[SigningKey], message: &[u8; 32]) -> MultisigResult<MultiSignature> {
    let signatures: Vec<Signature> = keys.iter().map(|k| k.sign(message)).collect();
    MultiSignature::combine(&signatures)
}

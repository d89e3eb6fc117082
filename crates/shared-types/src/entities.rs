//! # Core Domain Entities
//!
//! Chain entities shared by the index store and the consensus subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `Address`
//! - **Chain**: `BlockHeader`, `Seal`, `Transaction`, `Block`
//!
//! Headers are immutable once built. The only way to obtain a `BlockHeader`
//! is through [`BlockHeader::try_new`], which checks every required field;
//! deserialisation is routed through the same factory.

use crate::errors::HeaderError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte Keccak-256 digest.
pub type Hash = [u8; 32];

/// A 32-byte account address.
pub type Address = [u8; 32];

/// The all-zero hash, used as the parent of genesis.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Length of a staking seed produced by the signature scheme in use before
/// the signature-scheme swap.
pub const SIGNATURE_SEED_LEN: usize = 64;

/// Length of a staking seed produced by the VRF scheme in use after the
/// signature-scheme swap.
pub const VRF_SEED_LEN: usize = 80;

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Kind of block producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SealType {
    /// Proof-of-Work block.
    Mining,
    /// Proof-of-Stake block.
    Staking,
}

impl std::fmt::Display for SealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SealType::Mining => write!(f, "mining"),
            SealType::Staking => write!(f, "staking"),
        }
    }
}

/// Seal-specific header fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seal {
    /// Proof-of-Work seal.
    Mining {
        nonce: [u8; 32],
        solution: Vec<u8>,
    },
    /// Proof-of-Stake seal.
    Staking {
        seed: Vec<u8>,
        signature: Vec<u8>,
        public_key: [u8; 32],
    },
}

impl Seal {
    /// Kind of producer that created this seal.
    pub fn seal_type(&self) -> SealType {
        match self {
            Seal::Mining { .. } => SealType::Mining,
            Seal::Staking { .. } => SealType::Staking,
        }
    }
}

/// Raw header fields, the input of [`BlockHeader::try_new`].
///
/// Also the serialised form of a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    pub number: u64,
    pub parent_hash: Hash,
    pub coinbase: Address,
    pub timestamp: u64,
    pub difficulty: U256,
    pub energy_limit: u64,
    pub energy_consumed: u64,
    pub extra_data: Vec<u8>,
    pub tx_trie_root: Hash,
    pub state_root: Hash,
    pub seal: Seal,
}

/// An immutable, validated block header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HeaderFields", into = "HeaderFields")]
pub struct BlockHeader {
    fields: HeaderFields,
    hash: Hash,
}

impl BlockHeader {
    /// Build a header, checking that every required field is present and
    /// internally consistent.
    pub fn try_new(fields: HeaderFields) -> Result<Self, HeaderError> {
        if fields.difficulty.is_zero() {
            return Err(HeaderError::ZeroDifficulty);
        }

        if fields.number == 0 && fields.parent_hash != ZERO_HASH {
            return Err(HeaderError::GenesisWithParent);
        }

        if fields.number > 0 && fields.parent_hash == ZERO_HASH {
            return Err(HeaderError::MissingParentHash {
                number: fields.number,
            });
        }

        if fields.energy_consumed > fields.energy_limit {
            return Err(HeaderError::EnergyConsumedExceedsLimit {
                consumed: fields.energy_consumed,
                limit: fields.energy_limit,
            });
        }

        match &fields.seal {
            Seal::Mining { solution, .. } if solution.is_empty() => {
                return Err(HeaderError::MissingSealField("solution"));
            }
            Seal::Staking { seed, .. } if seed.is_empty() => {
                return Err(HeaderError::MissingSealField("seed"));
            }
            Seal::Staking { signature, .. } if signature.is_empty() => {
                return Err(HeaderError::MissingSealField("signature"));
            }
            _ => {}
        }

        let hash = Self::compute_hash(&fields);
        Ok(Self { fields, hash })
    }

    fn compute_hash(fields: &HeaderFields) -> Hash {
        let mut hasher = Keccak256::new();
        hasher.update(fields.number.to_be_bytes());
        hasher.update(fields.parent_hash);
        hasher.update(fields.coinbase);
        hasher.update(fields.timestamp.to_be_bytes());
        let mut difficulty = [0u8; 32];
        fields.difficulty.to_big_endian(&mut difficulty);
        hasher.update(difficulty);
        hasher.update(fields.energy_limit.to_be_bytes());
        hasher.update(fields.energy_consumed.to_be_bytes());
        hasher.update((fields.extra_data.len() as u64).to_be_bytes());
        hasher.update(&fields.extra_data);
        hasher.update(fields.tx_trie_root);
        hasher.update(fields.state_root);
        match &fields.seal {
            Seal::Mining { nonce, solution } => {
                hasher.update([0u8]);
                hasher.update(nonce);
                hasher.update(solution);
            }
            Seal::Staking {
                seed,
                signature,
                public_key,
            } => {
                hasher.update([1u8]);
                hasher.update((seed.len() as u64).to_be_bytes());
                hasher.update(seed);
                hasher.update(signature);
                hasher.update(public_key);
            }
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hasher.finalize());
        hash
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn number(&self) -> u64 {
        self.fields.number
    }

    pub fn parent_hash(&self) -> Hash {
        self.fields.parent_hash
    }

    pub fn coinbase(&self) -> Address {
        self.fields.coinbase
    }

    pub fn timestamp(&self) -> u64 {
        self.fields.timestamp
    }

    pub fn difficulty(&self) -> U256 {
        self.fields.difficulty
    }

    pub fn energy_limit(&self) -> u64 {
        self.fields.energy_limit
    }

    pub fn energy_consumed(&self) -> u64 {
        self.fields.energy_consumed
    }

    pub fn extra_data(&self) -> &[u8] {
        &self.fields.extra_data
    }

    pub fn tx_trie_root(&self) -> Hash {
        self.fields.tx_trie_root
    }

    pub fn state_root(&self) -> Hash {
        self.fields.state_root
    }

    pub fn seal(&self) -> &Seal {
        &self.fields.seal
    }

    pub fn seal_type(&self) -> SealType {
        self.fields.seal.seal_type()
    }

    /// Check if this is a genesis header
    pub fn is_genesis(&self) -> bool {
        self.fields.number == 0
    }

    /// Borrow the raw fields, e.g. to derive a modified copy.
    pub fn fields(&self) -> &HeaderFields {
        &self.fields
    }
}

impl TryFrom<HeaderFields> for BlockHeader {
    type Error = HeaderError;

    fn try_from(fields: HeaderFields) -> Result<Self, Self::Error> {
        Self::try_new(fields)
    }
}

impl From<BlockHeader> for HeaderFields {
    fn from(header: BlockHeader) -> Self {
        header.fields
    }
}

/// A transaction as carried inside a block.
///
/// The execution layer interprets `data`; the consensus core only needs the
/// identity and the energy bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: Hash,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub nonce: u64,
    pub energy_limit: u64,
    pub data: Vec<u8>,
}

impl Transaction {
    /// Create a transaction, deriving its hash from the content.
    pub fn new(
        from: Address,
        to: Option<Address>,
        value: U256,
        nonce: u64,
        energy_limit: u64,
        data: Vec<u8>,
    ) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(from);
        match to {
            Some(addr) => {
                hasher.update([1u8]);
                hasher.update(addr);
            }
            None => hasher.update([0u8]),
        }
        let mut value_bytes = [0u8; 32];
        value.to_big_endian(&mut value_bytes);
        hasher.update(value_bytes);
        hasher.update(nonce.to_be_bytes());
        hasher.update(energy_limit.to_be_bytes());
        hasher.update(&data);

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&hasher.finalize());

        Self {
            hash,
            from,
            to,
            value,
            nonce,
            energy_limit,
            data,
        }
    }
}

/// A block received for import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
        Self {
            header,
            transactions,
        }
    }

    /// Get the hash of this block
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn number(&self) -> u64 {
        self.header.number()
    }
}

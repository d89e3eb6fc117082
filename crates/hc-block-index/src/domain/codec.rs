//! # Record Codec
//!
//! Key layout and level-record encoding.
//!
//! A level record is an RLP list of `[hash, cumulative_difficulty,
//! is_main_chain]` lists. List position is the first-seen order of the
//! blocks at that level and is the tie-break for equal cumulative
//! difficulty, so encoders must preserve it.
//!
//! ```text
//! i:<u64 BE>   -> RLP level record
//! h:<hash>     -> crc32 BE || serialised header
//! m:size       -> u64 BE, number of levels
//! m:best       -> 32-byte best block hash
//! ```

use crate::domain::entities::BlockInfo;
use crate::domain::errors::SerializationError;
use primitive_types::H256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use shared_types::Hash;

/// Prefix for level records.
pub const LEVEL_PREFIX: &[u8] = b"i:";
/// Prefix for header records.
pub const HEADER_PREFIX: &[u8] = b"h:";
/// Key holding the number of levels.
pub const SIZE_KEY: &[u8] = b"m:size";
/// Key holding the best block hash.
pub const BEST_KEY: &[u8] = b"m:best";

/// Key of the record for `level`.
pub fn level_key(level: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(LEVEL_PREFIX.len() + 8);
    key.extend_from_slice(LEVEL_PREFIX);
    key.extend_from_slice(&level.to_be_bytes());
    key
}

/// Parse a level key back into its level number.
pub fn parse_level_key(key: &[u8]) -> Option<u64> {
    let rest = key.strip_prefix(LEVEL_PREFIX)?;
    let bytes: [u8; 8] = rest.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Key of the header record for `hash`.
pub fn header_key(hash: &Hash) -> Vec<u8> {
    let mut key = Vec::with_capacity(HEADER_PREFIX.len() + 32);
    key.extend_from_slice(HEADER_PREFIX);
    key.extend_from_slice(hash);
    key
}

impl Encodable for BlockInfo {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&H256::from(self.hash));
        s.append(&self.cumulative_difficulty);
        s.append(&self.is_main_chain);
    }
}

impl Decodable for BlockInfo {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        let hash: H256 = rlp.val_at(0)?;
        Ok(Self {
            hash: hash.0,
            cumulative_difficulty: rlp.val_at(1)?,
            is_main_chain: rlp.val_at(2)?,
        })
    }
}

/// Encode a level record, preserving order.
pub fn encode_level(infos: &[BlockInfo]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(infos.len());
    for info in infos {
        stream.append(info);
    }
    stream.out().to_vec()
}

/// Decode a level record.
pub fn decode_level(bytes: &[u8]) -> Result<Vec<BlockInfo>, SerializationError> {
    let rlp = Rlp::new(bytes);
    if !rlp.is_list() {
        return Err(SerializationError::new(
            "level record",
            "record must be an RLP list",
        ));
    }
    rlp.as_list()
        .map_err(|e| SerializationError::new("level record", format!("{:?}", e)))
}

/// Encode a u64 metadata value.
pub fn encode_u64(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decode a u64 metadata value.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, SerializationError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| SerializationError::new("u64 metadata", format!("{} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// Decode a hash metadata value.
pub fn decode_hash(bytes: &[u8]) -> Result<Hash, SerializationError> {
    bytes
        .try_into()
        .map_err(|_| SerializationError::new("hash metadata", format!("{} bytes", bytes.len())))
}

/// Prefix a serialised header with its CRC32 checksum.
pub fn seal_header_record(payload: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(4 + payload.len());
    record.extend_from_slice(&crc32fast::hash(payload).to_be_bytes());
    record.extend_from_slice(payload);
    record
}

/// Split a header record into `(stored_checksum, computed_checksum, payload)`.
pub fn open_header_record(record: &[u8]) -> Result<(u32, u32, &[u8]), SerializationError> {
    if record.len() < 4 {
        return Err(SerializationError::new(
            "header record",
            format!("record too short: {} bytes", record.len()),
        ));
    }
    let (checksum, payload) = record.split_at(4);
    let mut arr = [0u8; 4];
    arr.copy_from_slice(checksum);
    Ok((u32::from_be_bytes(arr), crc32fast::hash(payload), payload))
}

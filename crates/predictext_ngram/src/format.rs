//! On-disk n-gram trie layout.
//!
//! ```text
//! header:  maxOrder: i32
//! root:    childrenBlockPosition: i64
//!          childrenCount: i32
//!          frequency: f32
//!          childrenBackoffWeight: f32
//!          [count: i32]                 (dynamic flavor only)
//! blocks:  per parent, childrenCount contiguous records sorted by word id:
//!          wordId: i32
//!          frequency: f32
//!          childrenBackoffWeight: f32
//!          childrenBlockPosition: i64
//!          childrenCount: i32
//!          [count: i32]                 (dynamic flavor only)
//! ```
//!
//! Integers little-endian, floats IEEE-754. A childless node encodes
//! `childrenBlockPosition = -1, childrenCount = 0`. The static flavor is
//! what training ships; the dynamic flavor persists counts so a user model
//! can be reopened for further training.

use predictext_base::{PredictError, Result, WordId};

pub const HEADER_LEN: usize = 4;
pub const NO_BLOCK: i64 = -1;

/// Whether records carry the training count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieFlavor {
    Static,
    Dynamic,
}

impl TrieFlavor {
    pub fn record_len(self) -> usize {
        match self {
            TrieFlavor::Static => 24,
            TrieFlavor::Dynamic => 28,
        }
    }

    pub fn root_len(self) -> usize {
        match self {
            TrieFlavor::Static => 20,
            TrieFlavor::Dynamic => 24,
        }
    }
}

/// One decoded child record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeRecord {
    pub word_id: WordId,
    pub frequency: f32,
    pub backoff_weight: f32,
    pub block_position: i64,
    pub children_count: i32,
    pub count: i32,
}

/// The decoded root record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootRecord {
    pub block_position: i64,
    pub children_count: i32,
    pub frequency: f32,
    pub backoff_weight: f32,
    pub count: i32,
}

pub fn encode_header(max_order: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&(max_order as i32).to_le_bytes());
}

pub fn decode_header(bytes: &[u8]) -> Result<usize> {
    let raw = read_i32(bytes, 0)?;
    if raw < 1 {
        return Err(PredictError::Decode(format!(
            "n-gram file declares max order {}",
            raw
        )));
    }
    Ok(raw as usize)
}

pub fn encode_root(root: &RootRecord, flavor: TrieFlavor, out: &mut Vec<u8>) {
    out.extend_from_slice(&root.block_position.to_le_bytes());
    out.extend_from_slice(&root.children_count.to_le_bytes());
    out.extend_from_slice(&root.frequency.to_le_bytes());
    out.extend_from_slice(&root.backoff_weight.to_le_bytes());
    if flavor == TrieFlavor::Dynamic {
        out.extend_from_slice(&root.count.to_le_bytes());
    }
}

pub fn decode_root(bytes: &[u8], flavor: TrieFlavor) -> Result<RootRecord> {
    Ok(RootRecord {
        block_position: read_i64(bytes, HEADER_LEN)?,
        children_count: read_i32(bytes, HEADER_LEN + 8)?,
        frequency: read_f32(bytes, HEADER_LEN + 12)?,
        backoff_weight: read_f32(bytes, HEADER_LEN + 16)?,
        count: match flavor {
            TrieFlavor::Static => 0,
            TrieFlavor::Dynamic => read_i32(bytes, HEADER_LEN + 20)?,
        },
    })
}

pub fn encode_record(record: &NodeRecord, flavor: TrieFlavor, out: &mut Vec<u8>) {
    out.extend_from_slice(&record.word_id.to_le_bytes());
    out.extend_from_slice(&record.frequency.to_le_bytes());
    out.extend_from_slice(&record.backoff_weight.to_le_bytes());
    out.extend_from_slice(&record.block_position.to_le_bytes());
    out.extend_from_slice(&record.children_count.to_le_bytes());
    if flavor == TrieFlavor::Dynamic {
        out.extend_from_slice(&record.count.to_le_bytes());
    }
}

/// Decodes the record starting at `offset`.
pub fn decode_record(bytes: &[u8], offset: usize, flavor: TrieFlavor) -> Result<NodeRecord> {
    Ok(NodeRecord {
        word_id: read_i32(bytes, offset)?,
        frequency: read_f32(bytes, offset + 4)?,
        backoff_weight: read_f32(bytes, offset + 8)?,
        block_position: read_i64(bytes, offset + 12)?,
        children_count: read_i32(bytes, offset + 20)?,
        count: match flavor {
            TrieFlavor::Static => 0,
            TrieFlavor::Dynamic => read_i32(bytes, offset + 24)?,
        },
    })
}

/// The word id of the record at `index` inside the block at `block_offset`,
/// without decoding the rest; this is what the in-block binary search reads.
pub fn record_word_id(
    bytes: &[u8],
    block_offset: usize,
    index: usize,
    flavor: TrieFlavor,
) -> Result<WordId> {
    read_i32(bytes, block_offset + index * flavor.record_len())
}

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    bytes
        .get(offset..offset + len)
        .ok_or_else(|| PredictError::Decode("truncated n-gram record".into()))
}

fn read_i32(bytes: &[u8], offset: usize) -> Result<i32> {
    Ok(i32::from_le_bytes(
        slice(bytes, offset, 4)?.try_into().expect("slice is 4 bytes"),
    ))
}

fn read_i64(bytes: &[u8], offset: usize) -> Result<i64> {
    Ok(i64::from_le_bytes(
        slice(bytes, offset, 8)?.try_into().expect("slice is 8 bytes"),
    ))
}

fn read_f32(bytes: &[u8], offset: usize) -> Result<f32> {
    Ok(f32::from_le_bytes(
        slice(bytes, offset, 4)?.try_into().expect("slice is 4 bytes"),
    ))
}

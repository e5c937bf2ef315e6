//! LBSM container and chunk parsing.
//!
//! The container is a small glTF-binary style frame:
//!
//! ```text
//! offset 0:  magic        "LBSM"
//! offset 4:  version      u32
//! offset 8:  totalLength  u32, byte length of the container including this header
//! offset 12: chunks       { chunkSize: u32, chunkType: [u8; 4] NUL-padded, payload }
//! ```
//!
//! Chunks are read while the cursor is below `totalLength`. The last `JSON`
//! chunk carries the scene document and the last `BIN` chunk the binary blob;
//! any other tag is skipped.

mod reader;

pub use reader::ByteReader;

use crate::error::{LbsmError, Result};

/// Container magic.
pub const MAGIC: &[u8; 4] = b"LBSM";

/// Size of the magic/version/length header.
pub const HEADER_SIZE: usize = 12;

/// Size of a chunk's length/type prefix.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// A chunk type tag, NUL-padded to four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

impl ChunkType {
    pub const JSON: ChunkType = ChunkType(*b"JSON");
    pub const BIN: ChunkType = ChunkType(*b"BIN\0");

    /// The tag up to its first NUL byte.
    pub fn tag(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(4);
        &self.0[..end]
    }

    pub fn is_json(&self) -> bool {
        self.tag() == b"JSON"
    }

    pub fn is_bin(&self) -> bool {
        self.tag() == b"BIN"
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.tag()))
    }
}

/// A typed, length-prefixed record borrowed from the container bytes.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Offset of the chunk header from the start of the container.
    pub offset: usize,
    pub chunk_type: ChunkType,
    pub payload: &'a [u8],
}

/// A parsed container: header fields plus every chunk in file order.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    pub version: u32,
    pub total_length: u32,
    pub chunks: Vec<Chunk<'a>>,
}

impl<'a> Container<'a> {
    /// The last `JSON` chunk, if any.
    pub fn json_chunk(&self) -> Option<&Chunk<'a>> {
        self.chunks.iter().rev().find(|c| c.chunk_type.is_json())
    }

    /// The scene document text of the last `JSON` chunk.
    pub fn json(&self) -> Result<&'a str> {
        let chunk = self.json_chunk().ok_or(LbsmError::MissingChunk("JSON"))?;
        Ok(std::str::from_utf8(chunk.payload)?)
    }

    /// The payload of the last `BIN` chunk, if any.
    pub fn binary(&self) -> Option<&'a [u8]> {
        self.chunks
            .iter()
            .rev()
            .find(|c| c.chunk_type.is_bin())
            .map(|c| c.payload)
    }

    /// Bytes of chunk data consumed, headers included.
    pub fn chunk_bytes(&self) -> usize {
        self.chunks
            .iter()
            .map(|c| CHUNK_HEADER_SIZE + c.payload.len())
            .sum()
    }
}

/// Parse the container header and split it into chunks.
pub fn parse_container(bytes: &[u8]) -> Result<Container<'_>> {
    let mut header = ByteReader::new(bytes);
    let magic: [u8; 4] = header.read_array()?;
    if &magic != MAGIC {
        return Err(LbsmError::InvalidMagic(magic));
    }
    let version = header.read_u32()?;
    let total_length = header.read_u32()?;
    tracing::debug!(version, total_length, "parsing LBSM container");

    let end = (total_length as usize).max(HEADER_SIZE);
    if end > bytes.len() {
        return Err(LbsmError::TruncatedData {
            offset: 0,
            needed: end,
            available: bytes.len(),
        });
    }

    // Reads are bounded by the declared length, so a chunk crossing it is truncated.
    let mut reader = ByteReader::new(&bytes[..end]);
    reader.skip(HEADER_SIZE)?;

    let mut chunks = Vec::new();
    while reader.position() < end {
        let offset = reader.position();
        let chunk_size = reader.read_u32()? as usize;
        let chunk_type = ChunkType(reader.read_array()?);
        let payload = reader.read_bytes(chunk_size)?;

        if !chunk_type.is_json() && !chunk_type.is_bin() {
            tracing::debug!(%chunk_type, offset, chunk_size, "skipping unknown chunk");
        }
        chunks.push(Chunk {
            offset,
            chunk_type,
            payload,
        });
    }

    Ok(Container {
        version,
        total_length,
        chunks,
    })
}

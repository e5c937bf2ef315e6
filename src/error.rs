//! Error types for LBSM decoding.

use thiserror::Error;

/// Result type alias using LbsmError.
pub type Result<T> = std::result::Result<T, LbsmError>;

/// Main error type for container, document and assembly failures.
#[derive(Error, Debug)]
pub enum LbsmError {
    /// The first four bytes are not the `LBSM` tag.
    #[error("Invalid magic: expected \"LBSM\", found {0:?}")]
    InvalidMagic([u8; 4]),

    /// A header, chunk or payload would read past the end of the data.
    #[error("Truncated data: needed {needed} bytes at offset {offset}, {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A required chunk is missing from the container.
    #[error("Missing {0} chunk")]
    MissingChunk(&'static str),

    /// The JSON chunk is not valid UTF-8.
    #[error("JSON chunk is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// The scene document is malformed, lacks a required field or has a mistyped one.
    #[error("Schema error at {path}: {message}")]
    Schema { path: String, message: String },

    /// An index or name does not refer to an existing record or byte range.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Index stride other than 2 or 4 bytes, or a morph target on a non-16-bit mesh.
    #[error("Unsupported index format: {0}")]
    UnsupportedIndexFormat(String),

    /// Submesh draw counts do not cover the index buffer exactly.
    #[error("Submesh ranges consume {consumed} indices but the mesh has {index_count}")]
    SubMeshRangeMismatch { consumed: usize, index_count: usize },

    /// A vertex stream's byte length disagrees with its layout.
    #[error("Vertex stream {stream} has {actual} bytes, expected {expected}")]
    VertexStreamSizeMismatch {
        stream: usize,
        expected: usize,
        actual: usize,
    },

    /// An attribute needs conversion but is stored in a format that cannot be rewritten.
    #[error("Unsupported vertex format: {0}")]
    UnsupportedVertexFormat(String),

    /// A morph target's index and position buffers describe different entry counts.
    #[error("Morph target '{name}' has {indices} indices but {positions} positions")]
    MorphTargetSizeMismatch {
        name: String,
        indices: usize,
        positions: usize,
    },

    /// A declared count is too large to allocate.
    #[error("Capacity overflow: {0}")]
    CapacityOverflow(String),

    /// The bone parent relation is not a forest.
    #[error("Bone hierarchy cycle detected at bone {0}")]
    CycleDetected(usize),

    /// The declared axis system matches none of the known presets.
    #[error("Unsupported coordinate system: {0}")]
    UnsupportedCoordinateSystem(String),

    /// The image collaborator failed to decode texture bytes.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl LbsmError {
    pub(crate) fn schema(path: impl Into<String>, message: impl Into<String>) -> Self {
        LbsmError::Schema {
            path: path.into(),
            message: message.into(),
        }
    }
}

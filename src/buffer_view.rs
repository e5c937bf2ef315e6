//! Buffer-view resolution against the binary blob.

use crate::document::{BufferView, BufferViewRef, SceneDocument};
use crate::error::{LbsmError, Result};

/// A resolved buffer view: its absolute offset in the blob and the borrowed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange<'a> {
    pub offset: usize,
    pub bytes: &'a [u8],
}

impl<'a> ByteRange<'a> {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Resolves [`BufferViewRef`]s of one document into ranges of one blob.
///
/// Resolved ranges borrow only the blob (`'a`), not the document (`'d`).
#[derive(Debug, Clone, Copy)]
pub struct BufferViewResolver<'d, 'a> {
    views: &'d [BufferView],
    blob: &'a [u8],
    allow_names: bool,
}

impl<'d, 'a> BufferViewResolver<'d, 'a> {
    /// `blob` is empty when the container carries no `BIN` chunk.
    pub fn new(doc: &'d SceneDocument, blob: &'a [u8], allow_names: bool) -> Self {
        Self {
            views: &doc.buffer_views,
            blob,
            allow_names,
        }
    }

    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }

    pub fn resolve(&self, reference: &BufferViewRef) -> Result<ByteRange<'a>> {
        match reference {
            BufferViewRef::Index(index) => self.resolve_index(*index),
            BufferViewRef::Name(name) => self.resolve_name(name),
        }
    }

    /// Resolve by ordinal into `bufferViews`.
    pub fn resolve_index(&self, index: usize) -> Result<ByteRange<'a>> {
        let view = self.views.get(index).ok_or_else(|| {
            LbsmError::InvalidReference(format!(
                "buffer view {} out of range ({} views)",
                index,
                self.views.len()
            ))
        })?;
        self.slice(view)
    }

    /// Compatibility lookup by view name; the first view with the name wins.
    pub fn resolve_name(&self, name: &str) -> Result<ByteRange<'a>> {
        if !self.allow_names {
            return Err(LbsmError::InvalidReference(format!(
                "buffer view '{}' referenced by name, but name references are disabled",
                name
            )));
        }
        tracing::warn!(name, "resolving buffer view by name (deprecated)");
        let view = self
            .views
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| LbsmError::InvalidReference(format!("no buffer view named '{}'", name)))?;
        self.slice(view)
    }

    fn slice(&self, view: &BufferView) -> Result<ByteRange<'a>> {
        let end = view
            .byte_offset
            .checked_add(view.byte_length)
            .filter(|&end| end <= self.blob.len())
            .ok_or_else(|| {
                LbsmError::InvalidReference(format!(
                    "buffer view '{}' [{}, +{}) exceeds binary blob of {} bytes",
                    view.name,
                    view.byte_offset,
                    view.byte_length,
                    self.blob.len()
                ))
            })?;
        Ok(ByteRange {
            offset: view.byte_offset,
            bytes: &self.blob[view.byte_offset..end],
        })
    }
}

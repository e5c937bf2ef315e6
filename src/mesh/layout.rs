//! Vertex layout derived from stream attribute lists.

use crate::document::{VertexFormat, VertexSemantic, VertexStream};
use serde::Serialize;

/// Where one attribute lives: its stream and byte offset within a vertex of that stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VertexAttributeDescriptor {
    pub semantic: VertexSemantic,
    pub format: VertexFormat,
    pub dimension: usize,
    pub stream: usize,
    pub offset: usize,
}

impl VertexAttributeDescriptor {
    pub fn byte_size(&self) -> usize {
        self.format.size() * self.dimension
    }
}

/// Attribute descriptors across all streams plus each stream's stride.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttributeDescriptor>,
    pub strides: Vec<usize>,
}

impl VertexLayout {
    /// Concatenate every stream's attributes in declaration order.
    pub fn from_streams(streams: &[VertexStream]) -> Self {
        let mut layout = VertexLayout::default();
        for (stream, declared) in streams.iter().enumerate() {
            let mut offset = 0;
            for attribute in &declared.attributes {
                layout.attributes.push(VertexAttributeDescriptor {
                    semantic: attribute.semantic,
                    format: attribute.format,
                    dimension: attribute.dimension,
                    stream,
                    offset,
                });
                offset += attribute.byte_size();
            }
            layout.strides.push(offset);
        }
        layout
    }

    pub fn stream_count(&self) -> usize {
        self.strides.len()
    }

    pub fn find(&self, semantic: VertexSemantic) -> Option<&VertexAttributeDescriptor> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    /// Attributes stored in `stream`.
    pub fn stream_attributes(
        &self,
        stream: usize,
    ) -> impl Iterator<Item = &VertexAttributeDescriptor> + '_ {
        self.attributes.iter().filter(move |a| a.stream == stream)
    }
}

//! Builders for containers and scene documents used by the unit tests.

use serde_json::{json, Value};

/// Assembles an LBSM container the way the Blender exporter writes it.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    version: u32,
    chunks: Vec<([u8; 4], Vec<u8>)>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            version: 1,
            chunks: Vec::new(),
        }
    }

    pub fn chunk(mut self, tag: &[u8; 4], payload: impl Into<Vec<u8>>) -> Self {
        self.chunks.push((*tag, payload.into()));
        self
    }

    pub fn json(self, doc: &Value) -> Self {
        let text = serde_json::to_string(doc).unwrap();
        self.chunk(b"JSON", text.into_bytes())
    }

    pub fn bin(self, blob: Vec<u8>) -> Self {
        self.chunk(b"BIN\0", blob)
    }

    /// Total length as the exporter computes it: header plus every chunk.
    pub fn total_length(&self) -> u32 {
        let chunks: usize = self.chunks.iter().map(|(_, data)| 8 + data.len()).sum();
        (12 + chunks) as u32
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_length(self.total_length())
    }

    pub fn build_with_length(&self, total_length: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"LBSM");
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&total_length.to_le_bytes());
        for (tag, data) in &self.chunks {
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(tag);
            out.extend_from_slice(data);
        }
        out
    }
}

/// Packs typed arrays into one blob and records a `bufferViews` entry per push.
#[derive(Debug, Default)]
pub struct BlobBuilder {
    pub data: Vec<u8>,
    pub views: Vec<Value>,
}

impl BlobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes and return the new view's index.
    pub fn push_bytes(&mut self, name: &str, bytes: &[u8]) -> usize {
        self.views.push(json!({
            "name": name,
            "byteOffset": self.data.len(),
            "byteLength": bytes.len(),
        }));
        self.data.extend_from_slice(bytes);
        self.views.len() - 1
    }

    pub fn push_f32(&mut self, name: &str, values: &[f32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_bytes(name, &bytes)
    }

    pub fn push_u16(&mut self, name: &str, values: &[u16]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_bytes(name, &bytes)
    }

    pub fn push_u32(&mut self, name: &str, values: &[u32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.push_bytes(name, &bytes)
    }
}

/// A document with the given buffer views and meshes and nothing else.
pub fn document(buffer_views: &[Value], meshes: Value) -> Value {
    json!({
        "asset": { "version": "1.0" },
        "bufferViews": buffer_views,
        "meshes": meshes,
    })
}

/// Interleaved position (f32x3) + tex0 (f32x2) vertex data.
pub fn position_uv_vertices(vertices: &[([f32; 3], [f32; 2])]) -> Vec<f32> {
    vertices
        .iter()
        .flat_map(|(p, uv)| p.iter().chain(uv.iter()).copied())
        .collect()
}

/// A stream declaration with position (f32x3) and tex0 (f32x2).
pub fn position_uv_stream(view: usize) -> Value {
    json!({
        "bufferView": view,
        "attributes": [
            { "semantic": "position", "format": "f32", "dimension": 3 },
            { "semantic": "tex0", "format": "f32", "dimension": 2 },
        ],
    })
}

pub fn read_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn read_u16s(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

//! Decoding of the scene document with field paths in errors.
//!
//! The document types derive `Deserialize`. Decoding goes through
//! `serde_path_to_error` so that a missing or mistyped field is reported as
//! e.g. `meshes[1].indices.stride`. The helpers below are the field-level
//! rules the derives refer to.

use super::{SceneDocument, VertexStream};
use crate::error::{LbsmError, Result};
use serde::de::{self, Deserialize, Deserializer, Unexpected};

/// Decode a scene document from the text of a `JSON` chunk.
pub fn decode_document(json: &str) -> Result<SceneDocument> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let doc: SceneDocument =
        serde_path_to_error::deserialize(&mut deserializer).map_err(schema_error)?;
    deserializer
        .end()
        .map_err(|e| LbsmError::schema("<root>", e.to_string()))?;
    Ok(doc)
}

fn schema_error(err: serde_path_to_error::Error<serde_json::Error>) -> LbsmError {
    let mut path = err.path().to_string();
    if path == "." {
        path.clear();
    }
    let message = err.into_inner().to_string();

    // A missing field is reported at its parent object; point at the field.
    if let Some(field) = missing_field(&message) {
        path = if path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", path, field)
        };
    }
    if path.is_empty() {
        path.push_str("<root>");
    }
    LbsmError::schema(path, message)
}

fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.split('`').next()
}

/// An index where `-1` or `null` means "none".
pub(crate) fn optional_index<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<i64>::deserialize(deserializer)? {
        None | Some(-1) => Ok(None),
        Some(n) => usize::try_from(n).map(Some).map_err(|_| {
            de::Error::invalid_value(Unexpected::Signed(n), &"a non-negative index or -1")
        }),
    }
}

/// Attribute component count, 1 to 4.
pub(crate) fn dimension<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let dimension = usize::deserialize(deserializer)?;
    if !(1..=4).contains(&dimension) {
        return Err(de::Error::custom(format!(
            "dimension {} is outside 1..=4",
            dimension
        )));
    }
    Ok(dimension)
}

/// Vertex streams of one mesh; a semantic may appear in only one of them, once.
pub(crate) fn vertex_streams<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<VertexStream>, D::Error>
where
    D: Deserializer<'de>,
{
    let streams = Vec::<VertexStream>::deserialize(deserializer)?;
    let mut seen = Vec::new();
    for attribute in streams.iter().flat_map(|stream| &stream.attributes) {
        if seen.contains(&attribute.semantic) {
            return Err(de::Error::custom(format!(
                "vertex semantic '{}' declared more than once",
                attribute.semantic
            )));
        }
        seen.push(attribute.semantic);
    }
    Ok(streams)
}

pub(crate) fn white() -> [f32; 4] {
    [1.0; 4]
}

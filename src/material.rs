//! Textures and materials.
//!
//! Textures are encoded images stored in the binary blob. They are resolved to
//! borrowed byte slices up front and only decoded on request through an
//! [`ImageDecoder`].

use crate::buffer_view::BufferViewResolver;
use crate::document::SceneDocument;
use crate::error::{LbsmError, Result};
use serde::Serialize;

/// An encoded texture borrowed from the blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor<'a> {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: &'a [u8],
}

impl<'a> TextureDescriptor<'a> {
    pub fn decode(&self, decoder: &dyn ImageDecoder) -> Result<DecodedImage> {
        decoder.decode(self.bytes, self.mime_type.as_deref())
    }
}

/// A material with its texture reference validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDescriptor {
    pub name: String,
    /// Base color, RGBA in `[0, 1]`.
    pub color: [f32; 4],
    /// Index into the scene's textures.
    pub color_texture: Option<usize>,
}

impl MaterialDescriptor {
    /// Base color quantized to 8 bits per channel.
    pub fn color_u8(&self) -> [u8; 4] {
        self.color
            .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    pub fn is_transparent(&self) -> bool {
        self.color[3] < 1.0
    }
}

/// RGBA8 pixels of a decoded texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixel data (4 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// True if any pixel has alpha below 255.
    pub fn has_alpha(&self) -> bool {
        self.pixels.chunks_exact(4).any(|pixel| pixel[3] < 255)
    }

    /// RGBA at (x, y), or `None` outside the image.
    pub fn rgba_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?
            .checked_mul(4)?;
        let pixel = self.pixels.get(start..start.checked_add(4)?)?;
        Some([pixel[0], pixel[1], pixel[2], pixel[3]])
    }
}

/// Turns encoded texture bytes into pixels.
pub trait ImageDecoder {
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> Result<DecodedImage>;
}

/// [`ImageDecoder`] backed by the `image` crate (PNG and JPEG).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8], mime_type: Option<&str>) -> Result<DecodedImage> {
        let img = match mime_type.and_then(image::ImageFormat::from_mime_type) {
            Some(format) => image::load_from_memory_with_format(bytes, format)?,
            None => image::load_from_memory(bytes)?,
        };
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(DecodedImage {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

/// Resolve every texture's bytes.
pub fn resolve_textures<'a>(
    doc: &SceneDocument,
    resolver: &BufferViewResolver<'_, 'a>,
) -> Result<Vec<TextureDescriptor<'a>>> {
    doc.textures
        .iter()
        .map(|texture| {
            let range = resolver.resolve(&texture.buffer_view)?;
            Ok(TextureDescriptor {
                name: texture.name.clone(),
                mime_type: texture.mime_type.clone(),
                bytes: range.bytes,
            })
        })
        .collect()
}

/// Validate material texture references.
pub fn resolve_materials(doc: &SceneDocument) -> Result<Vec<MaterialDescriptor>> {
    doc.materials
        .iter()
        .enumerate()
        .map(|(i, material)| {
            if let Some(texture) = material.color_texture {
                if texture >= doc.textures.len() {
                    return Err(LbsmError::InvalidReference(format!(
                        "material {} ('{}') uses texture {} of {}",
                        i,
                        material.name,
                        texture,
                        doc.textures.len()
                    )));
                }
            }
            Ok(MaterialDescriptor {
                name: material.name.clone(),
                color: material.color,
                color_texture: material.color_texture,
            })
        })
        .collect()
}

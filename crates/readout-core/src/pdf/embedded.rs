//! Renderer for scanned documents using lopdf.
//!
//! A scanned form is a page whose only content is one full-page image. This
//! renderer decodes that image and resamples it to `MediaBox * scale`, which
//! gives the same pixel grid a rasterizer would produce, without needing a
//! native PDF library.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{scaled_dimensions, PageRenderer, Result};
use crate::error::PdfError;

/// Parent chains longer than this are treated as broken.
const MAX_TREE_DEPTH: usize = 32;

/// Page renderer that resamples the page's embedded scan.
#[derive(Debug, Default)]
pub struct EmbeddedImageRenderer;

impl EmbeddedImageRenderer {
    /// Create a new embedded-image renderer.
    pub fn new() -> Self {
        Self
    }

    fn load(&self, data: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }

    /// Largest decodable image XObject on the page.
    fn page_scan(&self, doc: &Document, page_id: ObjectId) -> Option<DynamicImage> {
        let resources = inherited(doc, page_id, b"Resources")
            .and_then(|obj| doc.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_dict().ok())?;

        let xobjects = resources
            .get(b"XObject")
            .ok()
            .and_then(|obj| doc.dereference(obj).ok())
            .and_then(|(_, obj)| obj.as_dict().ok())?;

        xobjects
            .iter()
            .filter_map(|(_name, obj_ref)| doc.dereference(obj_ref).ok())
            .filter_map(|(_, obj)| decode_image(doc, obj))
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
    }
}

impl PageRenderer for EmbeddedImageRenderer {
    fn render_first_page(&mut self, path: &Path, scale: f32) -> Result<DynamicImage> {
        let data = std::fs::read(path)?;
        let doc = self.load(&data)?;

        let pages = doc.get_pages();
        let (&page_number, &page_id) = pages.iter().next().ok_or(PdfError::NoPages)?;
        debug!("Loaded PDF with {} pages, using page {}", pages.len(), page_number);

        let size = media_box_size(&doc, page_id)
            .ok_or_else(|| PdfError::Parse("first page has no usable MediaBox".to_string()))?;
        let (width, height) = scaled_dimensions(size, scale)?;

        let scan = self.page_scan(&doc, page_id).ok_or_else(|| {
            PdfError::NoImage(format!("page {} has no supported image XObject", page_number))
        })?;

        debug!(
            "Resampling {}x{} scan onto {}x{} pt page at scale {} -> {}x{}",
            scan.width(),
            scan.height(),
            size.0,
            size.1,
            scale,
            width,
            height
        );

        if (scan.width(), scan.height()) == (width, height) {
            return Ok(scan);
        }
        Ok(scan.resize_exact(width, height, FilterType::Triangle))
    }

    fn name(&self) -> &'static str {
        "embedded"
    }
}

/// Look up `key` on a page-tree node, walking up `Parent` links.
fn inherited<'a>(doc: &'a Document, node_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = node_id;

    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => return None,
        }
    }

    None
}

/// Page width and height in points.
fn media_box_size(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let media_box = inherited(doc, page_id, b"MediaBox")?;
    let (_, media_box) = doc.dereference(media_box).ok()?;
    let coords: Vec<f32> = media_box
        .as_array()
        .ok()?
        .iter()
        .filter_map(as_number)
        .collect();

    match coords.as_slice() {
        [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => None,
    }
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn name_of<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a [u8]> {
    match obj {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict: &Dictionary = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    trace!("Found image object: {}x{}", width, height);

    match dict.get(b"Filter").ok().and_then(|f| name_of(doc, f)) {
        Some(b"DCTDecode") => {
            trace!("Decoding JPEG image");
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter");
            return None;
        }
        _ => {}
    }

    // Unfiltered streams are raw samples; a filter that fails to decode
    // leaves nothing usable
    let data = if dict.has(b"Filter") {
        match stream.decompressed_content() {
            Ok(data) => data,
            Err(e) => {
                trace!("Cannot decode image stream: {}", e);
                return None;
            }
        }
    } else {
        stream.content.clone()
    };

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| name_of(doc, o))
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    raw_to_image(data, width, height, color_space)
}

fn raw_to_image(mut data: Vec<u8>, width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;

    match color_space {
        b"DeviceRGB" | b"RGB" => {
            let expected = pixels.checked_mul(3)?;
            if data.len() < expected {
                trace!("RGB data too short: {} < {}", data.len(), expected);
                return None;
            }
            data.truncate(expected);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" => {
            if data.len() < pixels {
                trace!("Gray data too short: {} < {}", data.len(), pixels);
                return None;
            }
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        other => {
            trace!("Unsupported color space: {}", String::from_utf8_lossy(other));
            None
        }
    }
}

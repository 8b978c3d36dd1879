//! Image-to-PDF conversion.
//!
//! Each source image becomes one output page, in list order. JPEG bytes are
//! embedded as-is behind `DCTDecode`; every other supported raster is
//! decoded and re-encoded as raw RGB behind `FlateDecode`. Images that fail
//! to decode are skipped and reported, not fatal to the batch.

use crate::artifact::OutputArtifact;
use crate::error::ToolError;
use crate::naming::IMAGES_NAME;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, GenericImageView, ImageFormat};
use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Output page geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm at 72 dpi.
    A4,
    /// 8.5 × 11 in at 72 dpi.
    Letter,
    /// Page dimensions equal the image's pixel dimensions; no scaling.
    Fit,
}

impl PageSize {
    /// Fixed page dimensions in points, or `None` for `Fit`.
    pub fn dimensions(&self) -> Option<(f32, f32)> {
        match self {
            PageSize::A4 => Some((595.28, 841.89)),
            PageSize::Letter => Some((612.0, 792.0)),
            PageSize::Fit => None,
        }
    }
}

/// One image file queued for conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Result of a conversion run.
pub struct ConvertOutcome {
    pub artifact: OutputArtifact,
    pub page_count: u32,
    /// Names of images that failed to decode and were skipped.
    pub skipped: Vec<String>,
}

/// An image decoded far enough to embed.
struct EmbeddedImage {
    width: u32,
    height: u32,
    stream: Stream,
}

/// Convert images to a single PDF, one page per image, in list order.
///
/// Fails only when nothing could be converted; individual decode failures
/// are collected into `skipped`.
pub fn images_to_pdf(
    images: &[ImageInput],
    page_size: PageSize,
) -> Result<ConvertOutcome, ToolError> {
    if images.is_empty() {
        return Err(ToolError::Transform("No images to convert".into()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    let mut skipped = Vec::new();

    for input in images {
        let embedded = match decode_image(&input.bytes) {
            Ok(embedded) => embedded,
            Err(ToolError::Resource(reason)) => {
                // Skip-and-continue: one bad image never aborts the batch
                skipped.push(format!("{}: {}", input.name, reason));
                continue;
            }
            Err(other) => return Err(other),
        };

        let page_id = append_image_page(&mut doc, pages_id, embedded, page_size)?;
        page_ids.push(page_id);
    }

    if page_ids.is_empty() {
        return Err(ToolError::Transform(
            "None of the images could be decoded".into(),
        ));
    }

    let page_count = page_ids.len() as u32;

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_count as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ToolError::Transform(format!("Failed to save PDF: {}", e)))?;

    Ok(ConvertOutcome {
        artifact: OutputArtifact::new(IMAGES_NAME, buffer),
        page_count,
        skipped,
    })
}

/// Decode image bytes into an embeddable XObject stream.
///
/// JPEG keeps its original bytes (`DCTDecode` is native JPEG); everything
/// else goes through a lossless re-encode to raw RGB8 + `FlateDecode`.
fn decode_image(bytes: &[u8]) -> Result<EmbeddedImage, ToolError> {
    let format =
        image::guess_format(bytes).map_err(|e| ToolError::Resource(e.to_string()))?;
    let img = image::load_from_memory(bytes).map_err(|e| ToolError::Resource(e.to_string()))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ToolError::Resource("Image has zero dimensions".into()));
    }

    let stream = if format == ImageFormat::Jpeg {
        let color_space: &[u8] = match img.color() {
            ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => b"DeviceGray",
            _ => b"DeviceRGB",
        };
        image_xobject(width, height, color_space, b"DCTDecode", bytes.to_vec())
    } else {
        let raw = img.to_rgb8().into_raw();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&raw)
            .map_err(|e| ToolError::Resource(format!("Re-encode failed: {}", e)))?;
        let compressed = encoder
            .finish()
            .map_err(|e| ToolError::Resource(format!("Re-encode failed: {}", e)))?;
        image_xobject(width, height, b"DeviceRGB", b"FlateDecode", compressed)
    };

    Ok(EmbeddedImage {
        width,
        height,
        stream,
    })
}

fn image_xobject(
    width: u32,
    height: u32,
    color_space: &[u8],
    filter: &[u8],
    content: Vec<u8>,
) -> Stream {
    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(filter.to_vec())),
    ]);
    // Content is already encoded; re-compressing would corrupt it
    Stream::new(dict, content).with_compression(false)
}

/// Build one page showing `embedded`, append it to the document, and return
/// its object ID.
fn append_image_page(
    doc: &mut Document,
    pages_id: lopdf::ObjectId,
    embedded: EmbeddedImage,
    page_size: PageSize,
) -> Result<lopdf::ObjectId, ToolError> {
    let (page_w, page_h, x, y, draw_w, draw_h) = match page_size.dimensions() {
        Some((page_w, page_h)) => {
            let (x, y, w, h) = fit_rect(embedded.width, embedded.height, page_w, page_h);
            (page_w, page_h, x, y, w, h)
        }
        None => {
            // Fit: the page is exactly the image
            let (w, h) = (embedded.width as f32, embedded.height as f32);
            (w, h, 0.0, 0.0, w, h)
        }
    };

    let xobject_id = doc.add_object(embedded.stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(draw_w),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(draw_h),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| ToolError::Transform(format!("Content encode failed: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let mut xobjects = Dictionary::new();
    xobjects.set("Im0", Object::Reference(xobject_id));
    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(page_w),
                Object::Real(page_h),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);

    Ok(doc.add_object(page))
}

/// Largest axis-aligned placement of a `img_w` × `img_h` image inside a
/// `page_w` × `page_h` page: uniform scale, centered on both axes.
fn fit_rect(img_w: u32, img_h: u32, page_w: f32, page_h: f32) -> (f32, f32, f32, f32) {
    let scale = (page_w / img_w as f32).min(page_h / img_h as f32);
    let draw_w = img_w as f32 * scale;
    let draw_h = img_h as f32 * scale;
    (
        (page_w - draw_w) / 2.0,
        (page_h - draw_h) / 2.0,
        draw_w,
        draw_h,
    )
}

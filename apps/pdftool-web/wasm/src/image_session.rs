//! Image-to-PDF session.
//!
//! Holds the ordered image list, per-item preview URLs, and the chosen page
//! geometry. Preview URLs are created lazily and revoked on removal or
//! reset, so repeated conversions never leak browser resources.

use crate::intake::{screen_file, CandidateFile, IntakePolicy, ToolKind};
use crate::preview::{create_object_url, revoke_object_url, PreviewId, PreviewRegistry};
use crate::session::DownloadArtifact;
use pdftool_core::{images_to_pdf, ImageInput, OrderedList, PageSize};
use wasm_bindgen::prelude::*;

/// Output page geometry choices shown in the UI.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageGeometry {
    A4,
    Letter,
    /// Page matches each image's pixel dimensions exactly
    Fit,
}

impl PageGeometry {
    fn to_core(self) -> PageSize {
        match self {
            PageGeometry::A4 => PageSize::A4,
            PageGeometry::Letter => PageSize::Letter,
            PageGeometry::Fit => PageSize::Fit,
        }
    }
}

/// One queued image.
struct ImageEntry {
    name: String,
    media_type: String,
    bytes: Vec<u8>,
    preview: Option<PreviewId>,
}

/// Stateful session for building one PDF out of ordered images.
#[wasm_bindgen]
pub struct ImageToPdfSession {
    policy: IntakePolicy,
    images: OrderedList<ImageEntry>,
    previews: PreviewRegistry,
    geometry: PageGeometry,
    last_skipped: Vec<String>,
    processing: bool,
}

impl ImageToPdfSession {
    fn existing_meta(&self) -> Vec<(String, usize)> {
        self.images
            .iter()
            .map(|e| (e.name.clone(), e.bytes.len()))
            .collect()
    }

    /// Add one image after policy screening. Decode problems surface later,
    /// at conversion time, as skipped entries.
    fn add_image_internal(
        &mut self,
        name: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<usize, String> {
        let candidate = CandidateFile {
            name: name.to_string(),
            media_type: media_type.to_string(),
            size_bytes: bytes.len(),
        };
        screen_file(&self.policy, &self.existing_meta(), &candidate).map_err(|e| e.to_string())?;

        self.images.push(ImageEntry {
            name: name.to_string(),
            media_type: media_type.to_string(),
            bytes: bytes.to_vec(),
            preview: None,
        });
        Ok(self.images.len() - 1)
    }

    /// Remove an image, returning its preview URL (if one was created) so
    /// the caller can revoke it.
    fn remove_image_internal(&mut self, index: usize) -> Result<Option<String>, String> {
        let entry = self.images.remove(index).map_err(|e| e.to_string())?;
        Ok(entry.preview.and_then(|id| self.previews.release(id)))
    }

    fn execute_internal(&mut self) -> Result<(DownloadArtifact, u32), String> {
        if self.processing {
            return Err("A conversion is already in progress".to_string());
        }
        if self.images.is_empty() {
            return Err("No images loaded".to_string());
        }

        self.processing = true;
        let inputs: Vec<ImageInput> = self
            .images
            .iter()
            .map(|e| ImageInput {
                name: e.name.clone(),
                bytes: e.bytes.clone(),
            })
            .collect();
        let result = images_to_pdf(&inputs, self.geometry.to_core());
        self.processing = false;

        match result {
            Ok(outcome) => {
                self.last_skipped = outcome.skipped;
                Ok((outcome.artifact.into(), outcome.page_count))
            }
            Err(e) => Err(e.to_string()),
        }
    }

    /// Clear all state, returning every live preview URL for revocation.
    fn reset_internal(&mut self) -> Vec<String> {
        self.images.clear();
        self.last_skipped.clear();
        self.processing = false;
        self.previews.release_all()
    }
}

#[wasm_bindgen]
impl ImageToPdfSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            policy: IntakePolicy::for_tool(ToolKind::ImageToPdf),
            images: OrderedList::new(),
            previews: PreviewRegistry::new(),
            geometry: PageGeometry::A4,
            last_skipped: Vec::new(),
            processing: false,
        }
    }

    /// Add an image; returns its position in the list.
    #[wasm_bindgen(js_name = addImage)]
    pub fn add_image(
        &mut self,
        name: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> Result<usize, JsValue> {
        self.add_image_internal(name, media_type, bytes)
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Remove an image and revoke its preview URL.
    #[wasm_bindgen(js_name = removeImage)]
    pub fn remove_image(&mut self, index: usize) -> Result<(), JsValue> {
        let released = self
            .remove_image_internal(index)
            .map_err(|e| JsValue::from_str(&e))?;
        if let Some(url) = released {
            revoke_object_url(&url);
        }
        Ok(())
    }

    #[wasm_bindgen(js_name = moveImageUp)]
    pub fn move_image_up(&mut self, index: usize) -> Result<(), JsValue> {
        self.images
            .move_up(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = moveImageDown)]
    pub fn move_image_down(&mut self, index: usize) -> Result<(), JsValue> {
        self.images
            .move_down(index)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Lazily create (or re-use) a thumbnail object URL for one image.
    #[wasm_bindgen(js_name = previewUrl)]
    pub fn preview_url(&mut self, index: usize) -> Result<String, JsValue> {
        let url = {
            let entry = self
                .images
                .get(index)
                .ok_or_else(|| JsValue::from_str("Image index out of bounds"))?;
            if let Some(id) = entry.preview {
                if let Some(url) = self.previews.url(id) {
                    return Ok(url.to_string());
                }
            }
            create_object_url(&entry.bytes, &entry.media_type)?
        };

        let id = self.previews.register(url.clone());
        if let Some(entry) = self.images.get_mut(index) {
            entry.preview = Some(id);
        }
        Ok(url)
    }

    #[wasm_bindgen(js_name = setPageGeometry)]
    pub fn set_page_geometry(&mut self, geometry: PageGeometry) {
        self.geometry = geometry;
    }

    #[wasm_bindgen(getter, js_name = pageGeometry)]
    pub fn page_geometry(&self) -> PageGeometry {
        self.geometry
    }

    #[wasm_bindgen(js_name = getImageCount)]
    pub fn get_image_count(&self) -> usize {
        self.images.len()
    }

    /// Image names in their current display order.
    #[wasm_bindgen(js_name = getImageNames)]
    pub fn get_image_names(&self) -> Vec<String> {
        self.images.iter().map(|e| e.name.clone()).collect()
    }

    #[wasm_bindgen(js_name = canExecute)]
    pub fn can_execute(&self) -> bool {
        !self.images.is_empty()
    }

    #[wasm_bindgen(getter, js_name = isProcessing)]
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Names of images skipped by the last conversion, with reasons.
    #[wasm_bindgen(js_name = skippedImages)]
    pub fn skipped_images(&self) -> Vec<String> {
        self.last_skipped.clone()
    }

    /// Convert the queued images to one PDF, in list order.
    pub fn execute(&mut self) -> Result<DownloadArtifact, JsValue> {
        match self.execute_internal() {
            Ok((artifact, _pages)) => Ok(artifact),
            Err(e) => {
                crate::console_log!("pdftool: image conversion failed: {}", e);
                Err(JsValue::from_str(&e))
            }
        }
    }

    /// Discard all state and revoke every preview URL.
    pub fn reset(&mut self) {
        for url in self.reset_internal() {
            revoke_object_url(&url);
        }
    }
}

impl Default for ImageToPdfSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([90, 120, 40]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, image::ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn add_png(session: &mut ImageToPdfSession, name: &str, w: u32, h: u32) -> usize {
        session
            .add_image_internal(name, "image/png", &png_bytes(w, h))
            .unwrap()
    }

    #[test]
    fn test_new_session_cannot_execute() {
        let session = ImageToPdfSession::new();
        assert_eq!(session.get_image_count(), 0);
        assert!(!session.can_execute());
    }

    #[test]
    fn test_add_rejects_non_image_type() {
        let mut session = ImageToPdfSession::new();
        let result = session.add_image_internal("doc.pdf", "application/pdf", &[1, 2, 3]);
        assert!(result.unwrap_err().contains("Unsupported file type"));
    }

    #[test]
    fn test_add_rejects_oversized_image() {
        let mut session = ImageToPdfSession::new();
        let huge = vec![0u8; crate::intake::IMAGE_MAX_BYTES + 1];
        let result = session.add_image_internal("big.png", "image/png", &huge);
        assert!(result.unwrap_err().contains("limit"));
    }

    #[test]
    fn test_reorder_changes_name_order() {
        let mut session = ImageToPdfSession::new();
        add_png(&mut session, "a.png", 4, 4);
        add_png(&mut session, "b.png", 4, 5);
        add_png(&mut session, "c.png", 4, 6);

        session.images.move_up(2).unwrap();
        assert_eq!(session.get_image_names(), vec!["a.png", "c.png", "b.png"]);
    }

    #[test]
    fn test_execute_one_page_per_image_in_order() {
        let mut session = ImageToPdfSession::new();
        add_png(&mut session, "first.png", 30, 40);
        add_png(&mut session, "second.png", 50, 60);
        session.set_page_geometry(PageGeometry::Fit);

        let (artifact, pages) = session.execute_internal().unwrap();
        assert_eq!(pages, 2);
        assert_eq!(artifact.filename(), "images.pdf");

        let doc = pdftool_core::LoadedDocument::from_bytes(artifact.raw_bytes()).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_dimensions(1).unwrap(), (30.0, 40.0));
        assert_eq!(doc.page_dimensions(2).unwrap(), (50.0, 60.0));
    }

    #[test]
    fn test_undecodable_image_reported_as_skipped() {
        let mut session = ImageToPdfSession::new();
        add_png(&mut session, "good.png", 8, 8);
        session
            .add_image_internal("broken.png", "image/png", b"not really a png")
            .unwrap();

        let (_, pages) = session.execute_internal().unwrap();
        assert_eq!(pages, 1);
        assert_eq!(session.skipped_images().len(), 1);
        assert!(session.skipped_images()[0].starts_with("broken.png"));
    }

    #[test]
    fn test_all_undecodable_fails() {
        let mut session = ImageToPdfSession::new();
        session
            .add_image_internal("junk.png", "image/png", &[0u8; 32])
            .unwrap();
        assert!(session.execute_internal().is_err());
    }

    #[test]
    fn test_remove_releases_preview_bookkeeping() {
        let mut session = ImageToPdfSession::new();
        add_png(&mut session, "a.png", 4, 4);

        // Simulate a created preview without touching the browser
        let id = session.previews.register("blob:fake-a".to_string());
        session.images.get_mut(0).unwrap().preview = Some(id);

        let released = session.remove_image_internal(0).unwrap();
        assert_eq!(released, Some("blob:fake-a".to_string()));
        assert_eq!(session.previews.live_count(), 0);
    }

    #[test]
    fn test_reset_drains_all_previews() {
        let mut session = ImageToPdfSession::new();
        add_png(&mut session, "a.png", 4, 4);
        add_png(&mut session, "b.png", 4, 4);
        session.previews.register("blob:one".to_string());
        session.previews.register("blob:two".to_string());

        let urls = session.reset_internal();
        assert_eq!(urls.len(), 2);
        assert_eq!(session.get_image_count(), 0);
        assert_eq!(session.previews.live_count(), 0);
    }

    #[test]
    fn test_processing_gate() {
        let mut session = ImageToPdfSession::new();
        add_png(&mut session, "a.png", 4, 4);

        session.processing = true;
        assert!(session.execute_internal().is_err());
        session.processing = false;
        assert!(session.execute_internal().is_ok());
    }
}

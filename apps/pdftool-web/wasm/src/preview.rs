//! Revocable object-URL bookkeeping.
//!
//! Object URLs are backed by a browser-level resource table that only frees
//! entries on explicit revocation or page unload, so every URL this module
//! hands out is tracked and must be released exactly once: on item removal,
//! on session reset, or when a newer URL supersedes it.

use std::collections::HashMap;
use wasm_bindgen::JsValue;

pub type PreviewId = u64;

/// Tracks live object URLs by handle.
///
/// The registry does bookkeeping only; creating and revoking the underlying
/// browser URLs is the caller's wasm-side job, which keeps this testable off
/// the browser.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    urls: HashMap<PreviewId, String>,
    next_id: PreviewId,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly created URL, returning its handle.
    pub fn register(&mut self, url: String) -> PreviewId {
        let id = self.next_id;
        self.next_id += 1;
        self.urls.insert(id, url);
        id
    }

    pub fn url(&self, id: PreviewId) -> Option<&str> {
        self.urls.get(&id).map(String::as_str)
    }

    /// Stop tracking a URL, returning it so the caller can revoke it.
    /// Releasing twice yields `None` the second time.
    pub fn release(&mut self, id: PreviewId) -> Option<String> {
        self.urls.remove(&id)
    }

    /// Stop tracking everything, returning all URLs for revocation.
    pub fn release_all(&mut self) -> Vec<String> {
        self.urls.drain().map(|(_, url)| url).collect()
    }

    pub fn live_count(&self) -> usize {
        self.urls.len()
    }
}

/// Create an object URL for `bytes` with the given media type.
///
/// Only meaningful in the browser; pair every call with a later
/// `revoke_object_url`.
pub fn create_object_url(bytes: &[u8], media_type: &str) -> Result<String, JsValue> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(array.as_ref());

    let options = web_sys::BlobPropertyBag::new();
    options.set_type(media_type);

    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(parts.as_ref(), &options)?;
    web_sys::Url::create_object_url_with_blob(&blob)
}

/// Revoke a URL previously issued by `create_object_url`.
pub fn revoke_object_url(url: &str) {
    let _ = web_sys::Url::revoke_object_url(url);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PreviewRegistry::new();
        let id = registry.register("blob:fake-1".to_string());
        assert_eq!(registry.url(id), Some("blob:fake-1"));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_release_yields_url_exactly_once() {
        let mut registry = PreviewRegistry::new();
        let id = registry.register("blob:fake-1".to_string());

        assert_eq!(registry.release(id), Some("blob:fake-1".to_string()));
        assert_eq!(registry.release(id), None);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_release_all_drains_everything() {
        let mut registry = PreviewRegistry::new();
        registry.register("blob:a".to_string());
        registry.register("blob:b".to_string());
        registry.register("blob:c".to_string());

        let mut urls = registry.release_all();
        urls.sort();
        assert_eq!(urls, vec!["blob:a", "blob:b", "blob:c"]);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_handles_stay_unique_after_release() {
        let mut registry = PreviewRegistry::new();
        let first = registry.register("blob:a".to_string());
        registry.release(first);
        let second = registry.register("blob:b".to_string());
        assert_ne!(first, second);
    }
}

//! Browser file-list adapter.

use std::any::Any;

use host_page::{FileBundle, FileStat};
use wasm_bindgen::{JsCast, JsValue};

/// File bundle wrapping a platform `FileList` (or an array of `File`s
/// assembled from downloaded blobs).
pub struct WebFileBundle {
    value: JsValue,
}

impl WebFileBundle {
    /// Wraps a platform file list.
    pub fn new(files: web_sys::FileList) -> Self {
        Self {
            value: files.into(),
        }
    }

    /// Wraps an arbitrary value read back from an element's `files`
    /// property.
    pub fn from_js(value: JsValue) -> Self {
        Self { value }
    }

    pub(crate) fn as_js(&self) -> &JsValue {
        &self.value
    }

    fn file_at(&self, index: usize) -> Option<web_sys::File> {
        if let Some(list) = self.value.dyn_ref::<web_sys::FileList>() {
            return list.get(index as u32);
        }
        if let Some(array) = self.value.dyn_ref::<js_sys::Array>() {
            return array.get(index as u32).dyn_into::<web_sys::File>().ok();
        }
        None
    }
}

impl FileBundle for WebFileBundle {
    fn len(&self) -> usize {
        if let Some(list) = self.value.dyn_ref::<web_sys::FileList>() {
            return list.length() as usize;
        }
        if let Some(array) = self.value.dyn_ref::<js_sys::Array>() {
            return array.length() as usize;
        }
        0
    }

    fn stat(&self, index: usize) -> Option<FileStat> {
        let file = self.file_at(index)?;
        Some(FileStat {
            name: file.name(),
            size_bytes: file.size() as u64,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

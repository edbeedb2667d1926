//! The document tree — the wire format of the generic serializer.
//!
//! A [`Document`] is a JSON-compatible tree value: null, boolean, integer
//! (signed and unsigned), double, string, array, and an *ordered*
//! string-keyed object (`serde_json` with `preserve_order`, so object keys
//! keep field declaration order).

use serde_json::Value;

use crate::error::StoreError;

/// JSON-compatible tree value produced and consumed by serialization.
pub type Document = Value;

/// Ordered string-keyed map used for object documents.
pub type DocumentMap = serde_json::Map<String, Value>;

/// An empty object document.
#[inline]
pub fn empty_object() -> Document {
    Document::Object(DocumentMap::new())
}

/// Encode a document to pretty-printed bytes for the file store.
pub fn to_bytes(doc: &Document) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Codec {
        detail: e.to_string(),
    })
}

/// Decode a document from stored bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Codec {
        detail: e.to_string(),
    })
}

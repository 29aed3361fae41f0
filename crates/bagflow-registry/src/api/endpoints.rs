//! Registry endpoint URL builders
//!
//! Object and file identifiers contain `/` and are percent-encoded into a
//! single path segment.

use crate::api::types::EventParent;

/// Build object collection URL
pub fn objects_url(base_url: &str) -> String {
    format!("{}/api/v2/objects", base_url)
}

/// Build single-object URL
pub fn object_url(base_url: &str, identifier: &str) -> String {
    format!("{}/api/v2/objects/{}", base_url, urlencoding::encode(identifier))
}

/// Build the files collection URL under an object
pub fn object_files_url(base_url: &str, object_identifier: &str) -> String {
    format!(
        "{}/api/v2/objects/{}/files",
        base_url,
        urlencoding::encode(object_identifier)
    )
}

/// Build the bulk file-save URL under an object
pub fn object_files_bulk_url(base_url: &str, object_identifier: &str) -> String {
    format!(
        "{}/api/v2/objects/{}/files/bulk",
        base_url,
        urlencoding::encode(object_identifier)
    )
}

/// Build single generic-file URL
pub fn file_url(base_url: &str, identifier: &str) -> String {
    format!("{}/api/v2/files/{}", base_url, urlencoding::encode(identifier))
}

/// Build the events collection URL under an object or a file
pub fn events_url(base_url: &str, parent: EventParent, identifier: &str) -> String {
    let collection = match parent {
        EventParent::Object => "objects",
        EventParent::File => "files",
    };
    format!(
        "{}/api/v2/{}/{}/events",
        base_url,
        collection,
        urlencoding::encode(identifier)
    )
}

/// Build status-item collection URL
pub fn items_url(base_url: &str) -> String {
    format!("{}/api/v2/items", base_url)
}

/// Build single status-item URL
pub fn item_url(base_url: &str, id: i64) -> String {
    format!("{}/api/v2/items/{}", base_url, id)
}

/// Build institutions collection URL
pub fn institutions_url(base_url: &str) -> String {
    format!("{}/api/v2/institutions", base_url)
}

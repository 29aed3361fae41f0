//! Registry request and response payloads

use bagflow_common::types::{GenericFile, IntellectualObject, PremisEvent};
use serde::{Deserialize, Serialize};

/// What an event is recorded against. The registry keys event routes on
/// the parent type, so the tag is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventParent {
    Object,
    File,
}

/// Body of an object-create request: the object's metadata, at most
/// `max_files_per_create` of its generic files, and the derived
/// provenance events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectCreateRequest {
    pub identifier: String,
    pub title: String,
    pub description: String,
    pub access: String,
    pub institution: String,
    pub files: Vec<GenericFile>,
    pub events: Vec<PremisEvent>,
}

impl ObjectCreateRequest {
    /// Build a create request from an object, embedding the given file
    /// subset and events
    pub fn new(
        object: &IntellectualObject,
        files: Vec<GenericFile>,
        events: Vec<PremisEvent>,
    ) -> Self {
        Self {
            identifier: object.identifier.clone(),
            title: object.title.clone(),
            description: object.description.clone(),
            access: object.access.clone(),
            institution: object.institution.clone(),
            files,
            events,
        }
    }
}

/// Body of an object-update request: full replace of the mutable metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectUpdateRequest {
    pub identifier: String,
    pub title: String,
    pub description: String,
    pub access: String,
}

impl From<&IntellectualObject> for ObjectUpdateRequest {
    fn from(object: &IntellectualObject) -> Self {
        Self {
            identifier: object.identifier.clone(),
            title: object.title.clone(),
            description: object.description.clone(),
            access: object.access.clone(),
        }
    }
}

/// Body of a bulk file-save request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFileSaveRequest {
    pub files: Vec<GenericFile>,
}

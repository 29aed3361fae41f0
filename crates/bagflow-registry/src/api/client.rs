//! HTTP client for the metadata registry
//!
//! One client per worker process. Every operation may block for a network
//! round trip bounded by the configured timeout; a timeout is a transient
//! failure and never advances stage or status.

use crate::api::{endpoints, types::*};
use bagflow_common::config::RegistryConfig;
use bagflow_common::error::{BagflowError, Result};
use bagflow_common::status::latest_per_identifier;
use bagflow_common::types::{
    Action, GenericFile, Institution, IntellectualObject, Paged, PremisEvent, ProcessStatus,
    Stage, Status,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// Client Constants
// ============================================================================

/// Page size used when walking paginated collections.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Header carrying the registry API token, when one is configured.
const AUTH_HEADER: &str = "X-Auth-Token";

/// Result of an object-create call
///
/// `deferred` holds the files beyond the per-request cap that were NOT
/// included in the create; the caller must register them with
/// [`RegistryClient::save_generic_files_bulk`]. Dropping them silently is
/// disallowed, which is why they travel in the return value.
#[derive(Debug, Clone)]
pub struct CreatedObject {
    pub object: IntellectualObject,
    pub deferred: Vec<GenericFile>,
}

/// Client for the metadata registry API
pub struct RegistryClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    max_files_per_create: usize,
    /// Institution domain -> server id, preloaded by `cache_institutions`
    /// so per-file identifier validation needs no network call
    institutions: RwLock<HashMap<String, i64>>,
}

impl RegistryClient {
    /// Create a new registry client from configuration
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            api_token: config.api_token.clone(),
            max_files_per_create: config.max_files_per_create,
            institutions: RwLock::new(HashMap::new()),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(ref token) = self.api_token {
            request = request.header(AUTH_HEADER, token);
        }
        request
    }

    // ========================================================================
    // Objects
    // ========================================================================

    /// Fetch an object by identifier. `with_relations` also loads the
    /// object's files and events (the heavy form).
    ///
    /// Absence is `Ok(None)`, never an error, so callers can branch
    /// create-vs-update.
    pub async fn get_object(
        &self,
        identifier: &str,
        with_relations: bool,
    ) -> Result<Option<IntellectualObject>> {
        let url = endpoints::object_url(&self.base_url, identifier);
        let mut request = self.request(Method::GET, &url);
        if with_relations {
            request = request.query(&[("include_relations", "true")]);
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let object = response.error_for_status()?.json().await?;
        Ok(Some(object))
    }

    /// Create an object, embedding up to `max_files_per_create` of its
    /// generic files and the three derived provenance events (identifier
    /// assignment, ingest, rights assignment).
    ///
    /// Files beyond the cap are returned in `CreatedObject::deferred` and
    /// must be registered via [`Self::save_generic_files_bulk`].
    pub async fn create_object(&self, object: &IntellectualObject) -> Result<CreatedObject> {
        let (included, deferred) = if object.files.len() > self.max_files_per_create {
            let (head, tail) = object.files.split_at(self.max_files_per_create);
            (head.to_vec(), tail.to_vec())
        } else {
            (object.files.clone(), Vec::new())
        };

        if !deferred.is_empty() {
            warn!(
                object = %object.identifier,
                included = included.len(),
                deferred = deferred.len(),
                "object exceeds create capacity, remainder must go through bulk save"
            );
        }

        let body = ObjectCreateRequest::new(object, included, creation_events(object));
        let response = self
            .request(Method::POST, &endpoints::objects_url(&self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let created: IntellectualObject = response.json().await?;
        debug!(object = %created.identifier, files = created.files.len(), "object created");
        Ok(CreatedObject {
            object: created,
            deferred,
        })
    }

    /// Full replace of an object's identifier/title/description/access.
    /// The echoed object keeps any pre-existing server id.
    pub async fn update_object(&self, object: &IntellectualObject) -> Result<IntellectualObject> {
        let url = endpoints::object_url(&self.base_url, &object.identifier);
        let response = self
            .request(Method::PUT, &url)
            .json(&ObjectUpdateRequest::from(object))
            .send()
            .await?
            .error_for_status()?;

        let mut echoed: IntellectualObject = response.json().await?;
        if echoed.id.is_none() {
            echoed.id = object.id;
        }
        Ok(echoed)
    }

    // ========================================================================
    // Generic Files
    // ========================================================================

    /// Fetch a generic file by identifier; `Ok(None)` on absence
    pub async fn get_generic_file(&self, identifier: &str) -> Result<Option<GenericFile>> {
        let url = endpoints::file_url(&self.base_url, identifier);
        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let file = response.error_for_status()?.json().await?;
        Ok(Some(file))
    }

    /// Upsert one generic file under an object: no server id means create,
    /// a server id means update
    pub async fn save_generic_file(
        &self,
        file: &GenericFile,
        object_identifier: &str,
    ) -> Result<GenericFile> {
        let response = match file.id {
            None => {
                let url = endpoints::object_files_url(&self.base_url, object_identifier);
                self.request(Method::POST, &url).json(file).send().await?
            }
            Some(_) => {
                let url = endpoints::file_url(&self.base_url, &file.identifier);
                self.request(Method::PUT, &url).json(file).send().await?
            }
        };

        let saved = response.error_for_status()?.json().await?;
        Ok(saved)
    }

    /// Register a batch of generic files under an existing object: the
    /// follow-up path for files deferred by [`Self::create_object`].
    ///
    /// One request per call; a batch larger than the per-request cap is a
    /// `CapacityExceeded` error and the caller should chunk (the batching
    /// iterator already produces chunks of the right size).
    pub async fn save_generic_files_bulk(
        &self,
        object_identifier: &str,
        files: &[GenericFile],
    ) -> Result<Vec<GenericFile>> {
        if files.len() > self.max_files_per_create {
            return Err(BagflowError::CapacityExceeded {
                limit: self.max_files_per_create,
                actual: files.len(),
            });
        }
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let url = endpoints::object_files_bulk_url(&self.base_url, object_identifier);
        let body = BulkFileSaveRequest {
            files: files.to_vec(),
        };
        let response = self
            .request(Method::POST, &url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let saved: Vec<GenericFile> = response.json().await?;
        debug!(object = %object_identifier, files = saved.len(), "bulk file save complete");
        Ok(saved)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Record a provenance event against an object or a file.
    ///
    /// The echoed event must carry the same client-generated identifier
    /// as submitted; a mismatch is treated as a failed sync attempt.
    pub async fn record_event(
        &self,
        event: &PremisEvent,
        parent: EventParent,
        identifier: &str,
    ) -> Result<PremisEvent> {
        let url = endpoints::events_url(&self.base_url, parent, identifier);
        let response = self
            .request(Method::POST, &url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;

        let echoed: PremisEvent = response.json().await?;
        if echoed.identifier != event.identifier {
            return Err(BagflowError::transient(format!(
                "registry echoed event {} for submitted event {}",
                echoed.identifier, event.identifier
            )));
        }
        Ok(echoed)
    }

    // ========================================================================
    // Status Items
    // ========================================================================

    /// Every status record modified at or after `since` (inclusive),
    /// walking pages. A timestamp beyond the latest update yields an empty
    /// vec, not an error.
    pub async fn status_since(&self, since: DateTime<Utc>) -> Result<Vec<ProcessStatus>> {
        self.collect_items(&[("updated_since".to_string(), since.to_rfc3339())])
            .await
    }

    /// Upsert one processing-status record.
    ///
    /// Looks up the latest record for the item's logical key first: if the
    /// registry already holds one, this updates it in place and the result
    /// carries the assigned id; otherwise it creates a new record whose id
    /// the registry assigns later. Safe under duplicate delivery.
    pub async fn send_processed_item(&self, status: &ProcessStatus) -> Result<ProcessStatus> {
        let existing = self.find_item(status).await?;

        match existing.and_then(|record| record.id) {
            Some(id) => {
                let url = endpoints::item_url(&self.base_url, id);
                let response = self
                    .request(Method::PUT, &url)
                    .json(status)
                    .send()
                    .await?
                    .error_for_status()?;
                let mut echoed: ProcessStatus = response.json().await?;
                if echoed.id.is_none() {
                    echoed.id = Some(id);
                }
                Ok(echoed)
            }
            None => {
                let response = self
                    .request(Method::POST, &endpoints::items_url(&self.base_url))
                    .json(status)
                    .send()
                    .await?
                    .error_for_status()?;
                let echoed: ProcessStatus = response.json().await?;
                Ok(echoed)
            }
        }
    }

    /// Restore requests whose latest record is still retryable-pending,
    /// optionally narrowed to one object. Withdrawn requests
    /// (retry = false) are excluded. Empty vec when none exist.
    pub async fn pending_restore_requests(
        &self,
        object_identifier: Option<&str>,
    ) -> Result<Vec<ProcessStatus>> {
        self.pending_requests(Action::Restore, object_identifier, None)
            .await
    }

    /// Deletion requests whose latest record is still retryable-pending,
    /// optionally narrowed to one object or one file
    pub async fn pending_deletion_requests(
        &self,
        object_identifier: Option<&str>,
        file_identifier: Option<&str>,
    ) -> Result<Vec<ProcessStatus>> {
        self.pending_requests(Action::Delete, object_identifier, file_identifier)
            .await
    }

    /// Advance the latest restore record for an object to a new stage and
    /// status, clearing retry, without the caller reconstructing a full
    /// record. `Ok(None)` when the object has no restore record.
    pub async fn set_restoration_status(
        &self,
        object_identifier: &str,
        stage: Stage,
        status: Status,
        note: impl Into<String>,
    ) -> Result<Option<ProcessStatus>> {
        let records = self
            .collect_items(&[
                ("action".to_string(), Action::Restore.to_string()),
                ("object_identifier".to_string(), object_identifier.to_string()),
            ])
            .await?;

        let Some(mut record) = records.into_iter().max_by_key(|r| r.date) else {
            return Ok(None);
        };

        record.stage = stage;
        record.status = status;
        record.note = note.into();
        record.retry = false;
        record.date = Utc::now();

        let saved = self.send_processed_item(&record).await?;
        Ok(Some(saved))
    }

    // ========================================================================
    // Institutions
    // ========================================================================

    /// Preload the institution directory into the client-side cache,
    /// walking every page. Returns the number of institutions cached.
    pub async fn cache_institutions(&self) -> Result<usize> {
        let url = endpoints::institutions_url(&self.base_url);
        let mut all: Vec<Institution> = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .request(Method::GET, &url)
                .query(&[
                    ("page", page.to_string()),
                    ("page_size", DEFAULT_PAGE_SIZE.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let paged: Paged<Institution> = response.json().await?;
            let fetched = paged.results.len();
            all.extend(paged.results);

            if fetched < DEFAULT_PAGE_SIZE || all.len() as i64 >= paged.total {
                break;
            }
            page += 1;
        }

        let mut cache = self
            .institutions
            .write()
            .map_err(|_| BagflowError::transient("institution cache lock poisoned"))?;
        cache.clear();
        for institution in all {
            cache.insert(institution.identifier, institution.id);
        }
        debug!(count = cache.len(), "institution directory cached");
        Ok(cache.len())
    }

    /// Server id for an institution domain, answered from the cache
    pub fn institution_id_for(&self, domain: &str) -> Option<i64> {
        self.institutions
            .read()
            .ok()
            .and_then(|cache| cache.get(domain).copied())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Latest record for a status item's logical key (name, etag, bag_date)
    async fn find_item(&self, status: &ProcessStatus) -> Result<Option<ProcessStatus>> {
        let records = self
            .collect_items(&[
                ("name".to_string(), status.name.clone()),
                ("etag".to_string(), status.etag.clone()),
                ("bag_date".to_string(), status.bag_date.to_rfc3339()),
            ])
            .await?;
        Ok(records.into_iter().max_by_key(|r| r.date))
    }

    async fn pending_requests(
        &self,
        action: Action,
        object_identifier: Option<&str>,
        file_identifier: Option<&str>,
    ) -> Result<Vec<ProcessStatus>> {
        let mut params = vec![("action".to_string(), action.to_string())];
        if let Some(identifier) = object_identifier {
            params.push(("object_identifier".to_string(), identifier.to_string()));
        }
        if let Some(identifier) = file_identifier {
            params.push(("generic_file_identifier".to_string(), identifier.to_string()));
        }

        let records = self.collect_items(&params).await?;
        Ok(latest_per_identifier(records)
            .into_iter()
            .filter(|record| record.is_retryable_pending())
            .collect())
    }

    /// Walk every page of the items collection matching `params`
    async fn collect_items(&self, params: &[(String, String)]) -> Result<Vec<ProcessStatus>> {
        let url = endpoints::items_url(&self.base_url);
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .request(Method::GET, &url)
                .query(params)
                .query(&[
                    ("page", page.to_string()),
                    ("page_size", DEFAULT_PAGE_SIZE.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?;

            let paged: Paged<ProcessStatus> = response.json().await?;
            let fetched = paged.results.len();
            all.extend(paged.results);

            if fetched < DEFAULT_PAGE_SIZE || all.len() as i64 >= paged.total {
                break;
            }
            page += 1;
        }

        Ok(all)
    }
}

/// The three provenance events derived at object creation
fn creation_events(object: &IntellectualObject) -> Vec<PremisEvent> {
    vec![
        PremisEvent::new(
            "identifier_assignment",
            format!("Assigned identifier {}", object.identifier),
            "Success",
            object.identifier.clone(),
            "bagflow identifier service",
            "bagflow record worker",
        ),
        PremisEvent::new(
            "ingest",
            "Copied bag contents to preservation storage",
            "Success",
            format!("{} files", object.files.len()),
            "bagflow storage service",
            "bagflow record worker",
        ),
        PremisEvent::new(
            "rights_assignment",
            format!("Access rights set to '{}'", object.access),
            "Success",
            object.access.clone(),
            "bagflow registry client",
            "bagflow record worker",
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn test_config() -> RegistryConfig {
        RegistryConfig {
            url: "http://localhost:9292".to_string(),
            api_token: None,
            request_timeout_secs: 5,
            max_files_per_create: 200,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = RegistryClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9292");
    }

    #[test]
    fn test_creation_events_cover_required_types() {
        let object = IntellectualObject {
            id: None,
            identifier: "uc.edu/cin.675812".to_string(),
            title: "Cincinnati papers".to_string(),
            description: String::new(),
            access: "institution".to_string(),
            institution: "uc.edu".to_string(),
            files: vec![],
            events: vec![],
        };

        let events = creation_events(&object);
        let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["identifier_assignment", "ingest", "rights_assignment"]
        );
        // identifiers are client-generated and distinct
        assert_ne!(events[0].identifier, events[1].identifier);
    }

    #[test]
    fn test_institution_cache_starts_empty() {
        let client = RegistryClient::new(&test_config()).unwrap();
        assert_eq!(client.institution_id_for("uc.edu"), None);
    }
}

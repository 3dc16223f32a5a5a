//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkOperation, BulkParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::types::{BatchOperationResult, BatchOperationSummary, BulkDocument};

/// OpenSearch provider implementation.
///
/// # Example
///
/// ```ignore
/// let provider = OpenSearchProvider::new("http://localhost:9200", Duration::from_secs(30))?;
/// provider.ping().await?;
///
/// let docs = vec![BulkDocument { id: work_id.to_string(), source: json!({"title": "The Star"}) }];
/// // Replaces any existing document with the same id
/// provider.bulk_upsert("movies", &docs).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or transport setup fails
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, timeout_secs = timeout.as_secs(), "Created OpenSearch provider");

        Ok(Self { client })
    }

    /// Turn a non-success response into a classified error.
    async fn error_from_response(response: Response) -> SearchIndexError {
        let status = response.status_code().as_u16();
        let body = response.text().await.unwrap_or_default();
        SearchIndexError::from_status(status, body)
    }

    /// Build the bulk request body: one `index` action per document.
    ///
    /// `index` (not `update`) gives replace semantics, so a replayed batch
    /// overwrites rather than merges.
    fn bulk_body(documents: &[BulkDocument]) -> Vec<BulkOperation<Value>> {
        documents
            .iter()
            .map(|doc| BulkOperation::index(doc.source.clone()).id(&doc.id).into())
            .collect()
    }
}

/// Parse a bulk API response body into per-document results.
///
/// Items come back in request order, each as `{"index": {"_id", "status", "error"?}}`.
pub(crate) fn parse_bulk_response(
    body: &Value,
    documents: &[BulkDocument],
) -> Result<BatchOperationSummary, SearchIndexError> {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchIndexError::parse("bulk response has no items array"))?;

    if items.len() != documents.len() {
        return Err(SearchIndexError::parse(format!(
            "bulk response has {} items for {} documents",
            items.len(),
            documents.len()
        )));
    }

    let results = items
        .iter()
        .zip(documents)
        .map(|(item, doc)| {
            let action = item
                .get("index")
                .or_else(|| item.as_object().and_then(|o| o.values().next()));
            let status = action
                .and_then(|a| a.get("status"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let item_error = action.and_then(|a| a.get("error"));

            match item_error {
                None if (200..300).contains(&status) => BatchOperationResult {
                    document_id: doc.id.clone(),
                    success: true,
                    error: None,
                },
                _ => {
                    let reason = item_error
                        .and_then(|e| e.get("reason"))
                        .and_then(Value::as_str)
                        .unwrap_or("unknown bulk item failure");
                    BatchOperationResult {
                        document_id: doc.id.clone(),
                        success: false,
                        error: Some(SearchIndexError::from_status(status as u16, reason)),
                    }
                }
            }
        })
        .collect();

    Ok(BatchOperationSummary::from_results(results))
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        debug!("OpenSearch ping is OK");
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(Self::error_from_response(response).await),
        }
    }

    async fn ensure_index_exists(
        &self,
        index: &str,
        settings: &Value,
    ) -> Result<(), SearchIndexError> {
        if self.index_exists(index).await? {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }

        info!(index = %index, "Creating missing index");

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(settings.clone())
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            // Another instance may have created it in the meantime.
            if error_body.contains("resource_already_exists_exception") {
                return Ok(());
            }
            error!(index = %index, status = %status, body = %error_body, "Index creation failed");
            return Err(SearchIndexError::index_creation(format!(
                "Creating index {} failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Index created");
        Ok(())
    }

    async fn bulk_upsert(
        &self,
        index: &str,
        documents: &[BulkDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::from_results(Vec::new()));
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(Self::bulk_body(documents))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        if !response.status_code().is_success() {
            let err = Self::error_from_response(response).await;
            error!(index = %index, error = %err, "Bulk request failed");
            return Err(err);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = parse_bulk_response(&body, documents)?;
        debug!(
            index = %index,
            total = summary.total,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }
}

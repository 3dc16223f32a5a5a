//! In-memory stand-ins for the catalog, the search index and the state store.
//!
//! The mock source applies the same filters and ordering as the SQL in the
//! repository crate, so the pipelines see the rows Postgres would return.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use film_sync::config::build_pipelines;
use film_sync::orchestrator::{Orchestrator, OrchestratorConfig};
use film_sync::{ServiceError, Settings};
use film_sync_repository::{
    BatchOperationResult, BatchOperationSummary, BulkDocument, ChangeFeed, ChangeQuery, ChangeRow,
    DirectoryQuery, SearchIndexError, SearchIndexProvider, SourceError, SourceReader, SourceTable,
    StateStoreError, WatermarkStore, Watermarks,
};
use film_sync_shared::{
    DirectoryRecord, EnrichedWork, NamedRef, PersonRole, PersonWithRole, WatermarkKey,
};
use serde_json::Value;
use uuid::Uuid;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

#[derive(Debug, Clone)]
struct WorkRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    rating: Option<f64>,
    modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct NamedRow {
    id: Uuid,
    name: String,
    modified: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Catalog {
    works: Vec<WorkRow>,
    persons: Vec<NamedRow>,
    genres: Vec<NamedRow>,
    person_links: Vec<(Uuid, Uuid, PersonRole)>,
    genre_links: Vec<(Uuid, Uuid)>,
}

impl Catalog {
    fn work(&self, id: Uuid) -> Option<&WorkRow> {
        self.works.iter().find(|w| w.id == id)
    }

    fn person(&self, id: Uuid) -> Option<&NamedRow> {
        self.persons.iter().find(|p| p.id == id)
    }

    fn genre(&self, id: Uuid) -> Option<&NamedRow> {
        self.genres.iter().find(|g| g.id == id)
    }

    fn table(&self, table: SourceTable) -> Vec<(Uuid, String, DateTime<Utc>)> {
        match table {
            SourceTable::FilmWork => self
                .works
                .iter()
                .map(|w| (w.id, w.title.clone(), w.modified))
                .collect(),
            SourceTable::Person => self
                .persons
                .iter()
                .map(|p| (p.id, p.name.clone(), p.modified))
                .collect(),
            SourceTable::Genre => self
                .genres
                .iter()
                .map(|g| (g.id, g.name.clone(), g.modified))
                .collect(),
        }
    }

    /// Distinct `(modified, entity_id, work_id)` triples of a change feed, sorted.
    fn feed(&self, query: &ChangeQuery) -> BTreeSet<(DateTime<Utc>, Uuid, Uuid)> {
        let mut rows = BTreeSet::new();
        match query.feed {
            ChangeFeed::Work => {
                for w in self.works.iter().filter(|w| w.modified >= query.since) {
                    rows.insert((w.modified, w.id, w.id));
                }
            }
            ChangeFeed::Person => {
                for (work_id, person_id, _) in &self.person_links {
                    let (Some(w), Some(p)) = (self.work(*work_id), self.person(*person_id)) else {
                        continue;
                    };
                    if p.modified >= query.since
                        && w.modified < query.work_upper_bound
                        && p.modified > w.modified
                    {
                        rows.insert((p.modified, p.id, w.id));
                    }
                }
            }
            ChangeFeed::Genre => {
                for (work_id, genre_id) in &self.genre_links {
                    let (Some(w), Some(g)) = (self.work(*work_id), self.genre(*genre_id)) else {
                        continue;
                    };
                    if g.modified >= query.since
                        && w.modified < query.work_upper_bound
                        && g.modified > w.modified
                    {
                        rows.insert((g.modified, g.id, w.id));
                    }
                }
            }
        }
        rows
    }
}

/// Film catalog held in memory.
#[derive(Default)]
pub struct MockSource {
    catalog: Mutex<Catalog>,
    pub unreachable: AtomicBool,
    fetch_failures: AtomicUsize,
    undecodable: Mutex<Vec<Uuid>>,
    pub fetch_calls: AtomicUsize,
    pub enrich_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_work(&self, title: &str, rating: Option<f64>, at: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.catalog.lock().unwrap().works.push(WorkRow {
            id,
            title: title.to_string(),
            description: None,
            rating,
            modified: ts(at),
        });
        id
    }

    pub fn add_person(&self, name: &str, at: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.catalog.lock().unwrap().persons.push(NamedRow {
            id,
            name: name.to_string(),
            modified: ts(at),
        });
        id
    }

    pub fn add_genre(&self, name: &str, at: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.catalog.lock().unwrap().genres.push(NamedRow {
            id,
            name: name.to_string(),
            modified: ts(at),
        });
        id
    }

    pub fn link_person(&self, work: Uuid, person: Uuid, role: PersonRole) {
        self.catalog
            .lock()
            .unwrap()
            .person_links
            .push((work, person, role));
    }

    pub fn link_genre(&self, work: Uuid, genre: Uuid) {
        self.catalog.lock().unwrap().genre_links.push((work, genre));
    }

    pub fn rename_person(&self, id: Uuid, name: &str, at: i64) {
        let mut catalog = self.catalog.lock().unwrap();
        if let Some(p) = catalog.persons.iter_mut().find(|p| p.id == id) {
            p.name = name.to_string();
            p.modified = ts(at);
        }
    }

    pub fn rename_genre(&self, id: Uuid, name: &str, at: i64) {
        let mut catalog = self.catalog.lock().unwrap();
        if let Some(g) = catalog.genres.iter_mut().find(|g| g.id == id) {
            g.name = name.to_string();
            g.modified = ts(at);
        }
    }

    pub fn update_work(&self, id: Uuid, title: &str, at: i64) {
        let mut catalog = self.catalog.lock().unwrap();
        if let Some(w) = catalog.works.iter_mut().find(|w| w.id == id) {
            w.title = title.to_string();
            w.modified = ts(at);
        }
    }

    pub fn remove_genre(&self, id: Uuid) {
        let mut catalog = self.catalog.lock().unwrap();
        catalog.genres.retain(|g| g.id != id);
        catalog.genre_links.retain(|(_, g)| *g != id);
    }

    /// Make enrichment of `id` fail the way a row with an unknown person role does.
    pub fn corrupt_work(&self, id: Uuid) {
        self.undecodable.lock().unwrap().push(id);
    }

    /// Fail the next `n` change-page fetches with a dropped connection.
    pub fn fail_next_fetches(&self, n: usize) {
        self.fetch_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceReader for MockSource {
    async fn ping(&self) -> Result<(), SourceError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SourceError::connection("connection refused"));
        }
        Ok(())
    }

    async fn fetch_changes(&self, query: &ChangeQuery) -> Result<Vec<ChangeRow>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .fetch_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SourceError::connection("connection reset by peer"));
        }

        let catalog = self.catalog.lock().unwrap();
        let after = query.after.map(|c| (c.modified, c.entity_id, c.work_id));
        Ok(catalog
            .feed(query)
            .into_iter()
            .filter(|row| after.map_or(true, |a| *row > a))
            .take(query.limit)
            .map(|(modified, entity_id, work_id)| ChangeRow {
                work_id,
                entity_id,
                modified,
            })
            .collect())
    }

    async fn max_modified(&self, table: SourceTable) -> Result<Option<DateTime<Utc>>, SourceError> {
        let catalog = self.catalog.lock().unwrap();
        Ok(catalog.table(table).into_iter().map(|(_, _, m)| m).max())
    }

    async fn enrich_works(&self, ids: &[Uuid]) -> Result<Vec<EnrichedWork>, SourceError> {
        self.enrich_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = self
            .undecodable
            .lock()
            .unwrap()
            .iter()
            .find(|id| ids.contains(id))
        {
            return Err(SourceError::decode(format!(
                "error occurred while decoding column \"persons\" of work {}: unknown variant `producer`",
                id
            )));
        }
        let catalog = self.catalog.lock().unwrap();

        let mut works: Vec<&WorkRow> = catalog.works.iter().filter(|w| ids.contains(&w.id)).collect();
        works.sort_by_key(|w| w.id);

        Ok(works
            .into_iter()
            .map(|w| EnrichedWork {
                id: w.id,
                title: w.title.clone(),
                description: w.description.clone(),
                rating: w.rating,
                work_type: "movie".to_string(),
                modified: w.modified,
                persons: catalog
                    .person_links
                    .iter()
                    .filter(|(work, _, _)| *work == w.id)
                    .filter_map(|(_, person, role)| {
                        catalog
                            .person(*person)
                            .map(|p| PersonWithRole::new(*role, p.id, p.name.clone()))
                    })
                    .collect(),
                genres: catalog
                    .genre_links
                    .iter()
                    .filter(|(work, _)| *work == w.id)
                    .filter_map(|(_, genre)| {
                        catalog
                            .genre(*genre)
                            .map(|g| NamedRef::new(g.id, g.name.clone()))
                    })
                    .collect(),
            })
            .collect())
    }

    async fn fetch_directory(
        &self,
        query: &DirectoryQuery,
    ) -> Result<Vec<DirectoryRecord>, SourceError> {
        let catalog = self.catalog.lock().unwrap();
        let after = query.after.map(|c| (c.modified, c.entity_id));

        let mut rows: Vec<(DateTime<Utc>, Uuid, String)> = catalog
            .table(query.table)
            .into_iter()
            .filter(|(_, _, modified)| *modified >= query.since)
            .map(|(id, name, modified)| (modified, id, name))
            .filter(|(modified, id, _)| after.map_or(true, |a| (*modified, *id) > a))
            .collect();
        rows.sort();

        Ok(rows
            .into_iter()
            .take(query.limit)
            .map(|(modified, id, name)| DirectoryRecord { id, name, modified })
            .collect())
    }
}

/// Search index held in memory: index name to documents by id.
#[derive(Default)]
pub struct MockIndex {
    indexes: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    pub unreachable: AtomicBool,
    transient_failures: AtomicUsize,
    pub bulk_calls: AtomicUsize,
    reject_ids: Mutex<Vec<String>>,
}

impl MockIndex {
    pub fn with_indexes(names: &[&str]) -> Self {
        let index = Self::default();
        {
            let mut indexes = index.indexes.lock().unwrap();
            for name in names {
                indexes.insert(name.to_string(), BTreeMap::new());
            }
        }
        index
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.lock().unwrap().contains_key(name)
    }

    pub fn document(&self, index: &str, id: Uuid) -> Option<Value> {
        self.indexes
            .lock()
            .unwrap()
            .get(index)
            .and_then(|docs| docs.get(&id.to_string()).cloned())
    }

    pub fn documents(&self, index: &str) -> BTreeMap<String, Value> {
        self.indexes
            .lock()
            .unwrap()
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Fail the next `n` bulk requests with 503.
    pub fn fail_next_bulks(&self, n: usize) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Reject this document id in every bulk response until cleared.
    pub fn reject(&self, id: Uuid) {
        self.reject_ids.lock().unwrap().push(id.to_string());
    }

    pub fn clear_rejections(&self) {
        self.reject_ids.lock().unwrap().clear();
    }
}

#[async_trait]
impl SearchIndexProvider for MockIndex {
    async fn ping(&self) -> Result<(), SearchIndexError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SearchIndexError::connection("connection refused"));
        }
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchIndexError> {
        Ok(self.has_index(index))
    }

    async fn ensure_index_exists(
        &self,
        index: &str,
        _settings: &Value,
    ) -> Result<(), SearchIndexError> {
        self.indexes
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn bulk_upsert(
        &self,
        index: &str,
        documents: &[BulkDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SearchIndexError::unavailable("503 Service Unavailable"));
        }

        let rejected = self.reject_ids.lock().unwrap().clone();
        let mut indexes = self.indexes.lock().unwrap();
        let docs = indexes
            .get_mut(index)
            .ok_or_else(|| SearchIndexError::index_not_found(index))?;

        let results = documents
            .iter()
            .map(|doc| {
                if rejected.contains(&doc.id) {
                    return BatchOperationResult {
                        document_id: doc.id.clone(),
                        success: false,
                        error: Some(SearchIndexError::bulk_index("mapper_parsing_exception")),
                    };
                }
                docs.insert(doc.id.clone(), doc.source.clone());
                BatchOperationResult {
                    document_id: doc.id.clone(),
                    success: true,
                    error: None,
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }
}

/// Watermark store held in memory, with injectable save failures.
#[derive(Default)]
pub struct MockStore {
    saved: Mutex<Watermarks>,
    save_failures: AtomicUsize,
    pub saves: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watermarks(&self) -> Watermarks {
        self.saved.lock().unwrap().clone()
    }

    pub fn watermark(&self, key: WatermarkKey) -> Option<DateTime<Utc>> {
        self.saved.lock().unwrap().get(key.as_str()).copied()
    }

    pub fn fail_next_saves(&self, n: usize) {
        self.save_failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl WatermarkStore for MockStore {
    async fn load(&self) -> Result<Watermarks, StateStoreError> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save(&self, watermarks: &Watermarks) -> Result<(), StateStoreError> {
        if self
            .save_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StateStoreError::format("disk full"));
        }
        *self.saved.lock().unwrap() = watermarks.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Settings tuned for tests: small pages, fast retries, no sleep.
pub fn settings(overrides: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://sync@localhost/movies"),
        ("EXTRACT_BATCH_SIZE", "2"),
        ("INDEX_BATCH_SIZE", "2"),
        ("RETRY_MAX_ATTEMPTS", "3"),
        ("RETRY_INITIAL_DELAY_MS", "1"),
        ("RETRY_MAX_DELAY_SECS", "1"),
        ("SYNC_INTERVAL_SECS", "0"),
        ("MAX_ITERATIONS", "1"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    let settings: Result<Settings, ServiceError> =
        Settings::from_lookup(|key| vars.get(key).cloned());
    settings.unwrap()
}

/// Wire the real pipelines and orchestrator to the mocks.
pub fn orchestrator(
    settings: &Settings,
    source: &Arc<MockSource>,
    index: &Arc<MockIndex>,
    store: Arc<dyn WatermarkStore>,
) -> Orchestrator {
    let pipelines = build_pipelines(settings, source.clone(), index.clone());
    Orchestrator::new(
        pipelines,
        store,
        OrchestratorConfig {
            sync_interval: settings.sync.interval,
            max_iterations: settings.sync.max_iterations,
        },
    )
}

//! Record store contract and the local document store.
//!
//! [`RecordStore`] is the only seam between the aggregation layer and
//! persistence. [`LocalStore`] keeps one collection per [`VehicleClass`] in
//! memory and, when opened on a directory, mirrors every write to
//! `<dir>/<collection>.json`.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vahan_core::models::{RecordField, RecordFilter, SalesRecord, VehicleClass};
use vahan_core::{Result, VahanError};

// ── RecordStore ───────────────────────────────────────────────────────────────

/// Async access to the class-partitioned record collections.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Distinct values of `field`, sorted.
    async fn distinct(&self, class: VehicleClass, field: RecordField) -> Result<Vec<String>>;

    /// Number of records in the collection.
    async fn count(&self, class: VehicleClass) -> Result<usize>;

    /// Records passing `filter`, in insertion order, at most `limit` of them.
    async fn find(
        &self,
        class: VehicleClass,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SalesRecord>>;

    /// Remove records passing `filter`; returns how many were removed.
    async fn delete_many(&self, class: VehicleClass, filter: &RecordFilter) -> Result<usize>;

    /// Append `records`; returns how many were inserted.
    async fn insert_many(&self, class: VehicleClass, records: Vec<SalesRecord>) -> Result<usize>;
}

// ── LocalStore ────────────────────────────────────────────────────────────────

/// Modification time and length of a collection file, as last seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(metadata: &std::fs::Metadata) -> Option<Self> {
        Some(Self {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}

/// One class's records plus the stamp of the file they mirror.
#[derive(Debug, Default)]
struct Collection {
    records: Vec<SalesRecord>,
    stamp: Option<FileStamp>,
}

type Collections = HashMap<VehicleClass, Collection>;

/// In-process document store with optional JSON persistence.
///
/// A persisted store checks each collection file before every operation and
/// reloads it when another process (typically an `ingest` run) rewrote it.
pub struct LocalStore {
    collections: RwLock<Collections>,
    /// Directory mirrored on every write; `None` keeps data in memory only.
    data_dir: Option<PathBuf>,
}

impl LocalStore {
    /// Empty store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(Collections::new()),
            data_dir: None,
        }
    }

    /// Open the store persisted under `data_dir`, loading any collection
    /// file already present.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let mut collections = Collections::new();
        for class in VehicleClass::ALL {
            let path = Self::collection_file(data_dir, class);
            let Ok(metadata) = std::fs::metadata(&path) else {
                continue;
            };
            let content = std::fs::read_to_string(&path).map_err(|source| {
                VahanError::FileRead {
                    path: path.clone(),
                    source,
                }
            })?;
            let records: Vec<SalesRecord> = serde_json::from_str(&content)?;
            tracing::debug!(
                collection = class.collection_name(),
                records = records.len(),
                "loaded collection"
            );
            collections.insert(
                class,
                Collection {
                    records,
                    stamp: FileStamp::of(&metadata),
                },
            );
        }

        Ok(Self {
            collections: RwLock::new(collections),
            data_dir: Some(data_dir.to_path_buf()),
        })
    }

    /// Where the collection of `class` is persisted, if anywhere.
    pub fn collection_path(&self, class: VehicleClass) -> Option<PathBuf> {
        self.data_dir
            .as_deref()
            .map(|dir| Self::collection_file(dir, class))
    }

    fn collection_file(dir: &Path, class: VehicleClass) -> PathBuf {
        dir.join(format!("{}.json", class.collection_name()))
    }

    async fn current_stamp(path: &Path) -> Option<FileStamp> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        FileStamp::of(&metadata)
    }

    /// Reload the collection of `class` when its file no longer matches the
    /// stamp it was loaded or written with. A missing file keeps memory as is.
    async fn refresh(&self, class: VehicleClass) -> Result<()> {
        let Some(path) = self.collection_path(class) else {
            return Ok(());
        };
        let Some(stamp) = Self::current_stamp(&path).await else {
            return Ok(());
        };
        if self.collections.read().await.get(&class).and_then(|c| c.stamp) == Some(stamp) {
            return Ok(());
        }

        let mut collections = self.collections.write().await;
        let collection = collections.entry(class).or_default();
        if collection.stamp == Some(stamp) {
            return Ok(());
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| VahanError::FileRead {
                path: path.clone(),
                source,
            })?;
        let records: Vec<SalesRecord> = serde_json::from_str(&content)?;
        tracing::debug!(
            collection = class.collection_name(),
            records = records.len(),
            "reloaded collection after external write"
        );
        *collection = Collection {
            records,
            stamp: Some(stamp),
        };
        Ok(())
    }

    /// Write `records` to the collection file via a temp file and rename.
    /// Returns the stamp of the written file.
    async fn persist(
        &self,
        class: VehicleClass,
        records: &[SalesRecord],
    ) -> Result<Option<FileStamp>> {
        let Some(path) = self.collection_path(class) else {
            return Ok(None);
        };
        let json = serde_json::to_vec(records)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(Self::current_stamp(&path).await)
    }

    /// Persist `records` and only then make them the live collection, so a
    /// failed write leaves memory and disk in agreement.
    async fn replace(
        &self,
        collections: &mut Collections,
        class: VehicleClass,
        records: Vec<SalesRecord>,
    ) -> Result<()> {
        let stamp = self.persist(class, &records).await?;
        collections.insert(class, Collection { records, stamp });
        Ok(())
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn distinct(&self, class: VehicleClass, field: RecordField) -> Result<Vec<String>> {
        self.refresh(class).await?;
        let collections = self.collections.read().await;
        let values: BTreeSet<&str> = collections
            .get(&class)
            .into_iter()
            .flat_map(|c| &c.records)
            .map(|record| record.field(field))
            .collect();
        Ok(values.into_iter().map(str::to_string).collect())
    }

    async fn count(&self, class: VehicleClass) -> Result<usize> {
        self.refresh(class).await?;
        let collections = self.collections.read().await;
        Ok(collections.get(&class).map_or(0, |c| c.records.len()))
    }

    async fn find(
        &self,
        class: VehicleClass,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<SalesRecord>> {
        self.refresh(class).await?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&class)
            .into_iter()
            .flat_map(|c| &c.records)
            .filter(|record| filter.matches(record))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn delete_many(&self, class: VehicleClass, filter: &RecordFilter) -> Result<usize> {
        self.refresh(class).await?;
        let mut collections = self.collections.write().await;
        let current = collections
            .get(&class)
            .map(|c| c.records.as_slice())
            .unwrap_or_default();
        let kept: Vec<SalesRecord> = current
            .iter()
            .filter(|record| !filter.matches(record))
            .cloned()
            .collect();
        let deleted = current.len() - kept.len();
        if deleted > 0 {
            self.replace(&mut collections, class, kept).await?;
        }
        Ok(deleted)
    }

    async fn insert_many(&self, class: VehicleClass, records: Vec<SalesRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        self.refresh(class).await?;
        let mut collections = self.collections.write().await;
        let inserted = records.len();
        let mut updated = collections
            .get(&class)
            .map(|c| c.records.clone())
            .unwrap_or_default();
        updated.extend(records);
        self.replace(&mut collections, class, updated).await?;
        Ok(inserted)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

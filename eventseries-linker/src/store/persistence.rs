//! Blob persistence for the completion cache
//!
//! Two backends: one JSON file per blob under a directory, or a key-value
//! table in SQLite (same upsert pattern as the settings table).

use crate::error::LinkResult;
use async_trait::async_trait;
use eventseries_common::config::CacheBackendKind;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Named blob storage
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns `None` when nothing was stored under `name` yet
    async fn load_blob(&self, name: &str) -> LinkResult<Option<Vec<u8>>>;

    async fn store_blob(&self, name: &str, bytes: &[u8]) -> LinkResult<()>;
}

/// Stores each blob as `<dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl CacheBackend for FileBackend {
    async fn load_blob(&self, name: &str) -> LinkResult<Option<Vec<u8>>> {
        let path = self.blob_path(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cached blob yet");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn store_blob(&self, name: &str, bytes: &[u8]) -> LinkResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.blob_path(name);
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored blob");
        Ok(())
    }
}

/// Stores blobs in the `cache_blobs` table
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) the database file and ensure the table exists
    pub async fn open(db_path: &Path) -> LinkResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // mode=rwc: read, write, create
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        debug!("Connecting to database: {}", db_url);

        let pool = SqlitePool::connect(&db_url).await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> LinkResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_blobs (
                name TEXT PRIMARY KEY,
                content BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CacheBackend for SqliteBackend {
    async fn load_blob(&self, name: &str) -> LinkResult<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT content FROM cache_blobs WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(content,)| content))
    }

    async fn store_blob(&self, name: &str, bytes: &[u8]) -> LinkResult<()> {
        sqlx::query(
            "INSERT INTO cache_blobs (name, content, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET content = excluded.content,
                                             updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(bytes)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Open the configured backend under `root_folder`
pub async fn open_backend(
    kind: CacheBackendKind,
    root_folder: &Path,
) -> LinkResult<Box<dyn CacheBackend>> {
    match kind {
        CacheBackendKind::File => Ok(Box::new(FileBackend::new(root_folder.join("cache")))),
        CacheBackendKind::Sqlite => Ok(Box::new(
            SqliteBackend::open(&root_folder.join("eventseries.db")).await?,
        )),
    }
}

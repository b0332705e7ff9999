//! Store - SQLite persistence for social media posts
//!
//! Thin boundary around the SQLite engine: schema bootstrap, insert-or-skip
//! keyed on Post_ID, full scan, and verbatim read-query execution. The handle
//! is explicit and passed to every component; there is no global connection.

use crate::error::{Result, TrendError};
use crate::record::SocialMediaPost;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Handle to the posts database.
///
/// Constructed unconnected; every operation fails with
/// [`TrendError::Connection`] until [`PostStore::connect`] has been called.
/// `connect` and `disconnect` are both idempotent. The connection lives for
/// the life of the owning process and is closed only at shutdown.
pub struct PostStore {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl PostStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            conn: Mutex::new(None),
        }
    }

    /// Open the database. A second call on a connected store is a no-op.
    pub fn connect(&self) -> Result<()> {
        let mut guard = self.conn.lock().unwrap();
        if guard.is_some() {
            debug!("Database already connected");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    TrendError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(&self.path).map_err(|e| {
            TrendError::Connection(format!(
                "Failed to open database {}: {}",
                self.path.display(),
                e
            ))
        })?;
        *guard = Some(conn);
        info!("Connected to SQLite database: {}", self.path.display());
        Ok(())
    }

    /// Close the database. A no-op when already disconnected.
    pub fn disconnect(&self) {
        let mut guard = self.conn.lock().unwrap();
        if guard.take().is_some() {
            info!("Disconnected from SQLite database");
        }
    }

    /// Run `f` against the live connection, refusing if not connected.
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock().unwrap();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(TrendError::Connection(
                "Database not connected. Call connect() first.".to_string(),
            )),
        }
    }

    /// Create the posts table if absent. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS posts (
                    Post_ID TEXT PRIMARY KEY,
                    Platform TEXT,
                    Hashtag TEXT,
                    Content_Type TEXT,
                    Region TEXT,
                    Views INTEGER,
                    Likes INTEGER,
                    Shares INTEGER,
                    Comments INTEGER,
                    Engagement_Level TEXT,
                    Post_Date TEXT
                )
                "#,
                [],
            )
            .map_err(|e| TrendError::Query(format!("Failed to create posts table: {}", e)))?;
            Ok(())
        })
    }

    /// Whether the posts table exists and holds at least one row.
    ///
    /// Check-then-act: callers using this as an ingestion gate rely on a
    /// single ingesting process per store instance (no cross-process lock).
    pub fn has_data(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let table = conn.query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='posts'",
                [],
                |row| row.get::<_, String>(0),
            );
            match table {
                Ok(_) => {}
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(false),
                Err(e) => {
                    return Err(TrendError::Query(format!(
                        "Failed to check posts table existence: {}",
                        e
                    )))
                }
            }

            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
                .map_err(|e| TrendError::Query(format!("Failed to count posts: {}", e)))?;
            Ok(count > 0)
        })
    }

    /// Insert a post, silently skipping on a Post_ID conflict.
    ///
    /// Returns whether a row was actually written; a duplicate key returns
    /// `Ok(false)`, never an error.
    pub fn insert_if_absent(&self, post: &SocialMediaPost) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn
                .execute(
                    r#"
                    INSERT INTO posts (
                        Post_ID, Platform, Hashtag, Content_Type, Region,
                        Views, Likes, Shares, Comments, Engagement_Level, Post_Date
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(Post_ID) DO NOTHING
                    "#,
                    params![
                        post.post_id,
                        post.platform,
                        post.hashtag,
                        post.content_type,
                        post.region,
                        post.views,
                        post.likes,
                        post.shares,
                        post.comments,
                        post.engagement_level,
                        post.post_date,
                    ],
                )
                .map_err(|e| {
                    TrendError::Insert(format!("Failed to insert post {}: {}", post.post_id, e))
                })?;
            Ok(changed > 0)
        })
    }

    /// All persisted posts, in storage-native order. No ordering guarantee.
    pub fn scan_all(&self) -> Result<Vec<SocialMediaPost>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT Post_ID, Platform, Hashtag, Content_Type, Region,
                           Views, Likes, Shares, Comments, Engagement_Level, Post_Date
                    FROM posts
                    "#,
                )
                .map_err(|e| TrendError::Query(format!("Failed to prepare scan: {}", e)))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(SocialMediaPost {
                        post_id: row.get(0)?,
                        platform: row.get(1)?,
                        hashtag: row.get(2)?,
                        content_type: row.get(3)?,
                        region: row.get(4)?,
                        views: row.get(5)?,
                        likes: row.get(6)?,
                        shares: row.get(7)?,
                        comments: row.get(8)?,
                        engagement_level: row.get(9)?,
                        post_date: row.get(10)?,
                    })
                })
                .map_err(|e| TrendError::Query(format!("Failed to scan posts: {}", e)))?;

            let mut posts = Vec::new();
            for row in rows {
                posts.push(row.map_err(|e| TrendError::Query(format!("Failed to read row: {}", e)))?);
            }
            Ok(posts)
        })
    }

    /// Run caller-supplied SQL verbatim against the engine.
    ///
    /// Raw passthrough for a trusted/administrative caller: no validation is
    /// applied here beyond what SQLite itself enforces. Result rows are JSON
    /// objects keyed by result-column name, since a query need not produce
    /// post-shaped rows.
    pub fn execute_read_query(&self, sql: &str) -> Result<Vec<Value>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| TrendError::Query(format!("Failed to prepare query: {}", e)))?;

            let column_names: Vec<String> =
                stmt.column_names().iter().map(|s| s.to_string()).collect();

            let mut rows = stmt
                .query([])
                .map_err(|e| TrendError::Query(format!("Failed to execute query: {}", e)))?;

            let mut out = Vec::new();
            loop {
                let row = match rows.next() {
                    Ok(Some(row)) => row,
                    Ok(None) => break,
                    Err(e) => {
                        return Err(TrendError::Query(format!("Failed to read row: {}", e)))
                    }
                };

                let mut obj = Map::new();
                for (idx, name) in column_names.iter().enumerate() {
                    let value = match row.get_ref(idx).map_err(|e| {
                        TrendError::Query(format!("Failed to read column {}: {}", name, e))
                    })? {
                        ValueRef::Null => Value::Null,
                        ValueRef::Integer(i) => Value::Number(i.into()),
                        ValueRef::Real(f) => serde_json::Number::from_f64(f)
                            .map(Value::Number)
                            .unwrap_or(Value::Null),
                        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).to_string()),
                        ValueRef::Blob(_) => Value::Null,
                    };
                    obj.insert(name.clone(), value);
                }
                out.push(Value::Object(obj));
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_post(post_id: &str, platform: &str) -> SocialMediaPost {
        SocialMediaPost {
            post_id: post_id.to_string(),
            platform: platform.to_string(),
            hashtag: "#dance".to_string(),
            content_type: "Video".to_string(),
            region: "US".to_string(),
            views: 1000,
            likes: 200,
            shares: 30,
            comments: 12,
            engagement_level: "High".to_string(),
            post_date: "2025-01-15".to_string(),
        }
    }

    fn connected_store(dir: &TempDir) -> PostStore {
        let store = PostStore::new(dir.path().join("posts.db"));
        store.connect().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn test_operations_refused_before_connect() {
        let temp_dir = TempDir::new().unwrap();
        let store = PostStore::new(temp_dir.path().join("posts.db"));

        assert!(matches!(
            store.ensure_schema(),
            Err(TrendError::Connection(_))
        ));
        assert!(matches!(store.has_data(), Err(TrendError::Connection(_))));
        assert!(matches!(store.scan_all(), Err(TrendError::Connection(_))));
    }

    #[test]
    fn test_connect_twice_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = connected_store(&temp_dir);
        store.connect().unwrap();

        store.insert_if_absent(&sample_post("P1", "TikTok")).unwrap();
        assert_eq!(store.scan_all().unwrap().len(), 1);

        store.disconnect();
        store.disconnect();
    }

    #[test]
    fn test_duplicate_key_skipped_without_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = connected_store(&temp_dir);

        assert!(store.insert_if_absent(&sample_post("P1", "TikTok")).unwrap());
        assert!(!store
            .insert_if_absent(&sample_post("P1", "Instagram"))
            .unwrap());

        let posts = store.scan_all().unwrap();
        assert_eq!(posts.len(), 1);
        // First write wins; the duplicate never updates.
        assert_eq!(posts[0].platform, "TikTok");
    }

    #[test]
    fn test_has_data_transitions() {
        let temp_dir = TempDir::new().unwrap();
        let store = PostStore::new(temp_dir.path().join("posts.db"));
        store.connect().unwrap();

        // Table absent entirely.
        assert!(!store.has_data().unwrap());

        store.ensure_schema().unwrap();
        // Table present but empty.
        assert!(!store.has_data().unwrap());

        store.insert_if_absent(&sample_post("P1", "TikTok")).unwrap();
        assert!(store.has_data().unwrap());
    }

    #[test]
    fn test_ensure_schema_repeatable() {
        let temp_dir = TempDir::new().unwrap();
        let store = connected_store(&temp_dir);
        store.insert_if_absent(&sample_post("P1", "TikTok")).unwrap();

        store.ensure_schema().unwrap();
        assert_eq!(store.scan_all().unwrap().len(), 1);
    }

    #[test]
    fn test_execute_read_query_shapes_rows_by_query() {
        let temp_dir = TempDir::new().unwrap();
        let store = connected_store(&temp_dir);
        store.insert_if_absent(&sample_post("P1", "TikTok")).unwrap();
        store
            .insert_if_absent(&sample_post("P2", "Instagram"))
            .unwrap();

        let rows = store
            .execute_read_query("SELECT COUNT(*) AS n FROM posts")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["n"], serde_json::json!(2));

        let rows = store
            .execute_read_query("SELECT Post_ID, Views FROM posts WHERE Platform = 'TikTok'")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Post_ID"], serde_json::json!("P1"));
        assert_eq!(rows[0]["Views"], serde_json::json!(1000));
    }

    #[test]
    fn test_execute_read_query_malformed_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = connected_store(&temp_dir);

        let result = store.execute_read_query("SELEC * FROM posts");
        assert!(matches!(result, Err(TrendError::Query(_))));
    }
}

//! Semantic index over return-order projections.
//!
//! Stores one embedding per order in a SQLite table and answers queries with
//! a brute-force cosine scan. At the scale of a return-order database this
//! is faster than maintaining an ANN structure and keeps the index in the
//! same file as the row store, so a single database path configures the
//! whole data agent.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::{Connection, params};

use crate::embedding::{Embedder, bytes_to_embedding, cosine_similarity, embedding_to_bytes};
use crate::error::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS index_entries (
    order_id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL
);
";

/// Handle to the embedding table of a SQLite database.
///
/// Clones share the embedder and open fresh connections per call, the same
/// pattern as [`RowStore`](crate::storage::RowStore).
#[derive(Clone)]
pub struct SemanticIndex {
    path: PathBuf,
    embedder: Arc<dyn Embedder>,
}

impl fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("path", &self.path)
            .field("embedder", &self.embedder.id())
            .finish()
    }
}

impl SemanticIndex {
    /// Opens the index at `path`, creating the schema if needed.
    pub fn open(path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Result<Self, StorageError> {
        let index = Self {
            path: path.into(),
            embedder,
        };
        index.connect()?.execute_batch(SCHEMA)?;
        Ok(index)
    }

    fn connect(&self) -> Result<Connection, StorageError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Inserts or replaces the entry for `order_id`.
    ///
    /// Replacement makes the write idempotent, which both re-seeding and
    /// journal replay rely on.
    pub fn upsert(&self, order_id: &str, content: &str) -> Result<(), StorageError> {
        let embedding = embedding_to_bytes(&self.embedder.embed(content));
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO index_entries (order_id, content, embedding) VALUES (?1, ?2, ?3)",
            params![order_id, content, embedding],
        )?;
        Ok(())
    }

    /// Returns the `k_n` most similar entries to `query`, joined by blank
    /// lines. An empty index or `k_n == 0` yields an empty string.
    pub fn search(&self, query: &str, k_n: usize) -> Result<String, StorageError> {
        let query_embedding = self.embedder.embed(query);
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT content, embedding FROM index_entries")?;
        let rows = stmt.query_map([], |row| {
            let content: String = row.get(0)?;
            let blob: Vec<u8> = row.get(1)?;
            Ok((content, blob))
        })?;

        let mut scored: Vec<(f32, String)> = Vec::new();
        for row in rows {
            let (content, blob) = row?;
            let score = cosine_similarity(&query_embedding, &bytes_to_embedding(&blob));
            scored.push((score, content));
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let chunks: Vec<String> = scored
            .into_iter()
            .take(k_n)
            .map(|(_, content)| content)
            .collect();
        Ok(chunks.join("\n\n"))
    }

    /// Number of indexed entries.
    pub fn entry_count(&self) -> Result<usize, StorageError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM index_entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::embedding::create_embedder;
    use tempfile::TempDir;

    fn open_index(dir: &TempDir) -> SemanticIndex {
        SemanticIndex::open(dir.path().join("orders.db"), create_embedder())
            .unwrap_or_else(|e| panic!("open failed: {e}"))
    }

    fn temp_dir() -> TempDir {
        tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"))
    }

    #[test]
    fn search_returns_most_similar_entry_first() {
        let dir = temp_dir();
        let index = open_index(&dir);
        index
            .upsert("1001", "product: Laptop\nreturn_reason: cracked screen")
            .unwrap_or_else(|e| panic!("upsert failed: {e}"));
        index
            .upsert("1002", "product: Blender\nreturn_reason: wrong color")
            .unwrap_or_else(|e| panic!("upsert failed: {e}"));

        let result = index
            .search("cracked laptop screen", 1)
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert!(result.contains("Laptop"), "got: {result}");
        assert!(!result.contains("Blender"));
    }

    #[test]
    fn search_caps_results_at_k_n() {
        let dir = temp_dir();
        let index = open_index(&dir);
        for id in 0..5 {
            index
                .upsert(&format!("10{id}"), &format!("product: Widget{id}"))
                .unwrap_or_else(|e| panic!("upsert failed: {e}"));
        }

        let result = index
            .search("widget", 2)
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert_eq!(result.split("\n\n").count(), 2);
    }

    #[test]
    fn empty_index_yields_empty_string() {
        let dir = temp_dir();
        let index = open_index(&dir);
        let result = index
            .search("anything", 10)
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert_eq!(result, "");
    }

    #[test]
    fn zero_k_n_yields_empty_string() {
        let dir = temp_dir();
        let index = open_index(&dir);
        index
            .upsert("1001", "product: Laptop")
            .unwrap_or_else(|e| panic!("upsert failed: {e}"));
        let result = index
            .search("laptop", 0)
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert_eq!(result, "");
    }

    #[test]
    fn upsert_replaces_instead_of_duplicating() {
        let dir = temp_dir();
        let index = open_index(&dir);
        index
            .upsert("1001", "product: Laptop")
            .unwrap_or_else(|e| panic!("upsert failed: {e}"));
        index
            .upsert("1001", "product: Laptop Pro")
            .unwrap_or_else(|e| panic!("upsert failed: {e}"));

        assert_eq!(
            index
                .entry_count()
                .unwrap_or_else(|e| panic!("count failed: {e}")),
            1
        );
        let result = index
            .search("laptop", 10)
            .unwrap_or_else(|e| panic!("search failed: {e}"));
        assert_eq!(result, "product: Laptop Pro");
    }
}

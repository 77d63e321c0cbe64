mod schema;
pub mod ids;
pub mod projector;
pub mod store;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

pub use ids::{IdAllocator, ItemNumMap};
pub use projector::{FeedSummary, SqlProjector};
pub use schema::{SCHEMA, TABLES};
pub use store::StoreReader;

/// Destination relational store.
pub struct Database {
    pub(crate) conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!("Opened database at {:?}", path);
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    // Category and media rows are replaced by delete + insert while tags,
    // associations and drawings still point at them.
    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(Self { conn })
    }

    /// Create any missing tables. Never touches existing data.
    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Drop every managed table.
    pub fn drop_schema(&self) -> Result<()> {
        for table in TABLES {
            debug!("Dropping table {}", table);
            self.conn.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
        }
        Ok(())
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}

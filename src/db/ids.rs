//! Surrogate id assignment.
//!
//! The destination tables have no sequences of their own. Ids are handed out
//! here, keyed by each entity's natural identity, and seeded from the rows
//! already in the database so a second import reuses the ids of the first.

use anyhow::Result;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::Database;
use crate::model::join_path;

/// Natural identity of a tag: (category name, item label).
pub type TagKey = (String, String);

/// Map from natural identity to surrogate id.
#[derive(Debug, Clone)]
pub struct ItemNumMap<K> {
    nums: HashMap<K, i64>,
    max: i64,
}

impl<K> Default for ItemNumMap<K> {
    fn default() -> Self {
        Self {
            nums: HashMap::new(),
            max: 0,
        }
    }
}

impl<K: Eq + Hash> ItemNumMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number for `key`: the cached one if `key` was seen before, otherwise
    /// one more than the largest number handed out so far.
    pub fn num_for<Q>(&mut self, key: &Q) -> i64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(&id) = self.nums.get(key) {
            return id;
        }
        self.max += 1;
        self.nums.insert(key.to_owned(), self.max);
        self.max
    }

    pub fn get<Q>(&self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.nums.get(key).copied()
    }

    /// Record an existing (key, id) pair.
    pub fn insert(&mut self, key: K, id: i64) {
        self.reserve(id);
        self.nums.insert(key, id);
    }

    /// Make sure `id` is never handed out for a new key.
    pub fn reserve(&mut self, id: i64) {
        self.max = self.max.max(id);
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn len(&self) -> usize {
        self.nums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nums.is_empty()
    }

    pub fn clear(&mut self) {
        self.nums.clear();
        self.max = 0;
    }
}

/// Id maps for every kind of row the projector writes.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    pub dirs: ItemNumMap<String>,
    pub categories: ItemNumMap<String>,
    pub tags: ItemNumMap<TagKey>,
    pub media: ItemNumMap<String>,
    last_drawing: i64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the maps from the rows currently in `db`.
    pub fn from_database(db: &Database) -> Result<Self> {
        let conn = db.conn();
        let mut ids = Self::new();

        let mut stmt = conn.prepare("SELECT id, path FROM dir")?;
        for row in stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))? {
            let (id, path) = row?;
            ids.dirs.insert(path, id);
        }

        let mut stmt = conn.prepare("SELECT id, name FROM category")?;
        for row in stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))? {
            let (id, name) = row?;
            ids.categories.insert(name, id);
        }

        let mut stmt = conn.prepare(
            "SELECT tag.id, category.name, tag.name
             FROM tag JOIN category ON category.id = tag.categoryid",
        )?;
        for row in stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })? {
            let (id, category, name) = row?;
            ids.tags.insert((category, name), id);
        }

        let mut stmt = conn.prepare(
            "SELECT media.id, dir.path, media.filename
             FROM media JOIN dir ON dir.id = media.dirid",
        )?;
        for row in stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })? {
            let (id, dir, filename) = row?;
            ids.media.insert(join_path(&dir, &filename), id);
        }

        // Rows that could not be keyed above (e.g. tags of a deleted
        // category) still occupy their ids.
        let max_id = |table: &str| -> Result<i64> {
            let max = conn.query_row(&format!("SELECT COALESCE(MAX(id), 0) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(max)
        };
        ids.dirs.reserve(max_id("dir")?);
        ids.categories.reserve(max_id("category")?);
        ids.tags.reserve(max_id("tag")?);
        ids.media.reserve(max_id("media")?);
        ids.last_drawing = max_id("drawing")?;

        Ok(ids)
    }

    /// Drawings have no natural identity; every row gets a fresh id.
    pub fn next_drawing_id(&mut self) -> i64 {
        self.last_drawing += 1;
        self.last_drawing
    }

    pub fn clear(&mut self) {
        self.dirs.clear();
        self.categories.clear();
        self.tags.clear();
        self.media.clear();
        self.last_drawing = 0;
    }
}

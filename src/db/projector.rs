//! Writes the in-memory model into the relational tables.
//!
//! Category and media rows are replaced wholesale (delete, then insert) on
//! every import, so re-importing a changed index.xml converges to its
//! current content. Every other row is only inserted when missing, which
//! makes running the same import twice a no-op.

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info, warn};

use super::{Database, IdAllocator, TABLES};
use crate::model::{split_path, BlockItem, Category, MediaItem, MemberGroup, FOLDER_CATEGORY};
use crate::reader::dates::{format_date, format_timestamp};
use crate::reader::DatabaseReader;

/// Number of entities copied by [`SqlProjector::feed_from`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub categories: usize,
    pub media_items: usize,
    pub member_groups: usize,
    pub block_items: usize,
}

pub struct SqlProjector<'a> {
    db: &'a Database,
    ids: IdAllocator,
}

impl<'a> SqlProjector<'a> {
    /// Create missing tables and seed the id maps from existing rows.
    pub fn new(db: &'a Database) -> Result<Self> {
        db.initialize()?;
        let ids = IdAllocator::from_database(db)?;
        Ok(Self::with_ids(db, ids))
    }

    /// Use an explicitly prepared allocator. The schema must already exist.
    pub fn with_ids(db: &'a Database, ids: IdAllocator) -> Self {
        Self { db, ids }
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Pure existence check: is there a row in `table` with `column = value`?
    fn table_has(&self, table: &str, column: &str, value: i64) -> Result<bool> {
        let found = self
            .db
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE {} = ?1 LIMIT 1", table, column),
                [value],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ========================================================================
    // Inserts
    // ========================================================================

    /// Insert (or replace) a category row and make sure all its items exist
    /// as tags.
    pub fn insert_category(&mut self, category: &Category) -> Result<i64> {
        let cid = self.ids.categories.num_for(category.name.as_str());
        let conn = &self.db.conn;
        conn.execute("DELETE FROM category WHERE id = ?1", [cid])?;
        conn.execute(
            "INSERT INTO category (id, name, icon, visible, viewtype, thumbsize)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                cid,
                category.name,
                category.icon,
                category.visible,
                category.view_type.as_i32(),
                category.thumbnail_size,
            ],
        )
        .with_context(|| format!("Failed to insert category {:?}", category.name))?;

        if category.is_folder() {
            debug!("Category {} ({}) written without items", category.name, cid);
            return Ok(cid);
        }

        for (&local_id, label) in &category.items {
            let tid = self.insert_tag(&category.name, label)?;
            let birthdate = category.birth_date(local_id).as_ref().map(format_date);
            self.db.conn.execute(
                "UPDATE tag SET birthdate = ?1 WHERE id = ?2",
                params![birthdate, tid],
            )?;
        }

        debug!("Inserted category {} ({}) with {} items", category.name, cid, category.items.len());
        Ok(cid)
    }

    /// Make sure a tag row exists for (category, name), creating a bare
    /// category row too if the category has not been inserted yet.
    pub fn insert_tag(&mut self, category: &str, name: &str) -> Result<i64> {
        let tid = self.ids.tags.num_for(&(category.to_string(), name.to_string()));
        if !self.table_has("tag", "id", tid)? {
            let cid = self.ids.categories.num_for(category);
            if !self.table_has("category", "id", cid)? {
                self.db.conn.execute(
                    "INSERT INTO category (id, name) VALUES (?1, ?2)",
                    params![cid, category],
                )?;
            }
            self.db
                .conn
                .execute(
                    "INSERT INTO tag (id, categoryid, name) VALUES (?1, ?2, ?3)",
                    params![tid, cid, name],
                )
                .with_context(|| format!("Failed to insert tag {}/{}", category, name))?;
        }
        Ok(tid)
    }

    fn insert_dir(&mut self, path: &str) -> Result<i64> {
        let id = self.ids.dirs.num_for(path);
        if !self.table_has("dir", "id", id)? {
            self.db
                .conn
                .execute("INSERT INTO dir (id, path) VALUES (?1, ?2)", params![id, path])?;
        }
        Ok(id)
    }

    /// Insert (or replace) a media item with its tags and drawings.
    pub fn insert_media_item(&mut self, item: &MediaItem) -> Result<i64> {
        let mid = self.ids.media.num_for(item.path.as_str());
        let dir_id = self.insert_dir(item.directory())?;

        let conn = &self.db.conn;
        conn.execute("DELETE FROM media WHERE id = ?1", [mid])?;
        conn.execute(
            "INSERT INTO media (id, dirid, filename, md5sum, type, label, description,
                                starttime, endtime, width, height, angle)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                mid,
                dir_id,
                item.file_name(),
                item.md5sum,
                item.kind.as_str(),
                item.label,
                item.description,
                item.start_time.as_ref().map(format_timestamp),
                item.end_time.as_ref().map(format_timestamp),
                item.width,
                item.height,
                item.angle,
            ],
        )
        .with_context(|| format!("Failed to insert media item {:?}", item.path))?;

        for tag in &item.tags {
            if tag.category() == FOLDER_CATEGORY {
                continue;
            }
            let tid = self.insert_tag(tag.category(), tag.name())?;
            self.insert_media_tag(mid, tid, tag.area())?;
        }

        // Drawings are always replaced, never merged. The ids of the old rows
        // are handed out again in order so an unchanged item keeps its rows.
        let mut reused = {
            let mut stmt = self
                .db
                .conn
                .prepare("SELECT id FROM drawing WHERE mediaid = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map([mid], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids.into_iter()
        };
        self.db.conn.execute("DELETE FROM drawing WHERE mediaid = ?1", [mid])?;
        for drawing in &item.drawings {
            let id = match reused.next() {
                Some(id) => id,
                None => self.ids.next_drawing_id(),
            };
            self.db.conn.execute(
                "INSERT INTO drawing (id, mediaid, shape, x0, y0, x1, y1)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id,
                    mid,
                    drawing.shape.code(),
                    drawing.start.x,
                    drawing.start.y,
                    drawing.end.x,
                    drawing.end.y,
                ],
            )?;
        }

        debug!("Inserted media item {} ({})", item.path, mid);
        Ok(mid)
    }

    fn insert_media_tag(&self, media_id: i64, tag_id: i64, area: Option<&str>) -> Result<()> {
        let exists = self
            .db
            .conn
            .query_row(
                "SELECT 1 FROM media_tag WHERE mediaid = ?1 AND tagid = ?2",
                [media_id, tag_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            self.db.conn.execute(
                "INSERT INTO media_tag (mediaid, tagid, area) VALUES (?1, ?2, ?3)",
                params![media_id, tag_id, area],
            )?;
        }
        Ok(())
    }

    /// Flag the group's tag as a group and relate it to each member tag.
    ///
    /// Returns the group's tag id, or `None` for a group in the Folder
    /// category, which is never written.
    pub fn insert_member_group(&mut self, group: &MemberGroup) -> Result<Option<i64>> {
        if group.category() == FOLDER_CATEGORY {
            warn!("Ignoring member group {} in the {} category", group.name(), FOLDER_CATEGORY);
            return Ok(None);
        }

        let gid = self.insert_tag(group.category(), group.name())?;
        self.db
            .conn
            .execute("UPDATE tag SET isgroup = 1 WHERE id = ?1", [gid])?;

        for member in &group.members {
            let mid = self.insert_tag(group.category(), member)?;
            let exists = self
                .db
                .conn
                .query_row(
                    "SELECT 1 FROM tag_relation WHERE grouptag = ?1 AND membertag = ?2",
                    [gid, mid],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                self.db.conn.execute(
                    "INSERT INTO tag_relation (grouptag, membertag) VALUES (?1, ?2)",
                    [gid, mid],
                )?;
            }
        }

        debug!("Inserted member group {}/{} ({})", group.category(), group.name(), gid);
        Ok(Some(gid))
    }

    pub fn insert_block_item(&mut self, item: &BlockItem) -> Result<()> {
        let (dir, file) = split_path(&item.path);
        let dir_id = self.insert_dir(dir)?;
        self.db.conn.execute(
            "INSERT INTO blockitem (dirid, filename)
             SELECT ?1, ?2
             WHERE NOT EXISTS (SELECT 1 FROM blockitem WHERE dirid = ?1 AND filename = ?2)",
            params![dir_id, file],
        )?;
        Ok(())
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Remove a category, its tags and everything referring to them.
    pub fn delete_category(&mut self, category_id: i64) -> Result<()> {
        let conn = &self.db.conn;
        conn.execute(
            "DELETE FROM tag_relation
             WHERE grouptag IN (SELECT id FROM tag WHERE categoryid = ?1)
                OR membertag IN (SELECT id FROM tag WHERE categoryid = ?1)",
            [category_id],
        )?;
        conn.execute(
            "DELETE FROM media_tag WHERE tagid IN (SELECT id FROM tag WHERE categoryid = ?1)",
            [category_id],
        )?;
        conn.execute("DELETE FROM tag WHERE categoryid = ?1", [category_id])?;
        conn.execute("DELETE FROM category WHERE id = ?1", [category_id])?;
        Ok(())
    }

    /// Remove a media item with its tag associations and drawings.
    pub fn delete_media_item(&mut self, media_id: i64) -> Result<()> {
        let conn = &self.db.conn;
        conn.execute("DELETE FROM media_tag WHERE mediaid = ?1", [media_id])?;
        conn.execute("DELETE FROM drawing WHERE mediaid = ?1", [media_id])?;
        conn.execute("DELETE FROM media WHERE id = ?1", [media_id])?;
        Ok(())
    }

    /// Dissolve a member group. The group's tag itself stays.
    pub fn delete_member_group(&mut self, group_tag_id: i64) -> Result<()> {
        let conn = &self.db.conn;
        conn.execute("DELETE FROM tag_relation WHERE grouptag = ?1", [group_tag_id])?;
        conn.execute("UPDATE tag SET isgroup = 0 WHERE id = ?1", [group_tag_id])?;
        Ok(())
    }

    pub fn delete_block_item(&mut self, path: &str) -> Result<()> {
        let (dir, file) = split_path(path);
        if let Some(dir_id) = self.ids.dirs.get(dir) {
            self.db.conn.execute(
                "DELETE FROM blockitem WHERE dirid = ?1 AND filename = ?2",
                params![dir_id, file],
            )?;
        }
        Ok(())
    }

    /// Empty every managed table and forget all ids.
    pub fn clear(&mut self) -> Result<()> {
        for table in TABLES {
            self.db.conn.execute(&format!("DELETE FROM {}", table), [])?;
        }
        self.ids.clear();
        info!("Cleared all tables");
        Ok(())
    }

    // ========================================================================
    // Bulk copy
    // ========================================================================

    /// Copy everything from `reader`.
    ///
    /// Categories go first, then media items, member groups and block items,
    /// since later entities refer to tags created by earlier ones.
    /// `progress` is called after each media item with the number copied so
    /// far.
    pub fn feed_from<R, F>(&mut self, reader: &R, mut progress: F) -> Result<FeedSummary>
    where
        R: DatabaseReader + ?Sized,
        F: FnMut(usize),
    {
        let mut summary = FeedSummary::default();

        for category in reader.categories() {
            self.insert_category(category)?;
            summary.categories += 1;
        }
        for item in reader.media_items() {
            self.insert_media_item(item)?;
            summary.media_items += 1;
            progress(summary.media_items);
        }
        for group in reader.member_groups() {
            if self.insert_member_group(group)?.is_some() {
                summary.member_groups += 1;
            }
        }
        for block in reader.block_items() {
            self.insert_block_item(block)?;
            summary.block_items += 1;
        }

        info!(
            "Copied {} categories, {} media items, {} member groups, {} block items",
            summary.categories, summary.media_items, summary.member_groups, summary.block_items
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Drawing, Point, Shape, Tag, ViewType};
    use crate::reader::{ReaderError, XmlDatabase};
    use chrono::NaiveDate;

    fn new_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn dump(db: &Database) -> Vec<String> {
        let mut rows = Vec::new();
        for table in TABLES {
            let mut stmt = db
                .conn
                .prepare(&format!("SELECT * FROM {} ORDER BY 1, 2", table))
                .unwrap();
            let columns = stmt.column_count();
            let mut query = stmt.query([]).unwrap();
            while let Some(row) = query.next().unwrap() {
                let values: Vec<String> = (0..columns)
                    .map(|i| format!("{:?}", row.get_ref(i).unwrap()))
                    .collect();
                rows.push(format!("{}: {}", table, values.join(", ")));
            }
        }
        rows
    }

    fn tag_id(db: &Database, category: &str, name: &str) -> Option<i64> {
        db.conn
            .query_row(
                "SELECT tag.id FROM tag JOIN category ON category.id = tag.categoryid
                 WHERE category.name = ?1 AND tag.name = ?2",
                [category, name],
                |row| row.get(0),
            )
            .optional()
            .unwrap()
    }

    fn import(db: &Database, text: &str) -> FeedSummary {
        let reader = XmlDatabase::parse(text).unwrap();
        let mut projector = SqlProjector::new(db).unwrap();
        projector.feed_from(&reader, |_| {}).unwrap()
    }

    const DOCUMENT: &str = r#"<KPhotoAlbum version="4">
  <Categories>
    <Category name="People" icon="people" show="1" viewtype="0" thumbnailsize="32">
      <value value="Alice" id="1" birthDate="1980-05-17"/>
      <value value="Bob" id="2"/>
    </Category>
    <Category name="Folder" icon="folder" show="0" viewtype="0" thumbnailsize="32">
      <value value="2015" id="1"/>
    </Category>
  </Categories>
  <images>
    <image file="2015/a.jpg" md5sum="0123456789abcdef0123456789abcdef" label="a" description=""
           startDate="2015-03-21T18:04:05" endDate="" width="-1" height="-1" angle="0">
      <options>
        <option name="People"><value value="Alice" area="1 1 5 5"/><value value="Carol"/></option>
        <option name="Folder"><value value="2015"/></option>
      </options>
      <drawings>
        <Line _startPos.x="0" _startPos.y="0" _lastPos.x="10" _lastPos.y="10"/>
        <Circle _startPos.x="3" _startPos.y="3" _lastPos.x="6" _lastPos.y="6"/>
      </drawings>
    </image>
  </images>
  <member-groups>
    <member category="People" group-name="Family" member="Alice"/>
    <member category="People" group-name="Family" member="Bob"/>
  </member-groups>
  <blocklist><block file="2015/thumbs.db"/></blocklist>
</KPhotoAlbum>"#;

    #[test]
    fn test_feed_from_copies_everything() {
        let db = new_db();
        let summary = import(&db, DOCUMENT);
        assert_eq!(
            summary,
            FeedSummary { categories: 2, media_items: 1, member_groups: 1, block_items: 1 }
        );

        assert_eq!(db.count_rows("media").unwrap(), 1);
        assert_eq!(db.count_rows("media_tag").unwrap(), 2);
        assert_eq!(db.count_rows("drawing").unwrap(), 2);
        assert_eq!(db.count_rows("tag_relation").unwrap(), 2);
        assert_eq!(db.count_rows("blockitem").unwrap(), 1);

        let birthdate: Option<String> = db
            .conn
            .query_row("SELECT birthdate FROM tag WHERE name = 'Alice'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(birthdate.as_deref(), Some("1980-05-17"));

        let area: Option<String> = db
            .conn
            .query_row(
                "SELECT area FROM media_tag WHERE tagid = ?1",
                [tag_id(&db, "People", "Alice").unwrap()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(area.as_deref(), Some("1 1 5 5"));

        // Tags used on images but not declared in the category still get a row
        assert!(tag_id(&db, "People", "Carol").is_some());
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let db = new_db();
        import(&db, DOCUMENT);
        let first = dump(&db);
        import(&db, DOCUMENT);
        assert_eq!(dump(&db), first);
    }

    #[test]
    fn test_ids_are_stable_across_runs() {
        let db = new_db();
        import(&db, DOCUMENT);
        let alice = tag_id(&db, "People", "Alice").unwrap();

        let other = r#"<KPhotoAlbum version="4">
  <Categories>
    <Category name="Places" icon="" show="1" viewtype="0" thumbnailsize="32">
      <value value="Paris" id="1"/>
    </Category>
    <Category name="People" icon="people" show="1" viewtype="0" thumbnailsize="32">
      <value value="Zoe" id="1"/>
      <value value="Alice" id="2"/>
    </Category>
  </Categories>
  <images>
    <image file="b.jpg" md5sum="" label="" description="" startDate="" endDate="" width="1" height="1" angle="0"/>
  </images>
</KPhotoAlbum>"#;
        import(&db, other);
        assert_eq!(tag_id(&db, "People", "Alice"), Some(alice));

        import(&db, DOCUMENT);
        assert_eq!(tag_id(&db, "People", "Alice"), Some(alice));
        assert_eq!(db.count_rows("media").unwrap(), 2);
    }

    #[test]
    fn test_compressed_and_uncompressed_project_the_same_association() {
        let compressed = r#"<KPhotoAlbum version="6" compressed="1">
  <Categories><Category name="Colors" icon="" show="1" viewtype="0" thumbnailsize="32"><value value="Red" id="1"/></Category></Categories>
  <images><image file="x.jpg" md5sum="" width="1" height="1" angle="0" Colors="1"/></images>
</KPhotoAlbum>"#;
        let uncompressed = r#"<KPhotoAlbum version="6" compressed="0">
  <Categories><Category name="Colors" icon="" show="1" viewtype="0" thumbnailsize="32"><value value="Red" id="1"/></Category></Categories>
  <images><image file="x.jpg" md5sum="" width="1" height="1" angle="0">
    <options><option name="Colors"><value value="Red"/></option></options>
  </image></images>
</KPhotoAlbum>"#;

        let a = new_db();
        import(&a, compressed);
        let b = new_db();
        import(&b, uncompressed);

        assert_eq!(dump(&a), dump(&b));
        assert_eq!(a.count_rows("media_tag").unwrap(), 1);
    }

    #[test]
    fn test_folder_category_produces_no_tags() {
        let db = new_db();
        import(&db, DOCUMENT);
        let folder_tags: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM tag JOIN category ON category.id = tag.categoryid
                 WHERE category.name = ?1",
                [FOLDER_CATEGORY],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(folder_tags, 0);

        let mut projector = SqlProjector::new(&db).unwrap();
        let mut item = MediaItem::new("c.jpg");
        item.add_tag(Tag::new(FOLDER_CATEGORY, "2015"));
        projector.insert_media_item(&item).unwrap();
        assert_eq!(tag_id(&db, FOLDER_CATEGORY, "2015"), None);
    }

    #[test]
    fn test_unknown_dimensions_are_null() {
        let db = new_db();
        import(&db, DOCUMENT);
        let (width, height): (Option<i64>, Option<i64>) = db
            .conn
            .query_row("SELECT width, height FROM media", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert_eq!((width, height), (None, None));
    }

    #[test]
    fn test_drawings_are_replaced() {
        let db = new_db();
        let mut projector = SqlProjector::new(&db).unwrap();

        let mut item = MediaItem::new("a.jpg");
        item.add_drawing(Drawing::new(Shape::Line, Point::new(0, 0), Point::new(1, 1)));
        item.add_drawing(Drawing::new(Shape::Circle, Point::new(2, 2), Point::new(3, 3)));
        let id = projector.insert_media_item(&item).unwrap();
        assert_eq!(db.count_rows("drawing").unwrap(), 2);

        let first: i64 = db
            .conn
            .query_row("SELECT MIN(id) FROM drawing", [], |row| row.get(0))
            .unwrap();

        item.drawings.truncate(1);
        assert_eq!(projector.insert_media_item(&item).unwrap(), id);

        let rows: Vec<(i64, i32)> = {
            let mut stmt = db
                .conn
                .prepare("SELECT id, shape FROM drawing WHERE mediaid = ?1")
                .unwrap();
            stmt.query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))
                .unwrap()
                .collect::<rusqlite::Result<_>>()
                .unwrap()
        };
        assert_eq!(rows, vec![(first, Shape::Line.code())]);
    }

    #[test]
    fn test_drawing_ids_survive_reimport() {
        let drawing_ids = |db: &Database| -> Vec<i64> {
            let mut stmt = db.conn.prepare("SELECT id FROM drawing ORDER BY id").unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .collect::<rusqlite::Result<_>>()
                .unwrap()
        };

        let db = new_db();
        import(&db, DOCUMENT);
        let first = drawing_ids(&db);
        assert_eq!(first.len(), 2);

        import(&db, DOCUMENT);
        assert_eq!(drawing_ids(&db), first);
    }

    #[test]
    fn test_folder_member_groups_are_not_written() {
        let db = new_db();
        let mut projector = SqlProjector::new(&db).unwrap();
        let mut group = MemberGroup::new(FOLDER_CATEGORY, "Holidays");
        group.add_member("2015");
        assert_eq!(projector.insert_member_group(&group).unwrap(), None);
        assert_eq!(db.count_rows("tag").unwrap(), 0);
        assert_eq!(db.count_rows("tag_relation").unwrap(), 0);

        for text in [
            r#"<KPhotoAlbum version="6" compressed="0">
  <Categories><Category name="Folder" icon="" show="0" viewtype="0" thumbnailsize="32"><value value="2015" id="1"/></Category></Categories>
  <member-groups><member category="Folder" group-name="Holidays" member="2015"/></member-groups>
</KPhotoAlbum>"#,
            r#"<KPhotoAlbum version="6" compressed="1">
  <Categories><Category name="Folder" icon="" show="0" viewtype="0" thumbnailsize="32"><value value="2015" id="1"/></Category></Categories>
  <member-groups><member category="Folder" group-name="Holidays" members="1"/></member-groups>
</KPhotoAlbum>"#,
        ] {
            let db = new_db();
            let summary = import(&db, text);
            assert_eq!(summary.member_groups, 0);
            assert_eq!(db.count_rows("tag").unwrap(), 0);
            assert_eq!(db.count_rows("tag_relation").unwrap(), 0);
        }
    }

    #[test]
    fn test_birth_date_is_cleared_on_reinsert() {
        let db = new_db();
        let mut projector = SqlProjector::new(&db).unwrap();
        let mut people = Category::new("People", "", true, ViewType::TreeView, 32);
        people.add_item(1, "Alice", NaiveDate::from_ymd_opt(1980, 5, 17));
        projector.insert_category(&people).unwrap();

        let birthdate = |db: &Database| -> Option<String> {
            db.conn
                .query_row("SELECT birthdate FROM tag WHERE name = 'Alice'", [], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(birthdate(&db).as_deref(), Some("1980-05-17"));

        people.birth_dates.clear();
        projector.insert_category(&people).unwrap();
        assert_eq!(birthdate(&db), None);
    }

    #[test]
    fn test_unsupported_version_writes_nothing() {
        let db = new_db();
        let result = XmlDatabase::parse(r#"<KPhotoAlbum version="99"><images><image file="a.jpg"/></images></KPhotoAlbum>"#);
        assert!(matches!(result, Err(ReaderError::UnsupportedFormat(_))));
        assert!(dump(&db).is_empty());
    }

    #[test]
    fn test_member_group_flags_and_relations() {
        let db = new_db();
        let mut projector = SqlProjector::new(&db).unwrap();
        let mut group = MemberGroup::new("People", "Family");
        group.add_member("Alice");
        group.add_member("Bob");
        group.add_member("Alice");

        let gid = projector.insert_member_group(&group).unwrap().unwrap();
        assert_eq!(projector.insert_member_group(&group).unwrap(), Some(gid));

        let isgroup: bool = db
            .conn
            .query_row("SELECT isgroup FROM tag WHERE id = ?1", [gid], |row| row.get(0))
            .unwrap();
        assert!(isgroup);
        assert_eq!(db.count_rows("tag_relation").unwrap(), 2);
        // Category row created on demand
        assert_eq!(db.count_rows("category").unwrap(), 1);

        projector.delete_member_group(gid).unwrap();
        assert_eq!(db.count_rows("tag_relation").unwrap(), 0);
    }

    #[test]
    fn test_category_reinsert_replaces_attributes() {
        let db = new_db();
        let mut projector = SqlProjector::new(&db).unwrap();
        let mut category = Category::new("People", "old", true, ViewType::TreeView, 32);
        category.add_item(1, "Alice", None);
        let cid = projector.insert_category(&category).unwrap();

        category.icon = "new".to_string();
        category.view_type = ViewType::IconView;
        assert_eq!(projector.insert_category(&category).unwrap(), cid);

        let (icon, viewtype): (String, i32) = db
            .conn
            .query_row("SELECT icon, viewtype FROM category WHERE id = ?1", [cid], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(icon, "new");
        assert_eq!(viewtype, ViewType::IconView.as_i32());
        assert_eq!(db.count_rows("category").unwrap(), 1);
        assert_eq!(db.count_rows("tag").unwrap(), 1);
    }

    #[test]
    fn test_clear_and_deletes() {
        let db = new_db();
        import(&db, DOCUMENT);
        let mut projector = SqlProjector::new(&db).unwrap();

        let media_id = projector.ids().media.get("2015/a.jpg").unwrap();
        projector.delete_media_item(media_id).unwrap();
        assert_eq!(db.count_rows("media").unwrap(), 0);
        assert_eq!(db.count_rows("drawing").unwrap(), 0);
        assert_eq!(db.count_rows("media_tag").unwrap(), 0);

        projector.delete_block_item("2015/thumbs.db").unwrap();
        assert_eq!(db.count_rows("blockitem").unwrap(), 0);

        let people = projector.ids().categories.get("People").unwrap();
        projector.delete_category(people).unwrap();
        assert_eq!(tag_id(&db, "People", "Alice"), None);
        assert_eq!(db.count_rows("tag_relation").unwrap(), 0);

        projector.clear().unwrap();
        for table in TABLES {
            assert_eq!(db.count_rows(table).unwrap(), 0, "{} not empty", table);
        }
        assert!(projector.ids().categories.is_empty());
    }

    #[test]
    fn test_progress_is_reported_per_media_item() {
        let db = new_db();
        let reader = XmlDatabase::parse(DOCUMENT).unwrap();
        let mut projector = SqlProjector::new(&db).unwrap();
        let mut seen = Vec::new();
        projector.feed_from(&reader, |n| seen.push(n)).unwrap();
        assert_eq!(seen, vec![1]);
    }
}

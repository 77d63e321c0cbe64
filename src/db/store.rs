//! Reading a projected database back into the model.

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use super::Database;
use crate::model::{join_path, BlockItem, Category, Drawing, MediaItem, MediaKind, MemberGroup, Point, Shape, Tag, ViewType};
use crate::reader::dates::{parse_date, parse_timestamp};
use crate::reader::DatabaseReader;

const DEFAULT_THUMBNAIL_SIZE: i32 = 32;

/// [`DatabaseReader`] over the rows of a destination database.
///
/// Category items are keyed by tag id, so the local ids differ from those of
/// the index.xml the rows came from; labels and associations are the same.
/// Every tag row of a category is an item, including member group names and
/// tags that were only ever used on media items.
pub struct StoreReader {
    categories: Vec<Category>,
    media_items: Vec<MediaItem>,
    member_groups: Vec<MemberGroup>,
    block_items: Vec<BlockItem>,
}

impl StoreReader {
    pub fn load(db: &Database) -> Result<Self> {
        let conn = db.conn();
        let reader = Self {
            categories: load_categories(conn)?,
            media_items: load_media_items(conn)?,
            member_groups: load_member_groups(conn)?,
            block_items: load_block_items(conn)?,
        };
        info!(
            "Loaded {} categories, {} media items, {} member groups, {} block items from database",
            reader.categories.len(),
            reader.media_items.len(),
            reader.member_groups.len(),
            reader.block_items.len()
        );
        Ok(reader)
    }
}

impl DatabaseReader for StoreReader {
    fn categories(&self) -> Box<dyn Iterator<Item = &Category> + '_> {
        Box::new(self.categories.iter())
    }

    fn media_items(&self) -> Box<dyn Iterator<Item = &MediaItem> + '_> {
        Box::new(self.media_items.iter())
    }

    fn member_groups(&self) -> Box<dyn Iterator<Item = &MemberGroup> + '_> {
        Box::new(self.member_groups.iter())
    }

    fn block_items(&self) -> Box<dyn Iterator<Item = &BlockItem> + '_> {
        Box::new(self.block_items.iter())
    }
}

fn load_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, icon, visible, viewtype, thumbsize FROM category ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<bool>>(3)?,
                row.get::<_, Option<i32>>(4)?,
                row.get::<_, Option<i32>>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tags = conn.prepare(
        "SELECT id, name, birthdate FROM tag WHERE categoryid = ?1 ORDER BY id",
    )?;

    let mut categories = Vec::with_capacity(rows.len());
    for (id, name, icon, visible, viewtype, thumbsize) in rows {
        let mut category = Category::new(
            name,
            icon.unwrap_or_default(),
            visible.unwrap_or(true),
            viewtype.and_then(ViewType::from_i32).unwrap_or_default(),
            thumbsize.unwrap_or(DEFAULT_THUMBNAIL_SIZE),
        );
        let items = tags
            .query_map([id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (tag_id, label, birthdate) in items {
            let birth_date = parse_date(birthdate.as_deref().unwrap_or_default())?;
            category.add_item(tag_id, label, birth_date);
        }
        categories.push(category);
    }
    Ok(categories)
}

struct MediaRow {
    id: i64,
    path: String,
    md5sum: Option<String>,
    kind: String,
    label: Option<String>,
    description: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    width: Option<i32>,
    height: Option<i32>,
    angle: Option<i32>,
}

fn load_media_items(conn: &Connection) -> Result<Vec<MediaItem>> {
    let mut stmt = conn.prepare(
        "SELECT media.id, dir.path, media.filename, md5sum, type, label, description,
                starttime, endtime, width, height, angle
         FROM media JOIN dir ON dir.id = media.dirid
         ORDER BY media.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MediaRow {
                id: row.get(0)?,
                path: join_path(&row.get::<_, String>(1)?, &row.get::<_, String>(2)?),
                md5sum: row.get(3)?,
                kind: row.get(4)?,
                label: row.get(5)?,
                description: row.get(6)?,
                start_time: row.get(7)?,
                end_time: row.get(8)?,
                width: row.get(9)?,
                height: row.get(10)?,
                angle: row.get(11)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut tags = conn.prepare(
        "SELECT category.name, tag.name, media_tag.area
         FROM media_tag
         JOIN tag ON tag.id = media_tag.tagid
         JOIN category ON category.id = tag.categoryid
         WHERE media_tag.mediaid = ?1
         ORDER BY tag.id",
    )?;
    let mut drawings = conn.prepare(
        "SELECT shape, x0, y0, x1, y1 FROM drawing WHERE mediaid = ?1 ORDER BY id",
    )?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let mut item = MediaItem::new(row.path);
        item.md5sum = row.md5sum.unwrap_or_default();
        item.kind = MediaKind::from_attribute(&row.kind);
        item.label = row.label.unwrap_or_default();
        item.description = row.description.unwrap_or_default();
        item.start_time = parse_timestamp(row.start_time.as_deref().unwrap_or_default())?;
        item.end_time = parse_timestamp(row.end_time.as_deref().unwrap_or_default())?;
        item.width = row.width;
        item.height = row.height;
        item.angle = row.angle.unwrap_or(0);

        let item_tags = tags.query_map([row.id], |r| {
            let category: String = r.get(0)?;
            let name: String = r.get(1)?;
            let area: Option<String> = r.get(2)?;
            Ok(match area {
                Some(area) => Tag::with_area(category, name, area),
                None => Tag::new(category, name),
            })
        })?;
        for tag in item_tags {
            item.add_tag(tag?);
        }

        let item_drawings = drawings
            .query_map([row.id], |r| {
                Ok((
                    r.get::<_, i32>(0)?,
                    Point::new(r.get(1)?, r.get(2)?),
                    Point::new(r.get(3)?, r.get(4)?),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (code, start, end) in item_drawings {
            match Shape::from_code(code) {
                Some(shape) => item.add_drawing(Drawing::new(shape, start, end)),
                None => warn!("{}: skipping drawing with unknown shape {}", item.path, code),
            }
        }

        items.push(item);
    }
    Ok(items)
}

fn load_member_groups(conn: &Connection) -> Result<Vec<MemberGroup>> {
    let mut stmt = conn.prepare(
        "SELECT tag.id, category.name, tag.name
         FROM tag JOIN category ON category.id = tag.categoryid
         WHERE tag.isgroup = 1
         ORDER BY tag.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut members = conn.prepare(
        "SELECT tag.name FROM tag_relation
         JOIN tag ON tag.id = tag_relation.membertag
         WHERE tag_relation.grouptag = ?1
         ORDER BY tag.id",
    )?;

    let mut groups = Vec::with_capacity(rows.len());
    for (id, category, name) in rows {
        let mut group = MemberGroup::new(category, name);
        for member in members.query_map([id], |row| row.get::<_, String>(0))? {
            group.add_member(member?);
        }
        groups.push(group);
    }
    Ok(groups)
}

fn load_block_items(conn: &Connection) -> Result<Vec<BlockItem>> {
    let mut stmt = conn.prepare(
        "SELECT dir.path, blockitem.filename
         FROM blockitem JOIN dir ON dir.id = blockitem.dirid
         ORDER BY dir.path, blockitem.filename",
    )?;
    let items = stmt
        .query_map([], |row| {
            let dir: String = row.get(0)?;
            let file: String = row.get(1)?;
            Ok(BlockItem::new(join_path(&dir, &file)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

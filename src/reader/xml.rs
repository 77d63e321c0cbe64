//! Reader for KPhotoAlbum index.xml files.
//!
//! Structure of index.xml:
//!
//! ```text
//! KPhotoAlbum version=".." compressed=".."
//!     Categories
//!         Category
//!             value
//!     images
//!         image
//!             options
//!                 option
//!                     value
//!             drawings
//!                 Circle | Line | Rectangle
//!     member-groups
//!         member
//!     blocklist
//!         block
//! ```
//!
//! In the compressed encoding an image carries one attribute per category
//! holding a comma separated list of local item ids, and a member group
//! carries its members as a list of ids as well. Those ids are resolved
//! against the items declared in the `Categories` section.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, info, warn};

use super::dates::{parse_date, parse_timestamp};
use super::{DatabaseReader, ReaderError};
use crate::config;
use crate::model::{
    BlockItem, Category, Drawing, MediaItem, MediaKind, MemberGroup, Point, Shape, Tag, ViewType,
    FOLDER_CATEGORY,
};

pub const ROOT_TAG: &str = "KPhotoAlbum";

pub const SUPPORTED_VERSIONS: &[&str] = &["2", "3", "4", "5", "6"];

const DEFAULT_THUMBNAIL_SIZE: i64 = 32;

/// A fully parsed index.xml.
#[derive(Debug, Clone)]
pub struct XmlDatabase {
    version: String,
    compressed: bool,
    categories: Vec<Category>,
    media_items: Vec<MediaItem>,
    member_groups: Vec<MemberGroup>,
    block_items: Vec<BlockItem>,
}

impl XmlDatabase {
    /// Read and parse the given index.xml.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        info!("Reading {:?}", path);
        let bytes = std::fs::read(path)?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("{:?} is not valid UTF-8, decoding it as Latin-1", path);
                e.into_bytes().iter().map(|&b| b as char).collect()
            }
        };
        Self::parse(&text)
    }

    /// Open the index.xml the photo application is configured to use.
    pub fn open_default() -> Result<Self, ReaderError> {
        let path = config::locate_index_xml()?;
        Self::open(path)
    }

    /// Parse index.xml content.
    pub fn parse(text: &str) -> Result<Self, ReaderError> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text, options)
            .map_err(|e| ReaderError::InvalidFile(format!("Parsing XML failed: {}", e)))?;
        let root = doc.root_element();

        if root.tag_name().name() != ROOT_TAG {
            return Err(ReaderError::UnsupportedFormat(format!(
                "File should be in {} index.xml format, found root element <{}>",
                ROOT_TAG,
                root.tag_name().name()
            )));
        }

        let version = root.attribute("version").unwrap_or_default().to_string();
        if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
            return Err(ReaderError::UnsupportedFormat(format!(
                "Version {:?} is not supported, only versions {} to {} are",
                version,
                SUPPORTED_VERSIONS[0],
                SUPPORTED_VERSIONS[SUPPORTED_VERSIONS.len() - 1]
            )));
        }

        let compressed = root.attribute("compressed") == Some("1");
        debug!("index.xml version {} (compressed: {})", version, compressed);

        let categories = read_categories(root)?;
        let lookup: &[Category] = if compressed { &categories } else { &[] };
        let media_items = read_media_items(root, lookup)?;
        let member_groups = read_member_groups(root, &categories);
        let block_items = read_block_items(root);

        info!(
            "Parsed {} categories, {} media items, {} member groups, {} block items",
            categories.len(),
            media_items.len(),
            member_groups.len(),
            block_items.len()
        );

        Ok(Self {
            version,
            compressed,
            categories,
            media_items,
            member_groups,
            block_items,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }
}

impl DatabaseReader for XmlDatabase {
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

/// Category names are written with spaces replaced by underscores.
fn unescape(name: &str) -> String {
    name.replace('_', " ")
}

fn escape(name: &str) -> String {
    name.replace(' ', "_")
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn int_attribute(node: Node, name: &str) -> Result<Option<i64>, ReaderError> {
    match node.attribute(name).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
            ReaderError::InvalidFile(format!(
                "<{}> attribute {}={:?} is not an integer",
                node.tag_name().name(),
                name,
                value
            ))
        }),
    }
}

fn required_int(node: Node, name: &str) -> Result<i64, ReaderError> {
    int_attribute(node, name)?.ok_or_else(|| {
        ReaderError::InvalidFile(format!(
            "<{}> is missing the {} attribute",
            node.tag_name().name(),
            name
        ))
    })
}

fn i32_attribute(node: Node, name: &str, default: i64) -> Result<i32, ReaderError> {
    let value = int_attribute(node, name)?.unwrap_or(default);
    i32::try_from(value).map_err(|_| {
        ReaderError::InvalidFile(format!(
            "<{}> attribute {}={} is out of range",
            node.tag_name().name(),
            name,
            value
        ))
    })
}

/// Width and height use -1 for "unknown". Other values are kept as is.
fn dimension(node: Node, name: &str) -> Result<Option<i32>, ReaderError> {
    match int_attribute(node, name)? {
        None | Some(-1) => Ok(None),
        Some(_) => i32_attribute(node, name, -1).map(Some),
    }
}

/// Split a compressed id list. Entries that are not integers are ignored.
fn id_list(value: &str) -> impl Iterator<Item = i64> + '_ {
    value.split(',').filter_map(|s| s.trim().parse::<i64>().ok())
}

// ============================================================================
// Categories
// ============================================================================

fn read_categories(root: Node) -> Result<Vec<Category>, ReaderError> {
    let mut categories = Vec::new();
    // "options"/"option" is the layout of very old files
    for section in root
        .children()
        .filter(|n| n.is_element() && matches!(n.tag_name().name(), "Categories" | "options"))
    {
        for node in section
            .children()
            .filter(|n| n.is_element() && matches!(n.tag_name().name(), "Category" | "option"))
        {
            if let Some(category) = read_category(node)? {
                categories.push(category);
            }
        }
    }
    Ok(categories)
}

fn read_category(node: Node) -> Result<Option<Category>, ReaderError> {
    let Some(name) = node.attribute("name") else {
        warn!("Skipping category without a name");
        return Ok(None);
    };
    let name = unescape(name);

    let view_code = i32_attribute(node, "viewtype", 0)?;
    let view_type = ViewType::from_i32(view_code).ok_or_else(|| {
        ReaderError::InvalidFile(format!("Category {:?} has unknown viewtype {}", name, view_code))
    })?;
    let visible = int_attribute(node, "show")?.unwrap_or(1) != 0;
    let size_attribute = if node.has_attribute("thumbnailsize") {
        "thumbnailsize"
    } else {
        "viewsize"
    };
    let thumbnail_size = i32_attribute(node, size_attribute, DEFAULT_THUMBNAIL_SIZE)?;

    let mut category = Category::new(
        name,
        node.attribute("icon").unwrap_or_default(),
        visible,
        view_type,
        thumbnail_size,
    );

    for value in child_elements(node, "value") {
        let label = value.attribute("value").unwrap_or_default();
        let id = required_int(value, "id")?;
        let birth_date = parse_date(value.attribute("birthDate").unwrap_or_default())?;
        if !category.add_item(id, label, birth_date) {
            return Err(ReaderError::InvalidFile(format!(
                "Category {:?} declares id {} twice",
                category.name, id
            )));
        }
    }

    Ok(Some(category))
}

// ============================================================================
// Media items
// ============================================================================

fn read_media_items(root: Node, compressed_categories: &[Category]) -> Result<Vec<MediaItem>, ReaderError> {
    let mut items = Vec::new();
    for images in child_elements(root, "images") {
        for node in child_elements(images, "image") {
            if let Some(item) = read_media_item(node, compressed_categories)? {
                items.push(item);
            }
        }
    }
    Ok(items)
}

fn read_media_item(node: Node, compressed_categories: &[Category]) -> Result<Option<MediaItem>, ReaderError> {
    let path = match node.attribute("file") {
        Some(path) if !path.is_empty() => path,
        _ => {
            warn!("Skipping <image> without a file attribute");
            return Ok(None);
        }
    };

    let attr = |name: &str| node.attribute(name).unwrap_or_default().to_string();

    let mut item = MediaItem::new(path);
    item.md5sum = attr("md5sum");
    item.kind = MediaKind::from_attribute(node.attribute("mediatype").unwrap_or_default());
    item.label = attr("label");
    item.description = attr("description");
    item.start_time = parse_timestamp(node.attribute("startDate").unwrap_or_default())?;
    item.end_time = parse_timestamp(node.attribute("endDate").unwrap_or_default())?;
    item.width = dimension(node, "width")?;
    item.height = dimension(node, "height")?;
    item.angle = i32_attribute(node, "angle", 0)?;

    // Uncompressed tags
    for options in child_elements(node, "options") {
        for option in child_elements(options, "option") {
            let category = unescape(option.attribute("name").unwrap_or_default());
            if category == FOLDER_CATEGORY {
                continue;
            }
            for value in child_elements(option, "value") {
                let label = value.attribute("value").unwrap_or_default();
                let tag = match value.attribute("area") {
                    Some(area) => Tag::with_area(category.as_str(), label, area),
                    None => Tag::new(category.as_str(), label),
                };
                item.add_tag(tag);
            }
        }
    }

    // Compressed tags
    for category in compressed_categories {
        if category.is_folder() {
            continue;
        }
        let Some(ids) = node.attribute(escape(&category.name).as_str()) else {
            continue;
        };
        for id in id_list(ids) {
            match category.item_label(id) {
                Some(label) => {
                    item.add_tag(Tag::new(category.name.as_str(), label));
                }
                None => warn!("{}: category {} has no id {}", item.path, category.name, id),
            }
        }
    }

    for drawings in child_elements(node, "drawings") {
        for shape_node in drawings.children().filter(|n| n.is_element()) {
            let Some(shape) = Shape::from_element_name(shape_node.tag_name().name()) else {
                warn!(
                    "{}: skipping unexpected drawing element <{}>",
                    item.path,
                    shape_node.tag_name().name()
                );
                continue;
            };
            item.add_drawing(read_drawing(shape_node, shape)?);
        }
    }

    Ok(Some(item))
}

fn read_drawing(node: Node, shape: Shape) -> Result<Drawing, ReaderError> {
    let start = Point::new(
        i32_attribute(node, "_startPos.x", 0)?,
        i32_attribute(node, "_startPos.y", 0)?,
    );
    let end = Point::new(
        i32_attribute(node, "_lastPos.x", 0)?,
        i32_attribute(node, "_lastPos.y", 0)?,
    );
    Ok(Drawing::new(shape, start, end))
}

// ============================================================================
// Member groups and block list
// ============================================================================

/// Groups are merged by (category, group name) in first-seen order, so the
/// one-member-per-element layout and the compressed id-list layout end up in
/// the same shape.
fn read_member_groups(root: Node, categories: &[Category]) -> Vec<MemberGroup> {
    let by_name: HashMap<&str, &Category> = categories.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut groups: IndexMap<(String, String), MemberGroup> = IndexMap::new();

    for section in child_elements(root, "member-groups") {
        for node in child_elements(section, "member") {
            let category = node
                .attribute("category")
                .or_else(|| node.attribute("option-group"))
                .unwrap_or_default();
            let group_name = node.attribute("group-name").unwrap_or_default();
            if category == FOLDER_CATEGORY {
                warn!("Ignoring member group {} in the {} category", group_name, FOLDER_CATEGORY);
                continue;
            }

            let group = groups
                .entry((category.to_string(), group_name.to_string()))
                .or_insert_with(|| MemberGroup::new(category, group_name));

            if let Some(member) = node.attribute("member") {
                group.add_member(member);
            } else if let Some(ids) = node.attribute("members") {
                let Some(cat) = by_name.get(category) else {
                    warn!("Member group {}/{} refers to unknown category", category, group_name);
                    continue;
                };
                for id in id_list(ids) {
                    match cat.item_label(id) {
                        Some(label) => group.add_member(label),
                        None => warn!("Member group {}/{}: category has no id {}", category, group_name, id),
                    }
                }
            }
        }
    }

    groups.into_values().collect()
}

fn read_block_items(root: Node) -> Vec<BlockItem> {
    child_elements(root, "blocklist")
        .flat_map(|list| child_elements(list, "block"))
        .filter_map(|node| node.attribute("file"))
        .filter(|file| !file.is_empty())
        .map(BlockItem::new)
        .collect()
}

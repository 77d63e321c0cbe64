use chrono::NaiveDateTime;
use indexmap::IndexSet;

use super::{split_path, Tag};

/// Kind of a media item as stored in the `type` column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Audio,
    /// Any other literal found in the source, kept as is.
    Other(String),
}

impl MediaKind {
    /// Normalize a `mediatype` attribute value.
    ///
    /// An empty value means image and the legacy `movie` means video.
    pub fn from_attribute(value: &str) -> Self {
        match value {
            "" | "image" => MediaKind::Image,
            "movie" | "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            other => MediaKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other(s) => s,
        }
    }
}

/// A photo, video or sound file with its metadata and tags.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Path relative to the image root; this is the item's identity.
    pub path: String,
    pub md5sum: String,
    pub kind: MediaKind,
    pub label: String,
    pub description: String,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub angle: i32,
    /// Tags in first-seen order, without duplicates.
    pub tags: IndexSet<Tag>,
    pub drawings: Vec<Drawing>,
}

impl MediaItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            md5sum: String::new(),
            kind: MediaKind::Image,
            label: String::new(),
            description: String::new(),
            start_time: None,
            end_time: None,
            width: None,
            height: None,
            angle: 0,
            tags: IndexSet::new(),
            drawings: Vec::new(),
        }
    }

    /// Add a tag. Returns `false` if an equal tag was already present, in
    /// which case the first occurrence (and its area) is kept.
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        self.tags.insert(tag)
    }

    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.drawings.push(drawing);
    }

    pub fn directory(&self) -> &str {
        split_path(&self.path).0
    }

    pub fn file_name(&self) -> &str {
        split_path(&self.path).1
    }
}

/// Shape of a freehand annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Circle,
    Line,
    Rectangle,
}

impl Shape {
    /// Code stored in the `drawing.shape` column.
    pub fn code(&self) -> i32 {
        match self {
            Shape::Circle => 0,
            Shape::Line => 1,
            Shape::Rectangle => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Shape::Circle),
            1 => Some(Shape::Line),
            2 => Some(Shape::Rectangle),
            _ => None,
        }
    }

    /// Element name used inside `<drawings>`.
    pub fn element_name(&self) -> &'static str {
        match self {
            Shape::Circle => "Circle",
            Shape::Line => "Line",
            Shape::Rectangle => "Rectangle",
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "Circle" => Some(Shape::Circle),
            "Line" => Some(Shape::Line),
            "Rectangle" => Some(Shape::Rectangle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A shape drawn on top of an image, spanned by two corner points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Drawing {
    pub shape: Shape,
    pub start: Point,
    pub end: Point,
}

impl Drawing {
    pub fn new(shape: Shape, start: Point, end: Point) -> Self {
        Self { shape, start, end }
    }
}

/// A file excluded from the collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockItem {
    pub path: String,
}

impl BlockItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

//! Reading a photo database into the in-memory model.
//!
//! A reader is built eagerly (the whole source is parsed and validated up
//! front) and then hands out the four entity sequences lazily. Each sequence
//! can be iterated any number of times.

pub mod dates;
pub mod xml;

use thiserror::Error;

use crate::model::{BlockItem, Category, MediaItem, MemberGroup};

pub use xml::XmlDatabase;

/// Errors raised while locating or reading a source database.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The source path could not be derived from the user's configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The file is not an index.xml we can make sense of.
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// The file is an index.xml, but in a format we do not support.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// True for both invalid and unsupported files.
    pub fn is_invalid_file(&self) -> bool {
        matches!(self, ReaderError::InvalidFile(_) | ReaderError::UnsupportedFormat(_))
    }
}

/// Source of categories, media items, member groups and block items.
pub trait DatabaseReader {
    fn categories(&self) -> Box<dyn Iterator<Item = &Category> + '_>;

    fn media_items(&self) -> Box<dyn Iterator<Item = &MediaItem> + '_>;

    fn member_groups(&self) -> Box<dyn Iterator<Item = &MemberGroup> + '_>;

    fn block_items(&self) -> Box<dyn Iterator<Item = &BlockItem> + '_>;

    fn is_empty(&self) -> bool {
        self.categories().next().is_none()
            && self.media_items().next().is_none()
            && self.member_groups().next().is_none()
            && self.block_items().next().is_none()
    }
}

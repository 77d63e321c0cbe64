//! In-memory object model shared by the readers and the projector.
//!
//! Everything here is plain data. Readers build these values from a source
//! (index.xml or an existing relational store) and the projector consumes
//! them by reference.

mod category;
mod media;
mod tag;

pub use category::{Category, ViewType};
pub use media::{BlockItem, Drawing, MediaItem, MediaKind, Point, Shape};
pub use tag::{MemberGroup, Tag};

/// Name of the special category that mirrors the directory layout.
/// It is never treated as a user tag category.
pub const FOLDER_CATEGORY: &str = "Folder";

/// Split a relative media path into its directory part and file name.
///
/// A path without a `/` has an empty directory part.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", path),
    }
}

/// Inverse of [`split_path`].
pub fn join_path(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

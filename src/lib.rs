//! Copy a KPhotoAlbum index.xml into a relational database.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reader;

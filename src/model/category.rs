use chrono::NaiveDate;
use indexmap::IndexMap;

use super::FOLDER_CATEGORY;

/// How the category browser lists the items of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewType {
    #[default]
    TreeView,
    ThumbedTreeView,
    IconView,
    ThumbedIconView,
}

impl ViewType {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ViewType::TreeView),
            1 => Some(ViewType::ThumbedTreeView),
            2 => Some(ViewType::IconView),
            3 => Some(ViewType::ThumbedIconView),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            ViewType::TreeView => 0,
            ViewType::ThumbedTreeView => 1,
            ViewType::IconView => 2,
            ViewType::ThumbedIconView => 3,
        }
    }
}

/// A tag dimension such as "People" or "Places", with its items.
///
/// Item ids are local to the category and to the document they were read
/// from; the projector maps them to stable surrogate ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub icon: String,
    pub visible: bool,
    pub view_type: ViewType,
    pub thumbnail_size: i32,
    /// Local item id -> item label, in document order.
    pub items: IndexMap<i64, String>,
    /// Local item id -> birth date (only some "People" categories carry these).
    pub birth_dates: IndexMap<i64, NaiveDate>,
}

impl Category {
    pub fn new(
        name: impl Into<String>,
        icon: impl Into<String>,
        visible: bool,
        view_type: ViewType,
        thumbnail_size: i32,
    ) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            visible,
            view_type,
            thumbnail_size,
            items: IndexMap::new(),
            birth_dates: IndexMap::new(),
        }
    }

    /// Add an item. Returns `false` and leaves the category untouched if the
    /// local id is already taken.
    pub fn add_item(&mut self, id: i64, label: impl Into<String>, birth_date: Option<NaiveDate>) -> bool {
        if self.items.contains_key(&id) {
            return false;
        }
        self.items.insert(id, label.into());
        if let Some(date) = birth_date {
            self.birth_dates.insert(id, date);
        }
        true
    }

    pub fn item_label(&self, id: i64) -> Option<&str> {
        self.items.get(&id).map(String::as_str)
    }

    pub fn birth_date(&self, id: i64) -> Option<NaiveDate> {
        self.birth_dates.get(&id).copied()
    }

    pub fn is_folder(&self) -> bool {
        self.name == FOLDER_CATEGORY
    }
}

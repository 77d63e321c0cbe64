use std::hash::{Hash, Hasher};

/// A (category, item) value attached to a media item, optionally limited to
/// a region of the image.
///
/// Equality and hashing only look at the category and the item label. The
/// area is deliberately left out so the same tag placed on several regions
/// still maps to a single tag row.
#[derive(Debug, Clone)]
pub struct Tag {
    category: String,
    name: String,
    area: Option<String>,
}

impl Tag {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            area: None,
        }
    }

    pub fn with_area(category: impl Into<String>, name: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            area: Some(area.into()),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.name == other.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.category.hash(state);
        self.name.hash(state);
    }
}

/// A named group of items inside one category, e.g. a family grouping
/// several people. Members are plain labels of the same category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberGroup {
    pub tag: Tag,
    pub members: Vec<String>,
}

impl MemberGroup {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tag: Tag::new(category, name),
            members: Vec::new(),
        }
    }

    pub fn category(&self) -> &str {
        self.tag.category()
    }

    pub fn name(&self) -> &str {
        self.tag.name()
    }

    pub fn add_member(&mut self, member: impl Into<String>) {
        self.members.push(member.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_area_is_not_part_of_identity() {
        let plain = Tag::new("People", "Alice");
        let placed = Tag::with_area("People", "Alice", "10 10 40 40");
        assert_eq!(plain, placed);

        let set: HashSet<Tag> = [plain, placed].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_category_is_part_of_identity() {
        assert_ne!(Tag::new("People", "Paris"), Tag::new("Places", "Paris"));
    }

    #[test]
    fn test_member_group_keeps_member_order() {
        let mut group = MemberGroup::new("People", "Family");
        group.add_member("Mum");
        group.add_member("Dad");
        assert_eq!(group.category(), "People");
        assert_eq!(group.name(), "Family");
        assert_eq!(group.members, vec!["Mum", "Dad"]);
    }
}

use std::ops::Range;

use indexmap::IndexMap;

/// Alias of the column whose null-ness tells that a LEFT JOINed navigation matched nothing.
pub const SPLIT_COLUMN: &str = "NavigationSplitOn__";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Member the value belongs to.
    pub name: String,
    /// Generated alias, unique in the statement.
    pub alias: String,
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDescriptors {
    items: Vec<ColumnDescriptor>,
}

impl ColumnDescriptors {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Registers a projected column and returns its alias: the member name,
    /// suffixed with a counter when already taken.
    pub fn add(&mut self, name: &str) -> String {
        let mut alias = name.to_string();
        let mut n = 1;
        while self.items.iter().any(|c| c.alias.eq_ignore_ascii_case(&alias)) {
            alias = format!("{}{}", name, n);
            n += 1;
        }
        self.items.push(ColumnDescriptor { name: name.to_string(), alias: alias.clone(), position: self.items.len() });
        alias
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.items.iter()
    }

    pub fn get(&self, position: usize) -> Option<&ColumnDescriptor> {
        self.items.get(position)
    }

    /// First column carrying `name` outside any excluded range.
    pub fn by_name(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.items.iter().find(|c| c.name == name)
    }

    pub fn aliases(&self) -> Vec<String> {
        self.items.iter().map(|c| c.alias.clone()).collect()
    }
}

/// A navigation (or nested object) hydrated from a contiguous column range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationDescriptor {
    /// Dot-separated member path from the row root, e.g. `Client.Accounts`.
    pub key: String,
    pub member: String,
    /// Entity of the sub-object, `None` for anonymous nested objects.
    pub entity: Option<String>,
    pub many: bool,
    pub start: usize,
    pub field_count: usize,
    pub split_index: Option<usize>,
    /// SQL of the include filter AND-ed into the join condition.
    pub predicate: Option<String>,
}

impl NavigationDescriptor {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.field_count
    }

    pub fn parent_key(&self) -> Option<&str> {
        self.key.rsplit_once('.').map(|(parent, _)| parent)
    }
}

/// Descriptors in discovery order; parents always precede their children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationDescriptors {
    items: IndexMap<String, NavigationDescriptor>,
}

impl NavigationDescriptors {
    pub fn new() -> Self {
        Self { items: IndexMap::new() }
    }

    pub fn add(&mut self, descriptor: NavigationDescriptor) {
        self.items.insert(descriptor.key.clone(), descriptor);
    }

    pub fn get(&self, key: &str) -> Option<&NavigationDescriptor> {
        self.items.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut NavigationDescriptor> {
        self.items.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavigationDescriptor> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn many_count(&self) -> usize {
        self.items.values().filter(|d| d.many).count()
    }

    /// Whether a column position belongs to some navigation range.
    pub fn owns(&self, position: usize) -> bool {
        self.items.values().any(|d| d.range().contains(&position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_unique() {
        let mut cols = ColumnDescriptors::new();
        assert_eq!(cols.add("Id"), "Id");
        assert_eq!(cols.add("Name"), "Name");
        assert_eq!(cols.add("Id"), "Id1");
        assert_eq!(cols.add("Id"), "Id2");
        assert_eq!(cols.get(3).unwrap().name, "Id");
        assert_eq!(cols.get(3).unwrap().position, 3);
    }

    #[test]
    fn ranges_and_parents() {
        let mut navs = NavigationDescriptors::new();
        navs.add(NavigationDescriptor {
            key: "Client.Accounts".into(),
            member: "Accounts".into(),
            entity: Some("Account".into()),
            many: true,
            start: 4,
            field_count: 3,
            split_index: Some(4),
            predicate: None,
        });
        let d = navs.get("Client.Accounts").unwrap();
        assert_eq!(d.parent_key(), Some("Client"));
        assert!(navs.owns(6));
        assert!(!navs.owns(7));
        assert_eq!(navs.many_count(), 1);
    }
}

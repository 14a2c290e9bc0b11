//! Ordered middleware registry with named entries and group tags

use std::collections::{BTreeSet, HashMap};

use super::MiddlewareSource;

/// A registered middleware with its optional name and group tags
#[derive(Debug, Clone)]
pub struct MiddlewareEntry {
    pub source: MiddlewareSource,
    pub name: Option<String>,
    pub groups: BTreeSet<String>,
}

impl MiddlewareEntry {
    pub fn new(source: MiddlewareSource) -> Self {
        Self {
            source,
            name: None,
            groups: BTreeSet::new(),
        }
    }

    /// Ungrouped entries always run; grouped ones when any tag is active
    pub fn applies_to<S: AsRef<str>>(&self, active_groups: &[S]) -> bool {
        self.groups.is_empty()
            || active_groups
                .iter()
                .any(|group| self.groups.contains(group.as_ref()))
    }
}

/// Middleware in registration order.
///
/// Re-adding a name replaces the entry at its original position; unnamed
/// entries always append.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareCollection {
    entries: Vec<MiddlewareEntry>,
    by_name: HashMap<String, usize>,
}

impl MiddlewareCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_middleware(
        &mut self,
        middleware: impl Into<MiddlewareSource>,
        name: Option<&str>,
        groups: &[&str],
    ) -> &mut Self {
        self.push(MiddlewareEntry {
            source: middleware.into(),
            name: name.map(str::to_string),
            groups: groups.iter().map(|group| group.to_string()).collect(),
        });
        self
    }

    pub fn push(&mut self, entry: MiddlewareEntry) {
        match entry.name.as_ref().and_then(|name| self.by_name.get(name)) {
            Some(&index) => {
                tracing::debug!(name = ?entry.name, "replacing named middleware");
                self.entries[index] = entry;
            }
            None => {
                if let Some(name) = &entry.name {
                    self.by_name.insert(name.clone(), self.entries.len());
                }
                self.entries.push(entry);
            }
        }
    }

    /// Copy of this collection with `other`'s entries merged in after ours
    pub fn with_middlewares(&self, other: &MiddlewareCollection) -> MiddlewareCollection {
        let mut merged = self.clone();
        for entry in &other.entries {
            merged.push(entry.clone());
        }
        merged
    }

    /// Entries that apply to the active groups, in run order (reversed)
    pub fn get_array_for_run<S: AsRef<str>>(&self, active_groups: &[S]) -> Vec<MiddlewareEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|entry| entry.applies_to(active_groups))
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&MiddlewareEntry> {
        self.by_name.get(name).map(|&index| &self.entries[index])
    }

    pub fn remove(&mut self, name: &str) -> Option<MiddlewareEntry> {
        let index = self.by_name.remove(name)?;
        let removed = self.entries.remove(index);
        for position in self.by_name.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn entries(&self) -> &[MiddlewareEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| {
                entry
                    .name
                    .clone()
                    .unwrap_or_else(|| entry.source.describe())
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JokeResult;
    use crate::middleware::{Middleware, Next};
    use crate::request::JokeRequest;
    use crate::response::JokeResponse;

    #[derive(Debug)]
    struct Noop(&'static str);

    impl Middleware for Noop {
        fn handle(&self, request: JokeRequest, next: Next) -> JokeResult<JokeResponse> {
            next.run(request)
        }

        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_named_entry_replaced_in_place() {
        let mut collection = MiddlewareCollection::new();
        collection
            .add_middleware(Noop("first"), Some("auth"), &["web"])
            .add_middleware(Noop("second"), None, &[])
            .add_middleware(Noop("replacement"), Some("auth"), &["api", "admin"]);

        assert_eq!(collection.len(), 2);
        assert_eq!(collection.names(), vec!["auth", "second"]);
        let auth = collection.get("auth").unwrap();
        assert_eq!(auth.source.describe(), "replacement");
        assert_eq!(
            auth.groups.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["admin", "api"]
        );
        assert_eq!(collection.get_array_for_run(&["web"]).len(), 1);
    }

    #[test]
    fn test_unnamed_entries_append() {
        let mut collection = MiddlewareCollection::new();
        collection
            .add_middleware(Noop("a"), None, &[])
            .add_middleware(Noop("a"), None, &[]);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_run_array_filters_groups_and_reverses() {
        let mut collection = MiddlewareCollection::new();
        collection
            .add_middleware(Noop("global"), None, &[])
            .add_middleware(Noop("api"), None, &["g1"])
            .add_middleware(Noop("web"), None, &["g2", "g3"])
            .add_middleware(Noop("last"), None, &[]);

        let describe = |entries: Vec<MiddlewareEntry>| {
            entries
                .iter()
                .map(|entry| entry.source.describe())
                .collect::<Vec<_>>()
        };
        let none: [&str; 0] = [];
        assert_eq!(describe(collection.get_array_for_run(&none)), vec!["last", "global"]);
        assert_eq!(
            describe(collection.get_array_for_run(&["g1"])),
            vec!["last", "api", "global"]
        );
        assert_eq!(
            describe(collection.get_array_for_run(&["g3", "g1"])),
            vec!["last", "web", "api", "global"]
        );
    }

    #[test]
    fn test_with_middlewares_copies_and_merges() {
        let mut global = MiddlewareCollection::new();
        global
            .add_middleware(Noop("exception"), Some("exception"), &[])
            .add_middleware(Noop("log"), Some("log"), &[]);

        let mut route = MiddlewareCollection::new();
        route
            .add_middleware(Noop("auth"), Some("auth"), &[])
            .add_middleware(Noop("quiet-log"), Some("log"), &[]);

        let merged = global.with_middlewares(&route);
        assert_eq!(merged.names(), vec!["exception", "log", "auth"]);
        assert_eq!(
            merged.get("log").map(|entry| entry.source.describe()),
            Some("quiet-log".to_string())
        );
        assert_eq!(global.len(), 2);
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut collection = MiddlewareCollection::new();
        collection
            .add_middleware(Noop("a"), Some("a"), &[])
            .add_middleware(Noop("b"), Some("b"), &[])
            .add_middleware(Noop("c"), Some("c"), &[]);

        assert!(collection.remove("a").is_some());
        assert_eq!(
            collection.get("c").map(|entry| entry.source.describe()),
            Some("c".to_string())
        );
        assert!(collection.remove("a").is_none());
    }
}

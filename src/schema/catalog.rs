use std::collections::BTreeMap;

use super::ToolSchema;

/// De-duplicated set of tool schemas keyed by canonical serialization.
///
/// Used both for one conversation's candidate tools and for the corpus-wide
/// catalog; merging is a set union, so order of insertion never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCatalog {
    entries: BTreeMap<String, ToolSchema>,
}

impl ToolCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tool`; returns `false` when an identical schema is already present.
    pub fn insert(&mut self, tool: ToolSchema) -> bool {
        let key = match tool.canonical_json() {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(tool = %tool.name, "dropping tool schema: {err}");
                return false;
            }
        };
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, tool);
        true
    }

    pub fn merge(&mut self, other: ToolCatalog) {
        for (key, tool) in other.entries {
            self.entries.entry(key).or_insert(tool);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Schemas in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolSchema> {
        self.entries.values()
    }

    /// Canonical JSON lines in canonical order.
    pub fn canonical_lines(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn into_tools(self) -> Vec<ToolSchema> {
        self.entries.into_values().collect()
    }
}

impl Extend<ToolSchema> for ToolCatalog {
    fn extend<I: IntoIterator<Item = ToolSchema>>(&mut self, iter: I) {
        for tool in iter {
            self.insert(tool);
        }
    }
}

impl FromIterator<ToolSchema> for ToolCatalog {
    fn from_iter<I: IntoIterator<Item = ToolSchema>>(iter: I) -> Self {
        let mut catalog = Self::new();
        catalog.extend(iter);
        catalog
    }
}

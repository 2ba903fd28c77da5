//! Pixel color to severity lookup.

use std::collections::BTreeMap;

use hazard_map_hazard_models::{ColorKey, SeverityCategory};

/// A layer legend: exact RGB colors mapped to severity categories.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    id: String,
    entries: BTreeMap<ColorKey, SeverityCategory>,
    any_color: Option<SeverityCategory>,
}

impl ColorTable {
    /// Creates a table from `(color, category)` pairs. Later duplicates
    /// overwrite earlier ones; the registry rejects duplicates before this.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        entries: impl IntoIterator<Item = (ColorKey, SeverityCategory)>,
    ) -> Self {
        Self {
            id: id.into(),
            entries: entries.into_iter().collect(),
            any_color: None,
        }
    }

    /// Sets the category returned for opaque pixels with no exact match.
    #[must_use]
    pub fn with_any_color(mut self, category: SeverityCategory) -> Self {
        self.any_color = Some(category);
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exact lookup of an RGB key.
    #[must_use]
    pub fn lookup(&self, key: ColorKey) -> Option<&SeverityCategory> {
        self.entries.get(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classifies one RGBA pixel against a layer's table.
///
/// The RGB triple is matched exactly, ignoring alpha. Without a match, a
/// fully transparent pixel is `no_risk`, and anything else is the table's
/// `any_color` category if it has one, otherwise
/// [`SeverityCategory::unclassified`].
#[must_use]
pub fn classify(
    pixel: [u8; 4],
    table: &ColorTable,
    no_risk: &SeverityCategory,
) -> SeverityCategory {
    if let Some(category) = table.lookup(ColorKey::from_rgba(pixel)) {
        return category.clone();
    }
    if pixel[3] == 0 {
        return no_risk.clone();
    }
    table
        .any_color
        .clone()
        .unwrap_or_else(SeverityCategory::unclassified)
}

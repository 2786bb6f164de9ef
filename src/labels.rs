//! Label set and label → display mapping.

use anyhow::{anyhow, Result};
use std::collections::HashMap;

use crate::frame::Color;

/// Coarse ripeness grouping used for color-coding and the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Unripe,
    Ripe,
    Overripe,
}

impl StatusCategory {
    /// Categorise a label by its text. "overripe" is checked first because it also contains "ripe".
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("overripe") {
            StatusCategory::Overripe
        } else if label.contains("ripe") && !label.contains("unripe") {
            StatusCategory::Ripe
        } else {
            StatusCategory::Unripe
        }
    }

    /// Status line shown under the confidence text.
    pub fn status_text(self) -> &'static str {
        match self {
            StatusCategory::Overripe => "OVERRIPE",
            StatusCategory::Ripe => "RIPE (READY TO EAT)",
            StatusCategory::Unripe => "STILL UNRIPE",
        }
    }

    pub fn status_color(self) -> Color {
        match self {
            StatusCategory::Overripe => Color::RED,
            StatusCategory::Ripe => Color::GREEN,
            StatusCategory::Unripe => Color::ORANGE,
        }
    }
}

/// Ordered, immutable list of class identifiers. Index position aligns with probability vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(anyhow!("label set must not be empty"));
        }
        let mut seen = HashMap::new();
        for (idx, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(anyhow!("label at index {} is blank", idx));
            }
            if let Some(prev) = seen.insert(label.as_str(), idx) {
                return Err(anyhow!(
                    "label '{}' appears twice (indices {} and {})",
                    label,
                    prev,
                    idx
                ));
            }
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// What the overlay shows for one label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayEntry {
    pub text: String,
    pub status: StatusCategory,
    pub color: Color,
}

/// Validated label → display lookup with a fallback for labels it has never seen.
#[derive(Clone, Debug)]
pub struct DisplayTable {
    entries: HashMap<String, DisplayEntry>,
    fallback: DisplayEntry,
}

impl DisplayTable {
    /// Build the table and check that every label in `labels` has exactly one entry.
    pub fn new(
        labels: &LabelSet,
        entries: Vec<(String, String, Color)>,
        fallback_text: impl Into<String>,
        fallback_color: Color,
    ) -> Result<Self> {
        let mut map = HashMap::with_capacity(entries.len());
        for (id, text, color) in entries {
            let entry = DisplayEntry {
                status: StatusCategory::from_label(&id),
                text,
                color,
            };
            if map.insert(id.clone(), entry).is_some() {
                return Err(anyhow!("display entry for '{}' defined twice", id));
            }
        }
        for label in labels.iter() {
            if !map.contains_key(label) {
                return Err(anyhow!("no display entry for label '{}'", label));
            }
        }
        let fallback_text = fallback_text.into();
        Ok(Self {
            entries: map,
            fallback: DisplayEntry {
                status: StatusCategory::Unripe,
                text: fallback_text,
                color: fallback_color,
            },
        })
    }

    /// Look up a label. Unknown labels get the fallback color and their own id as text.
    pub fn lookup(&self, label: &str) -> DisplayEntry {
        match self.entries.get(label) {
            Some(entry) => entry.clone(),
            None => {
                log::debug!("no display entry for '{}', using fallback", label);
                let text = if self.fallback.text.is_empty() {
                    label.to_string()
                } else {
                    self.fallback.text.clone()
                };
                DisplayEntry {
                    text,
                    status: StatusCategory::from_label(label),
                    color: self.fallback.color,
                }
            }
        }
    }

    pub fn fallback(&self) -> &DisplayEntry {
        &self.fallback
    }
}

/// Default label order: the lexicographic order a directory-per-class training run assigns.
pub const DEFAULT_LABELS: [&str; 6] = [
    "overripe_apple",
    "overripe_banana",
    "ripe_apple",
    "ripe_banana",
    "unripe_apple",
    "unripe_banana",
];

/// Human-readable text and color for the default labels.
pub fn default_display_entries() -> Vec<(String, String, Color)> {
    [
        ("overripe_apple", "Overripe Apple", Color::RED),
        ("overripe_banana", "Overripe Banana", Color::RED),
        ("ripe_apple", "Ripe Apple", Color::GREEN),
        ("ripe_banana", "Ripe Banana", Color::GREEN),
        ("unripe_apple", "Unripe Apple", Color::ORANGE),
        ("unripe_banana", "Unripe Banana", Color::ORANGE),
    ]
    .into_iter()
    .map(|(id, text, color)| (id.to_string(), text.to_string(), color))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_table() -> (LabelSet, DisplayTable) {
        let labels = LabelSet::new(DEFAULT_LABELS).unwrap();
        let table =
            DisplayTable::new(&labels, default_display_entries(), "", Color::WHITE).unwrap();
        (labels, table)
    }

    #[test]
    fn overripe_wins_over_ripe_substring() {
        assert_eq!(
            StatusCategory::from_label("overripe_banana"),
            StatusCategory::Overripe
        );
        assert_eq!(
            StatusCategory::from_label("OverRipe-Apple"),
            StatusCategory::Overripe
        );
        assert_eq!(StatusCategory::from_label("ripe_apple"), StatusCategory::Ripe);
        assert_eq!(
            StatusCategory::from_label("unripe_apple"),
            StatusCategory::Unripe
        );
        assert_eq!(StatusCategory::from_label("mango"), StatusCategory::Unripe);
    }

    #[test]
    fn label_set_rejects_duplicates_and_empty() {
        assert!(LabelSet::new(Vec::<String>::new()).is_err());
        assert!(LabelSet::new(["a", "b", "a"]).is_err());
        assert!(LabelSet::new(["a", " "]).is_err());
    }

    #[test]
    fn table_requires_entry_per_label() {
        let labels = LabelSet::new(["ripe_apple", "ripe_kiwi"]).unwrap();
        let err = DisplayTable::new(&labels, default_display_entries(), "", Color::WHITE)
            .unwrap_err();
        assert!(err.to_string().contains("ripe_kiwi"));
    }

    #[test]
    fn unknown_labels_fall_back() {
        let (_, table) = default_table();
        let entry = table.lookup("ripe_mango");
        assert_eq!(entry.text, "ripe_mango");
        assert_eq!(entry.color, Color::WHITE);
        assert_eq!(entry.status, StatusCategory::Ripe);

        let known = table.lookup("unripe_banana");
        assert_eq!(known.text, "Unripe Banana");
        assert_eq!(known.status, StatusCategory::Unripe);
    }
}

//! The precomputed JSON index from image file names to categories.

use crate::common::*;
use label::VOCABULARY;

/// One entry of the index. Unrecognized fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub categories: Vec<String>,
}

/// The read-only index. Record order follows the key order of the file.
#[derive(Debug, Clone)]
pub struct CocoIndex {
    entries: IndexMap<String, IndexEntry>,
}

impl CocoIndex {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read index file '{}'", path.display()))?;
        let index = Self::from_json_str(&text)
            .with_context(|| format!("failed to load index file '{}'", path.display()))?;
        Ok(index)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let entries: IndexMap<String, IndexEntry> = serde_json::from_str(text)?;

        entries.iter().try_for_each(|(file_name, entry)| {
            entry.categories.iter().try_for_each(|name| -> Result<_> {
                VOCABULARY
                    .classification_index(name)
                    .with_context(|| format!("invalid entry '{}'", file_name))?;
                Ok(())
            })
        })?;

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the file name and categories of the nth record.
    pub fn get_index(&self, index: usize) -> Option<(&str, &[String])> {
        self.entries
            .get_index(index)
            .map(|(file_name, entry)| (file_name.as_str(), entry.categories.as_slice()))
    }

    pub fn get(&self, file_name: &str) -> Option<&[String]> {
        self.entries
            .get(file_name)
            .map(|entry| entry.categories.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(file_name, entry)| (file_name.as_str(), entry.categories.as_slice()))
    }

    pub fn stats(&self) -> IndexStats {
        let mut category_counts: IndexMap<String, usize> = VOCABULARY
            .classes()
            .iter()
            .map(|name| (name.clone(), 0))
            .collect();

        self.entries
            .values()
            .flat_map(|entry| entry.categories.iter())
            .for_each(|name| {
                if let Some(count) = category_counts.get_mut(name) {
                    *count += 1;
                }
            });

        let max_categories = self
            .entries
            .values()
            .map(|entry| entry.categories.len())
            .max()
            .unwrap_or(0);

        IndexStats {
            num_records: self.entries.len(),
            max_categories,
            category_counts,
        }
    }
}

/// Summary of an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub num_records: usize,
    /// The highest number of categories of one image.
    pub max_categories: usize,
    /// Occurrences per category ordered by classification index.
    pub category_counts: IndexMap<String, usize>,
}

impl IndexStats {
    /// The smallest `max_length` that pads every sequence of the index to the
    /// same length.
    pub fn required_max_length(&self) -> usize {
        self.max_categories + 1
    }
}

//! Extracted book records file
//!
//! Records from every session accumulate in one JSON document. A record for a link that is
//! already present replaces the old one in place; new links are appended.

use crate::crawler::BookRecord;
use crate::storage::{read_json_or_default, write_json_atomic, StorageResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsFile {
    #[serde(default)]
    pub records: Vec<BookRecord>,

    #[serde(default)]
    pub total_records: usize,

    #[serde(default)]
    pub date_updated: Option<NaiveDate>,
}

impl RecordsFile {
    /// Inserts or replaces records by link; returns how many links were new
    pub fn merge(&mut self, incoming: &[BookRecord]) -> usize {
        let mut positions: HashMap<String, usize> = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| (record.link.clone(), i))
            .collect();

        let mut added = 0;
        for record in incoming {
            match positions.get(&record.link) {
                Some(&i) => self.records[i] = record.clone(),
                None => {
                    positions.insert(record.link.clone(), self.records.len());
                    self.records.push(record.clone());
                    added += 1;
                }
            }
        }
        added
    }

    pub fn refresh(&mut self, today: NaiveDate) {
        self.total_records = self.records.len();
        self.date_updated = Some(today);
    }
}

/// Loads the records file, empty when it does not exist yet
pub fn load_records(path: &Path) -> StorageResult<RecordsFile> {
    read_json_or_default(path)
}

/// Merges `records` into the file at `path` and returns the new total
pub fn merge_records(path: &Path, records: &[BookRecord]) -> StorageResult<usize> {
    let mut file = load_records(path)?;
    let added = file.merge(records);
    file.refresh(chrono::Local::now().date_naive());
    write_json_atomic(path, &file)?;

    tracing::debug!(
        "Merged {} records ({} new) into {}",
        records.len(),
        added,
        path.display()
    );
    Ok(file.total_records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::NO_DATA;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn record(link: &str, title: &str) -> BookRecord {
        BookRecord {
            link: link.to_string(),
            title: title.to_string(),
            subtitle: NO_DATA.to_string(),
            authors: vec![],
            rating_value: None,
            rating_count: None,
            stats: BTreeMap::new(),
            description: NO_DATA.to_string(),
            published_date: NO_DATA.to_string(),
            publisher: NO_DATA.to_string(),
            language: NO_DATA.to_string(),
            num_pages: NO_DATA.to_string(),
        }
    }

    #[test]
    fn test_merge_replaces_by_link() {
        let mut file = RecordsFile::default();
        assert_eq!(file.merge(&[record("a", "First"), record("b", "Second")]), 2);
        assert_eq!(file.merge(&[record("a", "Revised"), record("c", "Third")]), 1);

        let titles: Vec<_> = file.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Revised", "Second", "Third"]);
    }

    #[test]
    fn test_merge_records_across_sessions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/records.json");

        assert_eq!(merge_records(&path, &[record("a", "A")]).unwrap(), 1);
        assert_eq!(merge_records(&path, &[record("b", "B"), record("a", "A2")]).unwrap(), 2);

        let file = load_records(&path).unwrap();
        assert_eq!(file.total_records, 2);
        assert_eq!(file.records[0].title, "A2");
        assert!(file.date_updated.is_some());
    }
}

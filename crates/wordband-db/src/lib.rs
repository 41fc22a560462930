//! Load graded word-list tables and serve immutable lookups.
//!
//! A band list is a CSV of reference vocabulary: one row per word with its
//! readings and a frequency-band classification (the kind of table language
//! curricula publish: level 1 through level 7, or "beginner" through
//! "fluent"). The table is read once at startup and never mutated; callers
//! get row lookups, membership tests, and band distributions for charting.
//!
//! Expected header: `word,pinyin,zhuyin,category,band`. Reading columns may
//! be empty for languages that have none.
//!
//! # Example
//! ```no_run
//! use wordband_db::BandList;
//!
//! # fn main() -> anyhow::Result<()> {
//! let bands = BandList::load("wordlist.csv")?;
//! if let Some(row) = bands.get("綿羊") {
//!     println!("{} [{}] -> {}", row.word, row.pinyin, row.band);
//! }
//! # Ok(()) }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One reference row: a word, its readings, and its band classification.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WordEntry {
    pub word: String,
    #[serde(default)]
    pub pinyin: String,
    #[serde(default)]
    pub zhuyin: String,
    #[serde(default)]
    pub category: String,
    pub band: String,
}

/// In-memory band table. Row order follows the source file; duplicate words
/// keep their first row, matching how graded lists place a word at the level
/// it is introduced.
#[derive(Debug)]
pub struct BandList {
    rows: Vec<WordEntry>,
    by_word: HashMap<String, usize>,
}

impl BandList {
    /// Load a band list from a CSV file with a header row.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("open band list {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut rows: Vec<WordEntry> = Vec::new();
        let mut by_word = HashMap::new();
        for (lineno, record) in reader.deserialize().enumerate() {
            let entry: WordEntry = record
                .with_context(|| format!("{}:{} malformed band row", path.display(), lineno + 2))?;
            if entry.word.is_empty() {
                continue;
            }
            by_word.entry(entry.word.clone()).or_insert(rows.len());
            rows.push(entry);
        }

        Ok(Self { rows, by_word })
    }

    /// An empty table, for callers that run without reference data.
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            by_word: HashMap::new(),
        }
    }

    /// First row for a word, if listed.
    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.by_word.get(word).map(|idx| &self.rows[*idx])
    }

    pub fn contains(&self, word: &str) -> bool {
        self.by_word.contains_key(word)
    }

    /// The pinyin reading recorded for a word, when present and non-empty.
    pub fn reading(&self, word: &str) -> Option<&str> {
        self.get(word)
            .map(|e| e.pinyin.as_str())
            .filter(|p| !p.is_empty())
    }

    /// Iterate rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &WordEntry> {
        self.rows.iter()
    }

    /// Number of rows loaded.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose word appears in `vocab`, in table order. Words absent from
    /// the table are silently skipped; unlisted vocabulary is expected, not
    /// an error.
    pub fn classify<'a>(&'a self, vocab: &[String]) -> Vec<&'a WordEntry> {
        let wanted: std::collections::HashSet<&str> =
            vocab.iter().map(|w| w.as_str()).collect();
        self.rows
            .iter()
            .filter(|row| wanted.contains(row.word.as_str()))
            .collect()
    }

    /// Band → row count over a set of classified rows, sorted by count
    /// descending, then band label, so chart output is deterministic.
    pub fn band_distribution(rows: &[&WordEntry]) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for row in rows {
            *counts.entry(row.band.as_str()).or_insert(0) += 1;
        }
        let mut out: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(band, n)| (band.to_string(), n))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn make_list(rows: &[&str]) -> BandList {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "word,pinyin,zhuyin,category,band").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        BandList::load(file.path()).expect("load band list")
    }

    #[test]
    fn loads_rows_and_looks_up_words() {
        let list = make_list(&[
            "綿羊,mian2 yang2,ㄇㄧㄢˊ ㄧㄤˊ,daily,level-2",
            "沙漠,sha1 mo4,ㄕㄚ ㄇㄛˋ,geography,level-3",
        ]);
        assert_eq!(list.len(), 2);
        assert!(list.contains("綿羊"));
        assert_eq!(list.get("沙漠").unwrap().band, "level-3");
        assert_eq!(list.reading("綿羊"), Some("mian2 yang2"));
        assert_eq!(list.get("機師"), None);
    }

    #[test]
    fn duplicate_words_keep_the_first_row() {
        let list = make_list(&[
            "水,shui3,ㄕㄨㄟˇ,daily,level-1",
            "水,shui3,ㄕㄨㄟˇ,science,level-4",
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get("水").unwrap().band, "level-1");
    }

    #[test]
    fn empty_reading_is_absent() {
        let list = make_list(&["sheep,,,daily,band-a"]);
        assert_eq!(list.reading("sheep"), None);
    }

    #[test]
    fn classify_keeps_table_order_and_skips_unlisted() {
        let list = make_list(&[
            "綿羊,mian2 yang2,,daily,level-2",
            "沙漠,sha1 mo4,,geography,level-3",
            "孤單,gu1 dan1,,emotion,level-2",
        ]);
        let vocab = vec!["孤單".to_string(), "綿羊".to_string(), "飛機".to_string()];
        let rows = list.classify(&vocab);
        let words: Vec<&str> = rows.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["綿羊", "孤單"]);
    }

    #[test]
    fn distribution_sorts_by_count_then_label() {
        let list = make_list(&[
            "a,,,x,level-1",
            "b,,,x,level-2",
            "c,,,x,level-2",
            "d,,,x,level-3",
        ]);
        let vocab: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let rows = list.classify(&vocab);
        let dist = BandList::band_distribution(&rows);
        assert_eq!(
            dist,
            vec![
                ("level-2".to_string(), 2),
                ("level-1".to_string(), 1),
                ("level-3".to_string(), 1),
            ]
        );
    }

    #[test]
    fn malformed_rows_are_reported_with_position() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "word,pinyin,zhuyin,category,band").unwrap();
        writeln!(file, "only-one-column").unwrap();
        let err = BandList::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("malformed band row"));
    }
}

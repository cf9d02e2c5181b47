//! Local quiz dataset used as the fallback source
//!
//! The dataset is parsed once and shared read-only behind an `Arc`, so clones of
//! the store are cheap and safe to hand to concurrent acquisitions.

use crate::quiz::{QuizItem, QuizRecord};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Dataset compiled into the crate
const BUNDLED_DATASET: &str = include_str!("../data/quiz_backup.json");

#[derive(Debug, Deserialize)]
struct QuizDataset {
    daftar_quiz: Vec<QuizRecord>,
}

/// Immutable in-memory quiz collection
#[derive(Debug, Clone, Default)]
pub struct LocalQuizStore {
    items: Arc<Vec<QuizItem>>,
    loaded_at: Option<DateTime<Utc>>,
}

impl LocalQuizStore {
    /// Load the dataset bundled with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    /// Load a dataset file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::DatasetLoad(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parse a dataset document
    ///
    /// Fails when the document is not JSON or lacks the `daftar_quiz` list.
    /// Entries that do not validate are skipped.
    pub fn from_json(text: &str) -> Result<Self> {
        let dataset: QuizDataset = serde_json::from_str(text)
            .map_err(|e| Error::DatasetLoad(format!("invalid dataset structure: {}", e)))?;

        let total = dataset.daftar_quiz.len();
        let items: Vec<QuizItem> = dataset
            .daftar_quiz
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match QuizItem::try_from(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping dataset entry #{}: {}", index, e);
                    None
                }
            })
            .collect();

        info!("Quiz dataset loaded: {}/{} entries usable", items.len(), total);

        Ok(Self {
            items: Arc::new(items),
            loaded_at: Some(Utc::now()),
        })
    }

    /// Load the configured dataset, or the bundled one
    ///
    /// Never fails: a load error is logged and leaves the store empty, which
    /// removes the fallback path for every later request.
    pub fn initialize(dataset_path: Option<&str>) -> Self {
        let loaded = match dataset_path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        };

        match loaded {
            Ok(store) if store.is_empty() => {
                error!("Quiz dataset loaded but contains no usable entries; local fallback disabled");
                store
            }
            Ok(store) => store,
            Err(e) => {
                error!("Failed to load quiz dataset, local fallback disabled: {}", e);
                Self::default()
            }
        }
    }

    /// First quiz whose topic equals the trimmed input, else a random one
    ///
    /// Matching is case-sensitive. Errors only when the store is empty.
    pub fn find_by_topic(&self, topic: &str) -> Result<QuizItem> {
        let topic = topic.trim();
        if topic.is_empty() {
            warn!("Empty topic requested, picking a random quiz");
            return self.random_item();
        }

        match self.items.iter().find(|item| item.topic() == topic) {
            Some(item) => {
                debug!("Local quiz found for topic '{}': {}", topic, item.question());
                Ok(item.clone())
            }
            None => {
                warn!("No local quiz for topic '{}', picking a random quiz", topic);
                self.random_item()
            }
        }
    }

    /// Uniformly random quiz
    pub fn random_item(&self) -> Result<QuizItem> {
        match self.items.choose(&mut rand::thread_rng()) {
            Some(item) => {
                debug!("Random local quiz selected: {}", item.question());
                Ok(item.clone())
            }
            None => {
                error!("Local quiz dataset is empty");
                Err(Error::NoQuizAvailable)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct topics present in the dataset
    pub fn topics(&self) -> BTreeSet<&str> {
        self.items.iter().map(QuizItem::topic).collect()
    }

    /// When the dataset was loaded, `None` if it never was
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SMALL: &str = r#"{
        "daftar_quiz": [
            {"pertanyaan":"Q1","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"A","topik_virus":"Phishing"},
            {"pertanyaan":"Q2","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"B","topik_virus":"Trojan"},
            {"pertanyaan":"Q3","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"C","topik_virus":"Phishing"}
        ]
    }"#;

    #[test]
    fn test_bundled_dataset_loads() {
        let store = LocalQuizStore::bundled().unwrap();
        assert!(!store.is_empty());
        assert!(store.topics().contains("Phishing"));
        assert!(store.loaded_at().is_some());
    }

    #[test]
    fn test_find_by_topic_returns_first_match() {
        let store = LocalQuizStore::from_json(SMALL).unwrap();
        let quiz = store.find_by_topic("Phishing").unwrap();
        assert_eq!(quiz.question(), "Q1");

        let quiz = store.find_by_topic("  Trojan  ").unwrap();
        assert_eq!(quiz.question(), "Q2");
    }

    #[test]
    fn test_find_by_topic_is_case_sensitive() {
        let store = LocalQuizStore::from_json(SMALL).unwrap();
        // "trojan" does not match; falls back to some item
        let quiz = store.find_by_topic("trojan").unwrap();
        assert!(["Q1", "Q2", "Q3"].contains(&quiz.question()));
    }

    #[test]
    fn test_missing_collection_field_fails() {
        let err = LocalQuizStore::from_json(r#"{"quizzes": []}"#).unwrap_err();
        assert!(matches!(err, Error::DatasetLoad(_)));

        let err = LocalQuizStore::from_json("not json").unwrap_err();
        assert!(matches!(err, Error::DatasetLoad(_)));
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let text = r#"{"daftar_quiz": [
            {"pertanyaan":"ok","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"D","topik_virus":"Worm"},
            {"pertanyaan":"bad label","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"Z","topik_virus":"Worm"},
            {"pertanyaan":"","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"A","topik_virus":"Worm"},
            {"pertanyaan":"no topic","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"A"},
            {"pertanyaan":"blank topic","pilihan_a":"a","pilihan_b":"b","pilihan_c":"c","pilihan_d":"d","jawaban_benar":"A","topik_virus":"  "}
        ]}"#;
        let store = LocalQuizStore::from_json(text).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.topics().into_iter().collect::<Vec<_>>(), vec!["Worm"]);
    }

    #[test]
    fn test_empty_store_reports_no_quiz() {
        let store = LocalQuizStore::default();
        assert!(matches!(store.random_item(), Err(Error::NoQuizAvailable)));
        assert!(matches!(store.find_by_topic("Phishing"), Err(Error::NoQuizAvailable)));
    }

    #[test]
    fn test_initialize_with_missing_file_is_empty() {
        let store = LocalQuizStore::initialize(Some("/nonexistent/quiz_backup.json"));
        assert!(store.is_empty());
        assert!(store.loaded_at().is_none());
    }

    #[test]
    fn test_initialize_bundled() {
        let store = LocalQuizStore::initialize(None);
        assert_eq!(store.len(), LocalQuizStore::bundled().unwrap().len());
    }

    proptest! {
        #[test]
        fn prop_any_topic_yields_an_item(topic in ".*") {
            let store = LocalQuizStore::from_json(SMALL).unwrap();
            let quiz = store.find_by_topic(&topic).unwrap();
            prop_assert!(["Q1", "Q2", "Q3"].contains(&quiz.question()));
        }

        #[test]
        fn prop_present_topic_matches(idx in 0usize..2) {
            let store = LocalQuizStore::from_json(SMALL).unwrap();
            let topic = ["Phishing", "Trojan"][idx];
            let quiz = store.find_by_topic(topic).unwrap();
            prop_assert_eq!(quiz.topic(), topic);
        }
    }
}

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{error::DatabaseError, models::WordData, utils::letters::normalize_word};

/// Fewest words a single list may hold
pub const MIN_LIST_WORDS: usize = 5;
/// Fewest distinct words (both lists together) a subtopic needs to be playable
pub const MIN_PLAYABLE_WORDS: usize = 10;
pub const MIN_WORD_LENGTH: usize = 3;
pub const MAX_WORD_LENGTH: usize = 12;

#[derive(Debug, Clone, Deserialize)]
struct SubtopicEntry {
    character_words: Vec<String>,
    defining_words: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub total_topics: usize,
    pub total_subtopics: usize,
    pub total_words: usize,
}

/// Themed word lists: topic → subtopic → character and defining words.
pub struct WordDatabase {
    topics: BTreeMap<String, BTreeMap<String, SubtopicEntry>>,
}

impl WordDatabase {
    /// Load the database from a JSON file
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DatabaseError::NotFound(path.to_path_buf())
            } else {
                DatabaseError::Io(e)
            }
        })?;

        let db = Self::from_json(&content)?;
        let stats = db.stats();
        tracing::info!(
            "Loaded {} topics, {} subtopics and {} words into word database",
            stats.total_topics,
            stats.total_subtopics,
            stats.total_words
        );

        Ok(db)
    }

    pub fn from_json(content: &str) -> Result<Self, DatabaseError> {
        let topics = serde_json::from_str(content)
            .map_err(|e| DatabaseError::Corrupted(format!("invalid database structure: {}", e)))?;
        Ok(Self { topics })
    }

    /// Create an empty database (for testing)
    pub fn empty() -> Self {
        Self {
            topics: BTreeMap::new(),
        }
    }

    pub fn topics(&self) -> Vec<&str> {
        self.topics.keys().map(String::as_str).collect()
    }

    pub fn subtopics(&self, topic: &str) -> Result<Vec<&str>, DatabaseError> {
        let subtopics = self
            .topics
            .get(topic)
            .ok_or_else(|| DatabaseError::TopicNotFound(topic.to_string()))?;
        Ok(subtopics.keys().map(String::as_str).collect())
    }

    /// Word lists for one subtopic. Lists that break the content rules are
    /// reported as corruption.
    pub fn words(&self, topic: &str, subtopic: &str) -> Result<WordData, DatabaseError> {
        let entry = self.entry(topic, subtopic)?;

        for (name, list) in [
            ("character_words", &entry.character_words),
            ("defining_words", &entry.defining_words),
        ] {
            if let Err(reason) = check_word_list(list) {
                return Err(DatabaseError::InvalidSubtopic {
                    topic: topic.to_string(),
                    subtopic: subtopic.to_string(),
                    reason: format!("invalid {}: {}", name, reason),
                });
            }
        }

        Ok(WordData {
            topic: topic.to_string(),
            subtopic: subtopic.to_string(),
            character_words: entry.character_words.clone(),
            defining_words: entry.defining_words.clone(),
        })
    }

    pub fn validate_subtopic_data(&self, topic: &str, subtopic: &str) -> bool {
        self.words(topic, subtopic).is_ok()
    }

    /// Words that normalize to the same letters count once
    pub fn has_sufficient_words(&self, topic: &str, subtopic: &str, min_words: usize) -> bool {
        self.distinct_words(topic, subtopic)
            .map(|count| count >= min_words)
            .unwrap_or(false)
    }

    pub fn distinct_words(&self, topic: &str, subtopic: &str) -> Result<usize, DatabaseError> {
        let entry = self.entry(topic, subtopic)?;
        let distinct: HashSet<String> = entry
            .character_words
            .iter()
            .chain(&entry.defining_words)
            .filter_map(|w| normalize_word(w))
            .collect();
        Ok(distinct.len())
    }

    pub fn stats(&self) -> DatabaseStats {
        let subtopics = self.topics.values().flat_map(|s| s.values());
        DatabaseStats {
            total_topics: self.topics.len(),
            total_subtopics: self.topics.values().map(|s| s.len()).sum(),
            total_words: subtopics
                .map(|e| e.character_words.len() + e.defining_words.len())
                .sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    fn entry(&self, topic: &str, subtopic: &str) -> Result<&SubtopicEntry, DatabaseError> {
        self.topics
            .get(topic)
            .ok_or_else(|| DatabaseError::TopicNotFound(topic.to_string()))?
            .get(subtopic)
            .ok_or_else(|| DatabaseError::SubtopicNotFound {
                topic: topic.to_string(),
                subtopic: subtopic.to_string(),
            })
    }
}

/// Word lists need at least five entries of 3-12 characters, letters and
/// spaces only
fn check_word_list(words: &[String]) -> Result<(), String> {
    if words.len() < MIN_LIST_WORDS {
        return Err(format!(
            "need at least {} words, found {}",
            MIN_LIST_WORDS,
            words.len()
        ));
    }

    for word in words {
        let len = word.chars().count();
        if !(MIN_WORD_LENGTH..=MAX_WORD_LENGTH).contains(&len) {
            return Err(format!(
                "word '{}' must be between {} and {} characters",
                word, MIN_WORD_LENGTH, MAX_WORD_LENGTH
            ));
        }
        if !word.chars().all(|c| c == ' ' || c.is_ascii_alphabetic()) {
            return Err(format!("word '{}' must contain only letters and spaces", word));
        }
    }

    Ok(())
}

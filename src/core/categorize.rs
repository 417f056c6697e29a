//! Categorization and tagging of article bodies.
//!
//! Both operations are pure functions of the body text. Categories come
//! from a keyword table matched against normalized tokens; tags are
//! proper-noun-like phrases pulled from the original casing.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::safety::SafetyLimits;
use crate::domain::modality::DEFAULT_CATEGORY;
use crate::domain::ContentArtifact;
use crate::error::PipelineError;

/// Most tags kept per article
pub const MAX_TAGS: usize = 10;

// Runs of capitalized words ("European Central Bank") or acronyms ("NASA").
// Words join on spaces or tabs only; a line break ends the phrase.
static PROPER_NOUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][A-Za-z0-9'&-]*(?:[ \t]+[A-Z][A-Za-z0-9'&-]*)*").unwrap()
});

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "he", "her", "his", "i", "if", "in",
    "it", "its", "of", "on", "or", "our", "she", "so", "that", "the", "their", "there", "these",
    "they", "this", "those", "to", "we", "what", "when", "where", "while", "who", "with", "you",
];

/// Keyword table: category name to the keywords that select it.
///
/// Keywords are normalized the same way as bodies, so a multi-word keyword
/// matches a contiguous run of tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordTable(BTreeMap<String, Vec<String>>);

impl Default for KeywordTable {
    fn default() -> Self {
        let table: [(&str, &[&str]); 6] = [
            ("AI", &["artificial intelligence", "machine learning", "deep learning", "ai"]),
            ("Technology", &["technology", "gadgets", "innovation", "tech"]),
            ("Gadgets", &["smartphone", "tablet", "laptop", "gadget"]),
            ("Politics", &["government", "election", "elections", "policy", "politics"]),
            ("Health", &["medicine", "health", "wellness", "disease"]),
            ("Environment", &["climate", "environment", "sustainability"]),
        ];

        Self(
            table
                .iter()
                .map(|(category, keywords)| {
                    (category.to_string(), keywords.iter().map(|k| k.to_string()).collect())
                })
                .collect(),
        )
    }
}

impl KeywordTable {
    pub fn new(table: BTreeMap<String, Vec<String>>) -> Self {
        Self(table)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Categories whose keywords occur in the body; never empty
    pub fn categorize(&self, body: &str) -> BTreeSet<String> {
        let tokens = normalize(body);

        let mut matched: BTreeSet<String> = self
            .0
            .iter()
            .filter(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| contains_sequence(&tokens, &normalize(keyword)))
            })
            .map(|(category, _)| category.clone())
            .collect();

        if matched.is_empty() {
            matched.insert(DEFAULT_CATEGORY.to_string());
        }
        matched
    }
}

/// Lowercase, replace punctuation with spaces, split into tokens
pub fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn contains_sequence(tokens: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && tokens.windows(needle.len()).any(|window| window == needle)
}

/// Categorize with the built-in keyword table
pub fn categorize(body: &str) -> BTreeSet<String> {
    KeywordTable::default().categorize(body)
}

/// Up to ten unique proper-noun-like phrases, in order of first occurrence
pub fn tag(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for found in PROPER_NOUN_RE.find_iter(body) {
        let words: Vec<&str> = found
            .as_str()
            .split_whitespace()
            .skip_while(|w| STOPWORDS.contains(&w.to_lowercase().as_str()))
            .collect();
        if words.is_empty() {
            continue;
        }

        let phrase = words.join(" ");
        if seen.insert(phrase.to_lowercase()) {
            tags.push(phrase);
            if tags.len() == MAX_TAGS {
                break;
            }
        }
    }

    tags
}

/// Categories and tags for one artifact
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    pub categories: BTreeSet<String>,
    pub tags: Vec<String>,
}

/// Applies the keyword table and body limit to artifacts
pub struct CategorizationStage {
    keywords: KeywordTable,
    limits: SafetyLimits,
}

impl CategorizationStage {
    pub fn new(keywords: KeywordTable, limits: SafetyLimits) -> Self {
        Self { keywords, limits }
    }

    /// Fails only when the body exceeds the configured size limit
    #[instrument(skip(self, artifact), fields(artifact_id = %artifact.id))]
    pub fn run(&self, artifact: &ContentArtifact) -> Result<Categorization, PipelineError> {
        self.limits.validate_body(&artifact.body)?;

        let result = Categorization {
            categories: self.keywords.categorize(&artifact.body),
            tags: tag(&artifact.body),
        };
        debug!(categories = ?result.categories, tags = result.tags.len(), "Categorized");
        Ok(result)
    }
}

impl Default for CategorizationStage {
    fn default() -> Self {
        Self::new(KeywordTable::default(), SafetyLimits::default())
    }
}

//! Core data models for the paper-radar recommendation system.
//!
//! This module contains the fundamental data structures shared across the
//! crate: paper metadata, user interests, cached embedding records, and the
//! transient ranked view produced by a ranking pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single paper author.
///
/// Authors are stored as part of paper metadata. The catalogue only reliably
/// supplies a display name; affiliations are kept when the source provides
/// them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    /// Full name of the author
    pub name: String,

    /// Institutional affiliation, when the catalogue supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    /// Create an author with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
        }
    }
}

/// Core metadata for a paper fetched from the catalogue or loaded from the
/// local library.
///
/// The `id` is the stable catalogue identifier (e.g. `2401.12345`) and is
/// immutable once the paper is created; every cache and store keys off it.
/// The embedding is attached lazily by the resolver and cached, so a paper
/// loaded from a fresh fetch usually carries `None` here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Stable catalogue identifier
    pub id: String,

    /// Paper title
    pub title: String,

    /// Author list, in catalogue order
    pub authors: Vec<Author>,

    /// Abstract text
    pub abstract_text: String,

    /// Category tags (e.g. `cs.LG`, `cs.CV`)
    #[serde(default)]
    pub categories: Vec<String>,

    /// First publication timestamp
    pub published: DateTime<Utc>,

    /// Last update timestamp
    pub updated: DateTime<Utc>,

    /// Canonical document URL (PDF or abstract page)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Vector embedding of title + abstract, attached lazily
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Paper {
    /// The text that represents this paper for embedding purposes.
    ///
    /// Title and abstract are concatenated; the resolver normalizes the
    /// result before handing it to the embedding engine.
    pub fn embedding_text(&self) -> String {
        format!("{}\n{}", self.title, self.abstract_text)
    }
}

/// The kind of signal a user interest expresses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterestKind {
    /// Free-text topic (e.g. "diffusion models")
    Topic,
    /// Catalogue category tag (e.g. "cs.CV")
    Category,
    /// Author name
    Author,
}

/// A user-declared interest used to personalize paper ranking.
///
/// Interests are owned by the user and created/removed via explicit action.
/// The cached embedding, when present, was computed by some earlier session
/// and is not guaranteed fresh; the resolver decides whether to trust it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    /// Stable identifier
    pub id: String,

    /// Display name; also the text that gets embedded
    pub name: String,

    /// What kind of signal this interest is
    pub kind: InterestKind,

    /// Cached embedding of `name`, if one was computed before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// When the user created this interest
    pub created_at: DateTime<Utc>,
}

impl Interest {
    /// Create a new interest with a fresh timestamp and no cached embedding.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: InterestKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            embedding: None,
            created_at: Utc::now(),
        }
    }
}

/// A cached paper embedding, persisted independently of the paper itself.
///
/// At most one record exists per paper identifier; writers overwrite
/// (last-write-wins). The `model` tag records which embedding model produced
/// the vector so that a model change invalidates the entry instead of being
/// silently compared against vectors from a different model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Paper identifier this vector describes
    pub paper_id: String,

    /// The embedding vector
    pub vector: Vec<f32>,

    /// Name of the model that produced the vector
    pub model: String,

    /// When the vector was computed
    pub created_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    /// Create a record stamped with the current time.
    pub fn new(paper_id: impl Into<String>, vector: Vec<f32>, model: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            vector,
            model: model.into(),
            created_at: Utc::now(),
        }
    }
}

/// A paper annotated with its ranking result.
///
/// This is a transient, derived view: it is recomputed on every ranking pass
/// and never persisted. The score is cosine similarity clamped to 0 when
/// undefined (missing embedding, failed resolution, no interests).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPaper {
    /// The underlying paper
    pub paper: Paper,

    /// Best similarity score across all interests, in [0, 1]
    pub score: f32,

    /// Display name of the interest that produced the best score, if any
    pub matched_interest: Option<String>,
}

impl RankedPaper {
    /// Wrap a paper with no ranking signal (score 0, no matched interest).
    pub fn unscored(paper: Paper) -> Self {
        Self {
            paper,
            score: 0.0,
            matched_interest: None,
        }
    }
}

/// Role of a chat message in a paper conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a paper chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A persisted chat conversation about one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTranscript {
    /// Paper the conversation is about
    pub paper_id: String,

    /// Messages in order
    pub messages: Vec<ChatMessage>,

    /// Last time a message was appended
    pub updated_at: DateTime<Utc>,
}

/// A user note attached to a paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub paper_id: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tagged union over the two document grammars the pipeline understands.
/// Chunker and LLM extractor select their grammar/prompt by matching this
/// tag, never by inspecting strings (spec.md §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ScotusOpinion,
    ExecutiveOrder,
}

impl DocumentKind {
    pub const fn type_label(self) -> &'static str {
        match self {
            DocumentKind::ScotusOpinion => "Supreme Court Opinion",
            DocumentKind::ExecutiveOrder => "Executive Order",
        }
    }

    pub const fn source(self) -> Source {
        match self {
            DocumentKind::ScotusOpinion => Source::CourtListener,
            DocumentKind::ExecutiveOrder => Source::FederalRegister,
        }
    }

    /// Filename stem for this type's tracker file (spec.md §6.3).
    pub const fn tracker_file_stem(self) -> &'static str {
        match self {
            DocumentKind::ScotusOpinion => "scotus_ingestion",
            DocumentKind::ExecutiveOrder => "executive_orders_ingestion",
        }
    }

    pub const fn vector_collection(self) -> &'static str {
        match self {
            DocumentKind::ScotusOpinion => "supreme_court_opinions",
            DocumentKind::ExecutiveOrder => "executive_orders",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    CourtListener,
    FederalRegister,
}

impl Source {
    pub const fn label(self) -> &'static str {
        match self {
            Source::CourtListener => "CourtListener",
            Source::FederalRegister => "Federal Register",
        }
    }
}

/// The canonical ingestion input (spec.md §3). Borrowed, not owned, by
/// downstream components: once chunked, `content` may be dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub kind: DocumentKind,
    pub content: String,
    pub url: String,
    /// Source-specific leftovers that travel verbatim into the vector
    /// store's payload metadata (spec.md §9).
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
        kind: DocumentKind,
        content: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date: date.into(),
            kind,
            content: content.into(),
            url: url.into(),
            metadata: HashMap::new(),
        }
    }
}

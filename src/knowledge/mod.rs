//! Knowledge base of remediation guidance, keyed by probe identifier.
//!
//! The catalog is built once from the embedded article table and never
//! changes afterwards. Probes look their article up when they are
//! constructed and attach it to every result they produce.

mod articles;

use std::collections::HashMap;

use serde::Serialize;

use crate::probe::ProbeId;

/// Description and remediation text for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseArticle {
    pub id: ProbeId,
    pub description: &'static str,
    pub remediation: &'static str,
}

impl KnowledgeBaseArticle {
    /// The article returned for identifiers the catalog does not know.
    pub const fn unknown(id: ProbeId) -> Self {
        Self {
            id,
            description: "No knowledge base article is available for this probe.",
            remediation: "",
        }
    }

    /// Whether this is the placeholder for an unknown identifier.
    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown(self.id)
    }
}

/// Immutable lookup table from probe identifier to article.
///
/// Construct it once at start-up and share it by reference.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    articles: HashMap<ProbeId, KnowledgeBaseArticle>,
}

impl KnowledgeBase {
    /// The catalog embedded in this crate, covering every built-in probe.
    pub fn builtin() -> Self {
        Self::from_articles(articles::ARTICLES.iter().copied())
    }

    /// Build a catalog from arbitrary articles. Later duplicates win.
    pub fn from_articles(articles: impl IntoIterator<Item = KnowledgeBaseArticle>) -> Self {
        Self {
            articles: articles.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    /// Look up the article for `id`, falling back to
    /// [`KnowledgeBaseArticle::unknown`].
    pub fn article(&self, id: ProbeId) -> KnowledgeBaseArticle {
        self.articles
            .get(&id)
            .copied()
            .unwrap_or_else(|| KnowledgeBaseArticle::unknown(id))
    }

    pub fn contains(&self, id: ProbeId) -> bool {
        self.articles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Iterate over all articles, ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeBaseArticle> {
        let mut articles: Vec<_> = self.articles.values().collect();
        articles.sort_by_key(|a| a.id.as_str());
        articles.into_iter()
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

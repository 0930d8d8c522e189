//! Vector similarity search boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub similarity: f32,
}

/// A similarity index over stored code examples.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchHit>>;
}

/// Search for examples, treating any failure as "no results".
pub async fn search_or_empty(searcher: &dyn VectorSearch, query: &str) -> Vec<SearchHit> {
    match searcher.search(query).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!(error = %e, "vector search failed, continuing without examples");
            Vec::new()
        }
    }
}

/// In-memory searcher returning the same hits for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticSearch {
    hits: Vec<SearchHit>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl VectorSearch for StaticSearch {
    async fn search(&self, _query: &str) -> anyhow::Result<Vec<SearchHit>> {
        Ok(self.hits.clone())
    }
}

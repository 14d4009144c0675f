//! AI-generated news feed about the future of work and reskilling.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::extract::{ExtractError, extract_json};
use crate::genai::{GenerationError, Generator};

pub const NEWS_FAILED_MESSAGE: &str =
    "Não foi possível carregar as notícias agora. Tente novamente em alguns minutos.";

/// Number of items the prompt asks for.
pub const NEWS_ITEM_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl NewsError {
    pub fn user_message(&self) -> &'static str {
        NEWS_FAILED_MESSAGE
    }
}

#[derive(Deserialize)]
struct NewsDraft {
    #[serde(default)]
    items: Vec<NewsItemDraft>,
}

#[derive(Deserialize)]
struct NewsItemDraft {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
}

/// The news prompt.
pub fn build_news_prompt() -> String {
    format!(
        r#"Você é um assistente que gera notícias curtas sobre futuro do trabalho,
requalificação profissional e uso de IA para aprendizado.

Responda APENAS em JSON no formato:

{{
  "items": [
    {{
      "id": "1",
      "title": "Título curto da notícia",
      "summary": "Resumo em 2 ou 3 frases, em português do Brasil."
    }}
  ]
}}

Gere {NEWS_ITEM_COUNT} notícias diferentes."#
    )
}

fn into_items(draft: NewsDraft) -> Vec<NewsItem> {
    draft
        .items
        .into_iter()
        .enumerate()
        .map(|(i, item)| NewsItem {
            id: match item.id {
                Some(Value::String(s)) if !s.is_empty() => s,
                Some(Value::Number(n)) => n.to_string(),
                _ => (i + 1).to_string(),
            },
            title: item.title,
            summary: item.summary,
        })
        .collect()
}

/// The news list and its loading flag.
#[derive(Debug, Clone, Default)]
pub struct NewsFeed {
    items: Vec<NewsItem>,
    loading: bool,
}

impl NewsFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the items with a freshly generated set. On failure the
    /// current items are kept.
    pub async fn refresh(&mut self, generator: &dyn Generator) -> Result<&[NewsItem], NewsError> {
        self.loading = true;
        let result = Self::fetch(generator).await;
        self.loading = false;

        match result {
            Ok(items) => {
                info!(count = items.len(), "news refreshed");
                self.items = items;
                Ok(&self.items)
            }
            Err(e) => {
                warn!(error = %e, "news refresh failed");
                Err(e)
            }
        }
    }

    async fn fetch(generator: &dyn Generator) -> Result<Vec<NewsItem>, NewsError> {
        let raw = generator.generate_json(&build_news_prompt()).await?;
        let draft: NewsDraft = extract_json(&raw)?;
        Ok(into_items(draft))
    }
}

//! `reskill news`: one batch of generated market news.

use std::fmt::Write as _;

use anyhow::Result;

use reskill_core::news::{NewsFeed, NewsItem};

use crate::app::App;

pub async fn cmd_news(app: &App) -> Result<()> {
    let generator = app.generator()?;
    let mut feed = NewsFeed::new();
    let items = feed.refresh(&generator).await.map_err(|e| {
        let message = e.user_message();
        anyhow::Error::new(e).context(message)
    })?;
    print!("{}", render_news(items));
    Ok(())
}

pub fn render_news(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "Nenhuma notícia por enquanto.\n".to_string();
    }
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            let _ = writeln!(out);
        }
        let _ = writeln!(out, "{}. {}", i + 1, item.title);
        let _ = writeln!(out, "   {}", item.summary);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_numbers_items() {
        let items = vec![
            NewsItem {
                id: "a".into(),
                title: "IA generativa".into(),
                summary: "Demanda em alta.".into(),
            },
            NewsItem {
                id: "b".into(),
                title: "Dados".into(),
                summary: "Vagas remotas.".into(),
            },
        ];
        assert_eq!(
            render_news(&items),
            "1. IA generativa\n   Demanda em alta.\n\n2. Dados\n   Vagas remotas.\n"
        );
    }

    #[test]
    fn render_empty() {
        assert_eq!(render_news(&[]), "Nenhuma notícia por enquanto.\n");
    }
}

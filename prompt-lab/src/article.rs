//! Article loading from files and the built-in sample

use anyhow::{Context, Result, bail};
use std::path::Path;

const SAMPLE_TITLE: &str = "OpenAI Announces GPT-4 Turbo with Enhanced Capabilities";

const SAMPLE_ARTICLE: &str = "\
San Francisco, CA - OpenAI has unveiled GPT-4 Turbo, the latest iteration of its flagship language model, featuring significant improvements in reasoning, coding, and multimodal capabilities. The new model can process up to 128,000 tokens of context, allowing it to work with much longer documents and maintain coherent conversations across extended interactions.

Key enhancements include improved mathematical reasoning, better code generation across multiple programming languages, and enhanced ability to analyze images and documents. The model also features reduced hallucination rates and more accurate factual responses, addressing one of the primary concerns with earlier versions.

\"GPT-4 Turbo represents a major leap forward in AI capabilities while maintaining the safety standards we've established,\" said Sam Altman, CEO of OpenAI, during the announcement event. The company demonstrated the model's ability to analyze complex technical documents, generate sophisticated code solutions, and engage in nuanced discussions across various domains.

The new model is available through OpenAI's API with competitive pricing that's approximately 50% lower than the previous GPT-4 model. Early access has been granted to enterprise customers, with general availability expected in the coming weeks. OpenAI also announced partnerships with major technology companies to integrate GPT-4 Turbo into their platforms and services.

Industry experts have praised the development, noting that the enhanced context window and improved accuracy could significantly impact applications ranging from customer service to content creation and software development. However, some researchers have called for continued focus on AI safety and responsible deployment as these models become more powerful.";

/// Plain article text handed to the summarizer and Q&A engine
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub source: Option<String>,
}

impl Article {
    /// The built-in news article used when no file is given
    pub fn sample() -> Self {
        Self {
            title: SAMPLE_TITLE.to_string(),
            content: SAMPLE_ARTICLE.to_string(),
            source: None,
        }
    }

    /// Load an article from a text or markdown file
    ///
    /// The first non-empty line (minus any markdown heading marks) becomes the title.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read article: {}", path.display()))?;
        let fallback_title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled");
        let mut article = Self::from_text(&text, fallback_title)?;
        article.source = Some(path.display().to_string());
        Ok(article)
    }

    pub fn from_text(text: &str, fallback_title: &str) -> Result<Self> {
        let content = text.trim();
        if content.is_empty() {
            bail!("Article is empty");
        }

        let title = content
            .lines()
            .map(|l| l.trim().trim_start_matches('#').trim())
            .find(|l| !l.is_empty())
            .unwrap_or(fallback_title);

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            source: None,
        })
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_article() {
        let article = Article::sample();
        assert!(article.title.contains("GPT-4 Turbo"));
        assert!(article.word_count() > 200);
        assert!(article.source.is_none());
    }

    #[test]
    fn test_title_from_heading() {
        let article = Article::from_text("\n\n# Local News \n\nBody text here.", "file").unwrap();
        assert_eq!(article.title, "Local News");
        assert_eq!(article.word_count(), 6);
    }

    #[test]
    fn test_empty_article_rejected() {
        assert!(Article::from_text("  \n ", "file").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.md");
        std::fs::write(&path, "Headline\nSome words follow.").unwrap();

        let article = Article::from_file(&path).unwrap();
        assert_eq!(article.title, "Headline");
        assert_eq!(article.char_count(), "Headline\nSome words follow.".len());
        assert!(article.source.unwrap().ends_with("story.md"));
    }
}

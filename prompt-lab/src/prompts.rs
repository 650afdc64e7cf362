//! Prompt templates, temperature presets and summary styles

use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

pub fn summarize(article_text: &str) -> String {
    format!(
        "Please provide a 3-4 sentence summary of the following article:\n\n\
         Article: {article_text}\n\n\
         Summary:"
    )
}

pub fn style_summary(article_text: &str, style: Style) -> String {
    format!(
        "Please provide a 3-4 sentence summary of the following article in the style of {}:\n\n\
         Article: {article_text}\n\n\
         Summary:",
        style.description()
    )
}

pub fn question(article_text: &str, question: &str) -> String {
    format!(
        "Based on the article below, answer the following question:\n\n\
         Question: {question}\n\n\
         Article: {article_text}\n\n\
         Answer:"
    )
}

pub fn suggest_questions(article_text: &str, count: usize) -> String {
    format!(
        "Based on the following article, suggest {count} insightful questions that would help \
         readers better understand the key points, implications, or details.\n\n\
         Article: {article_text}\n\n\
         Please provide exactly {count} questions, each on a new line, without numbering:"
    )
}

/// Named temperatures used by the temperature experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperaturePreset {
    Deterministic,
    Balanced,
    Creative,
}

impl TemperaturePreset {
    pub const ALL: [TemperaturePreset; 3] = [
        TemperaturePreset::Deterministic,
        TemperaturePreset::Balanced,
        TemperaturePreset::Creative,
    ];

    pub fn value(&self) -> f32 {
        match self {
            Self::Deterministic => 0.1,
            Self::Balanced => 0.7,
            Self::Creative => 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Balanced => "balanced",
            Self::Creative => "creative",
        }
    }
}

impl fmt::Display for TemperaturePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Personality styles for styled summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Pirate,
    Comedian,
    SportsCommentator,
    Detective,
    Scientist,
}

impl Style {
    pub const ALL: [Style; 5] = [
        Style::Pirate,
        Style::Comedian,
        Style::SportsCommentator,
        Style::Detective,
        Style::Scientist,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pirate => "pirate",
            Self::Comedian => "comedian",
            Self::SportsCommentator => "sports_commentator",
            Self::Detective => "detective",
            Self::Scientist => "scientist",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pirate => "a swashbuckling pirate captain",
            Self::Comedian => "a stand-up comedian",
            Self::SportsCommentator => "an enthusiastic sports commentator",
            Self::Detective => "a mysterious detective",
            Self::Scientist => "a brilliant scientist explaining to colleagues",
        }
    }
}

impl FromStr for Style {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match Style::ALL.iter().find(|style| style.name() == normalized) {
            Some(style) => Ok(*style),
            None => bail!(
                "Unknown style: {}. Available: {}",
                s,
                Style::ALL.map(|s| s.name()).join(", ")
            ),
        }
    }
}

//! Article summarization and the temperature experiment

use llm_client::{GenerationResult, LlmError};
use log::{error, info};

use crate::article::Article;
use crate::llm::Lab;
use crate::prompts::{self, Style, TemperaturePreset};

/// One summary and the article it condenses
#[derive(Debug)]
pub struct Summary {
    pub result: GenerationResult,
    pub style: Option<Style>,
    article_words: usize,
}

impl Summary {
    /// Article words per summary word; 0 for an empty summary
    pub fn compression_ratio(&self) -> f64 {
        match self.result.word_count() {
            0 => 0.0,
            n => self.article_words as f64 / n as f64,
        }
    }
}

/// Outcome of one temperature setting; failures are kept, not dropped
#[derive(Debug)]
pub struct TemperatureRun {
    pub preset: TemperaturePreset,
    pub outcome: Result<Summary, LlmError>,
}

#[derive(Debug)]
pub struct Experiment {
    pub runs: Vec<TemperatureRun>,
}

impl Experiment {
    pub fn successes(&self) -> impl Iterator<Item = (TemperaturePreset, &Summary)> {
        self.runs
            .iter()
            .filter_map(|run| run.outcome.as_ref().ok().map(|s| (run.preset, s)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (TemperaturePreset, &LlmError)> {
        self.runs
            .iter()
            .filter_map(|run| run.outcome.as_ref().err().map(|e| (run.preset, e)))
    }

    /// Plain-language notes on how length changed with temperature
    pub fn observations(&self) -> Vec<String> {
        let mut notes = Vec::new();
        let successes: Vec<_> = self.successes().collect();
        if successes.len() < 2 {
            return notes;
        }

        let counts = successes.iter().map(|(_, s)| s.result.word_count());
        let min = counts.clone().min().unwrap_or(0);
        let max = counts.max().unwrap_or(0);
        notes.push(format!("Summary lengths varied from {} to {} words", min, max));

        let words_for = |preset: TemperaturePreset| {
            successes
                .iter()
                .find(|(p, _)| *p == preset)
                .map(|(_, s)| s.result.word_count())
        };
        if let (Some(low), Some(high)) = (
            words_for(TemperaturePreset::Deterministic),
            words_for(TemperaturePreset::Creative),
        ) {
            if low < high {
                notes.push(
                    "Lower temperature (deterministic) produced more concise summaries".into(),
                );
            } else if low > high {
                notes.push(
                    "Higher temperature (creative) produced more concise summaries".into(),
                );
            }
        }

        notes
    }
}

pub async fn summarize(
    lab: &mut Lab,
    article: &Article,
    temperature: f32,
) -> Result<Summary, LlmError> {
    info!("Generating summary with temperature {}", temperature);
    let result = lab
        .generate(prompts::summarize(&article.content), temperature)
        .await?;
    Ok(Summary {
        result,
        style: None,
        article_words: article.word_count(),
    })
}

pub async fn summarize_with_style(
    lab: &mut Lab,
    article: &Article,
    style: Style,
    temperature: f32,
) -> Result<Summary, LlmError> {
    info!("Generating {} style summary", style.name());
    let result = lab
        .generate(prompts::style_summary(&article.content, style), temperature)
        .await?;
    Ok(Summary {
        result,
        style: Some(style),
        article_words: article.word_count(),
    })
}

/// Summarize once per temperature preset, in order, keeping partial results
pub async fn experiment_with_temperatures(lab: &mut Lab, article: &Article) -> Experiment {
    let mut runs = Vec::with_capacity(TemperaturePreset::ALL.len());

    for preset in TemperaturePreset::ALL {
        info!(
            "Running experiment: {} (temperature={})",
            preset,
            preset.value()
        );
        let outcome = summarize(lab, article, preset.value()).await;
        match &outcome {
            Ok(summary) => info!(
                "{} summary generated ({} tokens)",
                preset,
                summary.result.usage.total()
            ),
            Err(e) => error!("Failed to generate {} summary: {}", preset, e),
        }
        runs.push(TemperatureRun { preset, outcome });
    }

    Experiment { runs }
}

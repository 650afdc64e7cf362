//! Markdown reports for summaries, experiments, Q&A sessions and strategy runs

use anyhow::{Context, Result};
use chrono::Local;
use llm_client::{GenerationResult, UsageLedger};
use std::fmt::Write as _;
use std::path::Path;

use crate::article::Article;
use crate::evaluator::{self, MAX_SCORE};
use crate::qa::{self, QaTurn, Suggestions};
use crate::strategies::StrategyRun;
use crate::summarizer::{Experiment, Summary};

const PREVIEW_CHARS: usize = 200;

/// Accumulates markdown sections for one run
#[derive(Debug, Default)]
pub struct Report {
    body: String,
}

impl Report {
    pub fn new(title: &str) -> Self {
        let mut body = String::new();
        let _ = writeln!(body, "# {}\n", title);
        let _ = writeln!(
            body,
            "_Generated {}_\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        Self { body }
    }

    pub fn article(&mut self, article: &Article) -> &mut Self {
        let _ = writeln!(self.body, "## Article\n");
        let _ = writeln!(self.body, "- **Title:** {}", article.title);
        if let Some(source) = &article.source {
            let _ = writeln!(self.body, "- **Source:** {}", source);
        }
        let _ = writeln!(
            self.body,
            "- **Length:** {} words, {} characters\n",
            article.word_count(),
            article.char_count()
        );
        self
    }

    pub fn summary(&mut self, summary: &Summary) -> &mut Self {
        let heading = match summary.style {
            Some(style) => format!("## Summary ({} style)", style.name()),
            None => "## Summary".to_string(),
        };
        let _ = writeln!(self.body, "{}\n", heading);
        let _ = writeln!(self.body, "{}\n", summary.result.text.trim());
        self.generation_details(&summary.result);
        let _ = writeln!(
            self.body,
            "- **Compression ratio:** {:.1}x\n",
            summary.compression_ratio()
        );
        self
    }

    pub fn experiment(&mut self, experiment: &Experiment) -> &mut Self {
        let _ = writeln!(self.body, "## Temperature Experiment\n");
        let _ = writeln!(self.body, "| Preset | Temperature | Words | Compression | Tokens |");
        let _ = writeln!(self.body, "|---|---|---|---|---|");
        for run in &experiment.runs {
            match &run.outcome {
                Ok(summary) => {
                    let _ = writeln!(
                        self.body,
                        "| {} | {} | {} | {:.1}x | {} |",
                        run.preset,
                        run.preset.value(),
                        summary.result.word_count(),
                        summary.compression_ratio(),
                        summary.result.usage.total()
                    );
                }
                Err(_) => {
                    let _ = writeln!(
                        self.body,
                        "| {} | {} | failed | - | - |",
                        run.preset,
                        run.preset.value()
                    );
                }
            }
        }
        let _ = writeln!(self.body);

        for run in &experiment.runs {
            let _ = writeln!(self.body, "### {} ({})\n", run.preset, run.preset.value());
            match &run.outcome {
                Ok(summary) => {
                    let _ = writeln!(self.body, "{}\n", preview(&summary.result.text));
                }
                Err(e) => {
                    let _ = writeln!(self.body, "**Error:** {}\n", e);
                }
            }
        }

        let notes = experiment.observations();
        if !notes.is_empty() {
            let _ = writeln!(self.body, "### Observations\n");
            for note in notes {
                let _ = writeln!(self.body, "- {}", note);
            }
            let _ = writeln!(self.body);
        }
        self
    }

    pub fn questions(&mut self, turns: &[QaTurn]) -> &mut Self {
        let _ = writeln!(self.body, "## Questions & Answers\n");
        if turns.is_empty() {
            let _ = writeln!(self.body, "_No questions asked._\n");
            return self;
        }
        for (i, turn) in turns.iter().enumerate() {
            let _ = writeln!(self.body, "### Q{}: {}\n", i + 1, turn.question);
            match &turn.answer {
                Ok(result) => {
                    let _ = writeln!(self.body, "{}\n", result.text.trim());
                    self.generation_details(result);
                    let _ = writeln!(self.body);
                }
                Err(e) => {
                    let _ = writeln!(self.body, "**Error:** {}\n", e);
                }
            }
        }
        self.session_analysis(turns);
        self
    }

    fn session_analysis(&mut self, turns: &[QaTurn]) {
        let analysis = qa::analyze(turns);
        let _ = writeln!(self.body, "### Session Analysis\n");
        let _ = writeln!(self.body, "- **Questions asked:** {}", analysis.total);
        let _ = writeln!(self.body, "- **Successful answers:** {}", analysis.successful);
        if analysis.failed > 0 {
            let _ = writeln!(self.body, "- **Failed answers:** {}", analysis.failed);
        }
        let _ = writeln!(self.body, "- **Tokens used:** {}", analysis.total_tokens);
        if analysis.successful > 0 {
            let _ = writeln!(
                self.body,
                "- **Average answer length:** {:.1} words",
                analysis.average_words
            );
        }
        let types: Vec<String> = analysis
            .question_types
            .iter()
            .map(|(kind, count)| format!("{} {}", kind, count))
            .collect();
        let _ = writeln!(self.body, "- **Question types:** {}\n", types.join(", "));

        let highlights = [
            ("Longest", &analysis.longest),
            ("Shortest", &analysis.shortest),
        ];
        for (label, highlight) in highlights {
            if let Some(h) = highlight {
                let _ = writeln!(
                    self.body,
                    "**{} answer ({} words):** {}\n\n> {}\n",
                    label, h.word_count, h.question, h.preview
                );
            }
        }
    }

    pub fn suggestions(&mut self, suggestions: &Suggestions) -> &mut Self {
        let _ = writeln!(self.body, "## Suggested Questions\n");
        if let Some(e) = &suggestions.failure {
            let _ = writeln!(
                self.body,
                "_Generation failed ({}); showing default questions._\n",
                e
            );
        }
        for (i, q) in suggestions.questions.iter().enumerate() {
            let _ = writeln!(self.body, "{}. {}", i + 1, q);
        }
        let _ = writeln!(self.body);
        self
    }

    pub fn strategies(&mut self, runs: &[StrategyRun]) -> &mut Self {
        let _ = writeln!(self.body, "## Prompting Strategy Comparison\n");
        let _ = writeln!(
            self.body,
            "| Strategy | Runs | Avg score (/{}) | Correctness | Clarity | Completeness | Conciseness | Avg tokens |",
            MAX_SCORE
        );
        let _ = writeln!(self.body, "|---|---|---|---|---|---|---|---|");
        for (strategy, avg) in evaluator::averages(runs) {
            let _ = writeln!(
                self.body,
                "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} | {:.0} |",
                strategy,
                avg.runs,
                avg.total,
                avg.correctness,
                avg.clarity,
                avg.completeness,
                avg.conciseness,
                avg.avg_tokens()
            );
        }
        let _ = writeln!(self.body);

        for run in runs {
            let _ = writeln!(
                self.body,
                "### Task {} ({}) - {}\n",
                run.task.id,
                run.task.task_type.name(),
                run.strategy
            );
            let _ = writeln!(self.body, "**Question:** {}\n", run.task.question);
            let _ = writeln!(self.body, "**Expected:** {}\n", run.task.expected_answer);
            match &run.response {
                Ok(result) => {
                    let scores = evaluator::score(run);
                    let _ = writeln!(self.body, "{}\n", preview(&result.text));
                    let _ = writeln!(
                        self.body,
                        "- **Score:** {}/{} (correctness {}, clarity {}, completeness {}, conciseness {})",
                        scores.total(),
                        MAX_SCORE,
                        scores.correctness,
                        scores.clarity,
                        scores.completeness,
                        scores.conciseness
                    );
                    self.generation_details(result);
                    let _ = writeln!(self.body);
                }
                Err(e) => {
                    let _ = writeln!(self.body, "**Error:** {}\n", e);
                }
            }
        }
        self
    }

    /// Per-provider token usage for the whole run
    pub fn usage(&mut self, ledger: &UsageLedger) -> &mut Self {
        let _ = writeln!(self.body, "## Token Usage\n");
        if ledger.is_empty() {
            let _ = writeln!(self.body, "_No successful requests._\n");
            return self;
        }
        let _ = writeln!(self.body, "| Provider | Requests | Input | Output | Total |");
        let _ = writeln!(self.body, "|---|---|---|---|---|");
        for (kind, usage) in ledger.providers() {
            let _ = writeln!(
                self.body,
                "| {} | {} | {} | {} | {} |",
                kind,
                usage.requests,
                usage.input_tokens,
                usage.output_tokens,
                usage.total_tokens()
            );
        }
        let total = ledger.grand_total();
        let _ = writeln!(
            self.body,
            "| **total** | {} | {} | {} | {} |\n",
            total.requests,
            total.input_tokens,
            total.output_tokens,
            total.total_tokens()
        );
        self
    }

    fn generation_details(&mut self, result: &GenerationResult) {
        let fallback = if result.used_fallback { " (fallback)" } else { "" };
        let _ = writeln!(
            self.body,
            "- **Provider:** {}{} / {}",
            result.provider, fallback, result.model
        );
        let _ = writeln!(
            self.body,
            "- **Tokens:** {} in, {} out",
            result.usage.input_tokens, result.usage.output_tokens
        );
        let _ = writeln!(
            self.body,
            "- **Latency:** {:.2}s",
            result.latency.as_secs_f64()
        );
    }

    pub fn as_str(&self) -> &str {
        &self.body
    }

    /// Write to `path`, or print to stdout when no path is given
    pub fn emit(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                std::fs::write(path, &self.body)
                    .with_context(|| format!("Failed to write report: {}", path.display()))?;
                println!("Report written to {}", path.display());
            }
            None => print!("{}", self.body),
        }
        Ok(())
    }
}

fn preview(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::*;
    use crate::strategies::{self, Strategy, TaskType};
    use crate::summarizer;

    #[tokio::test]
    async fn test_experiment_report_marks_failures() {
        let mut lab = lab_with(failing_on(&[2], "a tidy summary"));
        let experiment =
            summarizer::experiment_with_temperatures(&mut lab, &Article::sample()).await;

        let mut report = Report::new("Experiment");
        report.experiment(&experiment).usage(lab.ledger());
        let md = report.as_str();

        assert!(md.contains("| deterministic | 0.1 | 3 |"));
        assert!(md.contains("| creative | 1 | failed | - | - |"));
        assert!(md.contains("**Error:**"));
        assert!(md.contains("| gemini | 2 | 200 | 40 | 240 |"));
    }

    #[tokio::test]
    async fn test_strategy_report_has_averages() {
        let mut lab = lab_with(answering("391"));
        let tasks = strategies::select_tasks(&[TaskType::Math], Some(1));
        let runs = strategies::run_comparison(&mut lab, &tasks, &[Strategy::ZeroShot]).await;

        let mut report = Report::new("Strategies");
        report.strategies(&runs);

        assert!(report.as_str().contains("| zero_shot | 1 |"));
        assert!(report.as_str().contains("**Expected:** 391"));
    }

    #[tokio::test]
    async fn test_questions_report_includes_analysis() {
        let mut lab = lab_with(failing_on(&[1], "Twelve words."));
        let questions = vec!["What is it?".to_string(), "Why now?".to_string()];
        let turns = qa::ask_multiple(&mut lab, &Article::sample(), &questions, 0.3).await;

        let mut report = Report::new("Q&A");
        report.questions(&turns);
        let md = report.as_str();

        assert!(md.contains("### Session Analysis"));
        assert!(md.contains("- **Failed answers:** 1"));
        assert!(md.contains("- **Question types:** what 1, why 1"));
        assert!(md.contains("**Longest answer (2 words):** What is it?"));
    }

    #[tokio::test]
    async fn test_failed_suggestions_are_noted() {
        let mut lab = lab_with(failing_on(&[0], "unused"));
        let suggestions = qa::suggest_questions(&mut lab, &Article::sample(), 5).await;

        let mut report = Report::new("Suggestions");
        report.suggestions(&suggestions);

        assert!(report.as_str().contains("showing default questions"));
        assert!(report.as_str().contains("1. What are the main points"));
    }

    #[test]
    fn test_empty_usage_and_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        let mut report = Report::new("Empty");
        report.usage(&UsageLedger::new());
        report.emit(Some(&path)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Empty"));
        assert!(written.contains("_No successful requests._"));
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(PREVIEW_CHARS + 10);
        assert!(preview(&long).ends_with("..."));
        assert_eq!(preview("  short  "), "short");
    }
}

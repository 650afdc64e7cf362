//! Question answering over an article

use anyhow::Result;
use llm_client::{GenerationResult, LlmError};
use log::{error, info};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, Write};

use crate::article::Article;
use crate::llm::Lab;
use crate::prompts;

/// Low temperature keeps answers anchored to the article
pub const QA_TEMPERATURE: f32 = 0.3;

const SUGGEST_TEMPERATURE: f32 = 0.7;

const EXIT_WORDS: [&str; 4] = ["quit", "exit", "done", "q"];

#[derive(Debug)]
pub struct QaTurn {
    pub question: String,
    pub answer: Result<GenerationResult, LlmError>,
}

pub async fn ask_question(
    lab: &mut Lab,
    article: &Article,
    question: &str,
    temperature: f32,
) -> QaTurn {
    info!("Asking question: {}", truncate(question, 50));
    let answer = lab
        .generate(prompts::question(&article.content, question), temperature)
        .await;
    QaTurn {
        question: question.to_string(),
        answer,
    }
}

/// Answer every question in order; one failure does not stop the rest
pub async fn ask_multiple(
    lab: &mut Lab,
    article: &Article,
    questions: &[String],
    temperature: f32,
) -> Vec<QaTurn> {
    let prompts: Vec<String> = questions
        .iter()
        .map(|q| prompts::question(&article.content, q))
        .collect();

    let answers = lab.generate_batch(prompts, temperature).await;

    questions
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(i, (question, answer))| {
            match &answer {
                Ok(result) => info!(
                    "Question {} answered ({} tokens)",
                    i + 1,
                    result.usage.total()
                ),
                Err(e) => error!("Failed to answer question {}: {}", i + 1, e),
            }
            QaTurn {
                question: question.clone(),
                answer,
            }
        })
        .collect()
}

/// Read questions from `input` until EOF or an exit word, printing answers to `output`
pub async fn interactive_session<R, W>(
    lab: &mut Lab,
    article: &Article,
    mut input: R,
    output: &mut W,
) -> Result<Vec<QaTurn>>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Starting interactive Q&A session for: {}", article.title)?;
    writeln!(output, "Article length: {} words", article.word_count())?;
    writeln!(output, "Type 'quit', 'exit', or 'done' to end the session.")?;
    writeln!(output, "{}", "-".repeat(50))?;

    let mut turns = Vec::new();
    let mut line = String::new();

    loop {
        write!(output, "\nQuestion {}: ", turns.len() + 1)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();

        if question.is_empty() {
            writeln!(output, "Please enter a question.")?;
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            break;
        }

        let turn = ask_question(lab, article, question, QA_TEMPERATURE).await;
        match &turn.answer {
            Ok(result) => {
                writeln!(output, "\nAnswer: {}", result.text.trim())?;
                writeln!(output, "(Used {} tokens)", result.usage.total())?;
            }
            Err(e) => writeln!(output, "\nError: {}", e)?,
        }
        turns.push(turn);
    }

    writeln!(output, "\nQ&A session completed. Asked {} questions.", turns.len())?;
    Ok(turns)
}

/// Asked when the model cannot suggest any
pub const DEFAULT_QUESTIONS: [&str; 5] = [
    "What are the main points discussed in this article?",
    "What are the key implications or consequences mentioned?",
    "Who are the main people or organizations involved?",
    "What evidence or data is presented to support the claims?",
    "What questions or concerns are raised by this information?",
];

#[derive(Debug)]
pub struct Suggestions {
    pub questions: Vec<String>,
    /// Set when generation failed and `questions` are the defaults
    pub failure: Option<LlmError>,
}

/// Ask the model for questions worth asking about the article
///
/// Falls back to `DEFAULT_QUESTIONS` when generation fails.
pub async fn suggest_questions(lab: &mut Lab, article: &Article, count: usize) -> Suggestions {
    info!("Generating {} question suggestions", count);
    let outcome = lab
        .generate(
            prompts::suggest_questions(&article.content, count),
            SUGGEST_TEMPERATURE,
        )
        .await;

    match outcome {
        Ok(result) => Suggestions {
            questions: parse_suggestions(&result.text, count),
            failure: None,
        },
        Err(e) => {
            error!("Failed to generate questions: {}", e);
            Suggestions {
                questions: DEFAULT_QUESTIONS
                    .iter()
                    .take(count)
                    .map(|q| q.to_string())
                    .collect(),
                failure: Some(e),
            }
        }
    }
}

/// One question per line, with list markers and numbering stripped
pub fn parse_suggestions(text: &str, count: usize) -> Vec<String> {
    const PREFIXES: [&str; 5] = ["- ", "• ", "* ", "Q: ", "Question: "];

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.chars().all(|c| c.is_ascii_digit()))
        .map(|line| {
            let mut line = strip_numbering(line);
            for prefix in PREFIXES {
                if let Some(rest) = line.strip_prefix(prefix) {
                    line = rest;
                }
            }
            let line = line.trim();
            match line.strip_suffix("??") {
                Some(rest) => format!("{}?", rest),
                None => line.to_string(),
            }
        })
        .filter(|q| !q.is_empty())
        .take(count)
        .collect()
}

/// Question category by its leading word
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QuestionType {
    What,
    How,
    Why,
    When,
    Where,
    Who,
    Other,
}

impl QuestionType {
    pub fn classify(question: &str) -> Self {
        let first: String = question
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphabetic())
            .flat_map(char::to_lowercase)
            .collect();
        match first.as_str() {
            "what" => Self::What,
            "how" => Self::How,
            "why" => Self::Why,
            "when" => Self::When,
            "where" => Self::Where,
            "who" => Self::Who,
            _ => Self::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::What => "what",
            Self::How => "how",
            Self::Why => "why",
            Self::When => "when",
            Self::Where => "where",
            Self::Who => "who",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerHighlight {
    pub question: String,
    pub preview: String,
    pub word_count: usize,
}

/// Aggregate view of a Q&A session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QaAnalysis {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_tokens: u64,
    /// Mean answer length in words over successful answers
    pub average_words: f64,
    pub question_types: BTreeMap<QuestionType, usize>,
    pub longest: Option<AnswerHighlight>,
    pub shortest: Option<AnswerHighlight>,
}

const HIGHLIGHT_CHARS: usize = 100;

pub fn analyze(turns: &[QaTurn]) -> QaAnalysis {
    let answered: Vec<(&str, &GenerationResult)> = turns
        .iter()
        .filter_map(|t| t.answer.as_ref().ok().map(|r| (t.question.as_str(), r)))
        .collect();

    let mut question_types = BTreeMap::new();
    for turn in turns {
        *question_types
            .entry(QuestionType::classify(&turn.question))
            .or_insert(0) += 1;
    }

    let highlight = |(question, result): &(&str, &GenerationResult)| AnswerHighlight {
        question: question.to_string(),
        preview: truncate(result.text.trim(), HIGHLIGHT_CHARS),
        word_count: result.word_count(),
    };

    let total_words: usize = answered.iter().map(|(_, r)| r.word_count()).sum();

    QaAnalysis {
        total: turns.len(),
        successful: answered.len(),
        failed: turns.len() - answered.len(),
        total_tokens: answered.iter().map(|(_, r)| r.usage.total()).sum(),
        average_words: if answered.is_empty() {
            0.0
        } else {
            total_words as f64 / answered.len() as f64
        },
        question_types,
        longest: answered
            .iter()
            .max_by_key(|(_, r)| r.word_count())
            .map(highlight),
        shortest: answered
            .iter()
            .min_by_key(|(_, r)| r.word_count())
            .map(highlight),
    }
}

/// Drop a leading "1." or "2)" that models add despite being told not to
fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    let rest = &line[digits..];
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map(str::trim_start)
        .unwrap_or(line)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::*;

    #[test]
    fn test_parse_suggestions() {
        let text = "1. What changed?\n\n- Who announced it??\n• Why now?\n7\nQuestion: How much does it cost?\nExtra?";
        let questions = parse_suggestions(text, 4);
        assert_eq!(
            questions,
            vec![
                "What changed?",
                "Who announced it?",
                "Why now?",
                "How much does it cost?"
            ]
        );
    }

    fn turn(question: &str, answer: Option<&str>) -> QaTurn {
        QaTurn {
            question: question.to_string(),
            answer: match answer {
                Some(text) => Ok(GenerationResult {
                    text: text.to_string(),
                    model: "m".into(),
                    usage: llm_client::TokenUsage::new(10, 5),
                    provider: llm_client::ProviderKind::Gemini,
                    latency: Default::default(),
                    temperature: QA_TEMPERATURE,
                    used_fallback: false,
                }),
                None => Err(LlmError::Timeout),
            },
        }
    }

    #[test]
    fn test_question_classification() {
        assert_eq!(QuestionType::classify("What changed?"), QuestionType::What);
        assert_eq!(QuestionType::classify("  why now?"), QuestionType::Why);
        assert_eq!(QuestionType::classify("Who's involved?"), QuestionType::Who);
        assert_eq!(QuestionType::classify("However, is it safe?"), QuestionType::Other);
        assert_eq!(QuestionType::classify("Is it cheaper?"), QuestionType::Other);
    }

    #[test]
    fn test_analyze_session() {
        let turns = vec![
            turn("What is new?", Some("A longer model with a bigger context window.")),
            turn("How much?", Some("Half price.")),
            turn("What about safety?", None),
            turn("Is it out?", Some("In a few more weeks.")),
        ];

        let analysis = analyze(&turns);

        assert_eq!(analysis.total, 4);
        assert_eq!(analysis.successful, 3);
        assert_eq!(analysis.failed, 1);
        assert_eq!(analysis.total_tokens, 45);
        assert_eq!(analysis.average_words, 5.0);
        assert_eq!(analysis.question_types[&QuestionType::What], 2);
        assert_eq!(analysis.question_types[&QuestionType::How], 1);
        assert_eq!(analysis.question_types[&QuestionType::Other], 1);
        assert!(!analysis.question_types.contains_key(&QuestionType::Why));

        let longest = analysis.longest.unwrap();
        assert_eq!(longest.question, "What is new?");
        assert_eq!(longest.word_count, 8);
        let shortest = analysis.shortest.unwrap();
        assert_eq!(shortest.question, "How much?");
        assert_eq!(shortest.preview, "Half price.");
    }

    #[test]
    fn test_analyze_without_answers() {
        let analysis = analyze(&[turn("Why?", None)]);
        assert_eq!(analysis.successful, 0);
        assert_eq!(analysis.average_words, 0.0);
        assert!(analysis.longest.is_none());
        assert!(analysis.shortest.is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
        assert_eq!(truncate("short", 50), "short");
    }

    #[tokio::test]
    async fn test_batch_with_one_failure_keeps_order() {
        let mut lab = lab_with(failing_on(&[1], "An answer."));
        let questions: Vec<String> = ["Who?", "What?", "When?"]
            .iter()
            .map(|q| q.to_string())
            .collect();

        let turns = ask_multiple(&mut lab, &Article::sample(), &questions, QA_TEMPERATURE).await;

        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].question, "Who?");
        assert!(turns[0].answer.is_ok());
        assert_eq!(turns[1].question, "What?");
        assert!(turns[1].answer.is_err());
        assert_eq!(turns[2].question, "When?");
        assert!(turns[2].answer.is_ok());
    }

    #[tokio::test]
    async fn test_interactive_session_until_exit_word() {
        let provider = answering("Because.");
        let mut lab = lab_with(provider.clone());
        let input = std::io::Cursor::new("Why?\n\n  \nHow?\nquit\nNever asked?\n");
        let mut output = Vec::new();

        let turns = interactive_session(&mut lab, &Article::sample(), input, &mut output)
            .await
            .unwrap();

        assert_eq!(turns.len(), 2);
        assert_eq!(provider.call_count(), 2);
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Answer: Because."));
        assert!(printed.contains("Please enter a question."));
        assert!(printed.contains("Asked 2 questions."));
    }

    #[tokio::test]
    async fn test_suggest_questions_parses_reply() {
        let mut lab = lab_with(answering("- First?\n- Second?\n- Third?"));
        let suggestions = suggest_questions(&mut lab, &Article::sample(), 2).await;
        assert_eq!(suggestions.questions, vec!["First?", "Second?"]);
        assert!(suggestions.failure.is_none());
    }

    #[tokio::test]
    async fn test_suggest_questions_falls_back_to_defaults() {
        let mut lab = lab_with(failing_on(&[0], "unused"));
        let suggestions = suggest_questions(&mut lab, &Article::sample(), 3).await;

        assert_eq!(suggestions.questions.len(), 3);
        assert_eq!(suggestions.questions[0], DEFAULT_QUESTIONS[0]);
        assert!(matches!(suggestions.failure, Some(LlmError::ApiFailure { .. })));
    }
}

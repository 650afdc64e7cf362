//! Heuristic rubric scoring for strategy comparison runs
//!
//! Each criterion is scored 1-3 (0 when the call failed), for a maximum of 12.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::strategies::{Strategy, StrategyRun, Task, TaskType};

pub const MAX_SCORE: u32 = 12;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid number pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub correctness: u32,
    pub clarity: u32,
    pub completeness: u32,
    pub conciseness: u32,
}

impl Scores {
    pub fn total(&self) -> u32 {
        self.correctness + self.clarity + self.completeness + self.conciseness
    }
}

pub fn score(run: &StrategyRun) -> Scores {
    match &run.response {
        Ok(result) => Scores {
            correctness: correctness(&run.task, &result.text),
            clarity: clarity(&result.text, run.strategy),
            completeness: completeness(&result.text, run.strategy),
            conciseness: conciseness(&result.text, run.strategy),
        },
        Err(_) => Scores::default(),
    }
}

fn correctness(task: &Task, actual: &str) -> u32 {
    let expected = task.expected_answer.trim().to_lowercase();
    let actual_lower = actual.trim().to_lowercase();

    match task.task_type {
        TaskType::Math => {
            // Compare numbers with thousands separators removed
            let expected_num = first_number(task.expected_answer);
            let actual_num = first_number(actual);
            match (expected_num, actual_num) {
                (Some(e), Some(a)) if e == a => 3,
                (Some(_), Some(_)) => 0,
                _ => text_match(&expected, &actual_lower),
            }
        }
        TaskType::Logic => {
            if actual_lower.contains(&expected) {
                return 3;
            }
            let words: Vec<&str> = expected.split_whitespace().collect();
            let matches = words.iter().filter(|w| actual_lower.contains(*w)).count();
            if matches * 2 > words.len() { 2 } else { 1 }
        }
        TaskType::Reasoning => {
            if expected.contains("necessarily") && actual_lower.contains("necessarily") {
                3
            } else if expected
                .split_whitespace()
                .any(|w| actual_lower.contains(w))
            {
                2
            } else {
                1
            }
        }
    }
}

fn first_number(text: &str) -> Option<String> {
    let cleaned = text.replace(',', "");
    NUMBER.find(&cleaned).map(|m| m.as_str().to_string())
}

fn text_match(expected: &str, actual: &str) -> u32 {
    if expected == actual {
        3
    } else if actual.contains(expected) || expected.contains(actual) {
        2
    } else {
        1
    }
}

fn clarity(response: &str, strategy: Strategy) -> u32 {
    let lower = response.to_lowercase();
    let count = |words: &[&str]| words.iter().filter(|w| lower.contains(*w)).count();

    if strategy == Strategy::ChainOfThought {
        match count(&["step", "first", "second", "next", "then", "therefore", "because"]) {
            n if n >= 3 => 3,
            2 => 2,
            _ => 1,
        }
    } else {
        match count(&["because", "since", "therefore", "thus", "hence", "so", "if", "then"]) {
            n if n >= 2 => 3,
            1 => 2,
            _ => 1,
        }
    }
}

fn completeness(response: &str, strategy: Strategy) -> u32 {
    let len = response.trim().chars().count();
    let (full, adequate) = if strategy == Strategy::ChainOfThought {
        (200, 100)
    } else {
        (50, 20)
    };
    if len >= full {
        3
    } else if len >= adequate {
        2
    } else {
        1
    }
}

fn conciseness(response: &str, strategy: Strategy) -> u32 {
    let words = response.split_whitespace().count();
    let (tight, moderate) = if strategy == Strategy::ChainOfThought {
        (150, 250)
    } else {
        (50, 100)
    };
    if words <= tight {
        3
    } else if words <= moderate {
        2
    } else {
        1
    }
}

/// Mean scores and token totals for one strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyAverages {
    pub runs: usize,
    pub total: f64,
    pub correctness: f64,
    pub clarity: f64,
    pub completeness: f64,
    pub conciseness: f64,
    pub total_tokens: u64,
}

impl StrategyAverages {
    pub fn avg_tokens(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.total_tokens as f64 / self.runs as f64
        }
    }
}

pub fn averages(runs: &[StrategyRun]) -> BTreeMap<Strategy, StrategyAverages> {
    let mut sums: BTreeMap<Strategy, (usize, Scores, u64)> = BTreeMap::new();

    for run in runs {
        let scores = score(run);
        let tokens = run.response.as_ref().map(|r| r.usage.total()).unwrap_or(0);
        let entry = sums.entry(run.strategy).or_default();
        entry.0 += 1;
        entry.1.correctness += scores.correctness;
        entry.1.clarity += scores.clarity;
        entry.1.completeness += scores.completeness;
        entry.1.conciseness += scores.conciseness;
        entry.2 += tokens;
    }

    sums.into_iter()
        .map(|(strategy, (n, s, tokens))| {
            let mean = |v: u32| v as f64 / n as f64;
            (
                strategy,
                StrategyAverages {
                    runs: n,
                    total: mean(s.total()),
                    correctness: mean(s.correctness),
                    clarity: mean(s.clarity),
                    completeness: mean(s.completeness),
                    conciseness: mean(s.conciseness),
                    total_tokens: tokens,
                },
            )
        })
        .collect()
}

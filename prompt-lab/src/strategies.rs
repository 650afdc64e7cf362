//! Zero-shot, few-shot and chain-of-thought prompting over a fixed task set

use anyhow::{Result, bail};
use llm_client::{GenerationResult, LlmError};
use log::{error, info};
use std::fmt;
use std::str::FromStr;

use crate::llm::Lab;

/// Temperature for strategy comparison runs
pub const STRATEGY_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskType {
    Logic,
    Math,
    Reasoning,
}

impl TaskType {
    pub const ALL: [TaskType; 3] = [TaskType::Logic, TaskType::Math, TaskType::Reasoning];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Logic => "logic",
            Self::Math => "math",
            Self::Reasoning => "reasoning",
        }
    }
}

impl FromStr for TaskType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "logic" => Ok(Self::Logic),
            "math" => Ok(Self::Math),
            "reasoning" => Ok(Self::Reasoning),
            _ => bail!("Unknown task type: {}. Available: logic, math, reasoning", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    ZeroShot,
    FewShot,
    ChainOfThought,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [
        Strategy::ZeroShot,
        Strategy::FewShot,
        Strategy::ChainOfThought,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ZeroShot => "zero_shot",
            Self::FewShot => "few_shot",
            Self::ChainOfThought => "cot",
        }
    }

    pub fn prompt(&self, task: &Task) -> String {
        let q = task.question;
        match (self, task.task_type) {
            (Self::ZeroShot, TaskType::Logic) => format!("Solve this logic puzzle: {q}"),
            (Self::ZeroShot, TaskType::Math) => format!("Solve this math problem: {q}"),
            (Self::ZeroShot, TaskType::Reasoning) => format!("Answer this question: {q}"),

            (Self::FewShot, TaskType::Logic) => format!(
                "Solve these logic puzzles:\n\n\
                 Example 1:\n\
                 Puzzle: If all cats are animals and Fluffy is a cat, is Fluffy an animal?\n\
                 Answer: Yes, because if all cats are animals and Fluffy is a cat, then Fluffy must be an animal.\n\n\
                 Example 2:\n\
                 Puzzle: Tom is taller than Jerry. Jerry is taller than Spike. Who is the shortest?\n\
                 Answer: Spike, because if Tom > Jerry and Jerry > Spike, then Spike is the shortest.\n\n\
                 Now solve:\n\
                 Puzzle: {q}\n\
                 Answer:"
            ),
            (Self::FewShot, TaskType::Math) => format!(
                "Solve these math problems:\n\n\
                 Example 1:\n\
                 Problem: A car travels 50 km in 1 hour. How far will it go in 3 hours?\n\
                 Answer: 150 km (50 km/hour × 3 hours = 150 km)\n\n\
                 Example 2:\n\
                 Problem: What is 15 × 8?\n\
                 Answer: 120\n\n\
                 Now solve:\n\
                 Problem: {q}\n\
                 Answer:"
            ),
            (Self::FewShot, TaskType::Reasoning) => format!(
                "Answer these reasoning questions:\n\n\
                 Example 1:\n\
                 Question: If Sarah is older than Mike, and Mike is older than Lisa, who is the oldest?\n\
                 Answer: Sarah is the oldest.\n\n\
                 Example 2:\n\
                 Question: A bakery makes 12 cookies per hour. How many cookies in 4 hours?\n\
                 Answer: 48 cookies (12 × 4 = 48)\n\n\
                 Now answer:\n\
                 Question: {q}\n\
                 Answer:"
            ),

            (Self::ChainOfThought, TaskType::Logic) => format!(
                "Solve this logic puzzle step by step, showing your reasoning:\n\n\
                 Puzzle: {q}\n\n\
                 Think step by step and explain your reasoning:"
            ),
            (Self::ChainOfThought, TaskType::Math) => format!(
                "Solve this math problem step by step:\n\n\
                 Problem: {q}\n\n\
                 Show your work step by step:"
            ),
            (Self::ChainOfThought, TaskType::Reasoning) => format!(
                "Answer this question by thinking through it step by step:\n\n\
                 Question: {q}\n\n\
                 Think step by step and explain your reasoning:"
            ),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "zero_shot" | "zero" => Ok(Self::ZeroShot),
            "few_shot" | "few" => Ok(Self::FewShot),
            "cot" | "chain_of_thought" => Ok(Self::ChainOfThought),
            _ => bail!("Unknown strategy: {}. Available: zero_shot, few_shot, cot", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task {
    pub id: u32,
    pub task_type: TaskType,
    pub question: &'static str,
    pub expected_answer: &'static str,
}

const fn task(
    id: u32,
    task_type: TaskType,
    question: &'static str,
    expected_answer: &'static str,
) -> Task {
    Task {
        id,
        task_type,
        question,
        expected_answer,
    }
}

pub const TASKS: [Task; 9] = [
    task(
        1,
        TaskType::Logic,
        "Alice is older than Bob. Bob is older than Charlie. Who is the youngest?",
        "Charlie",
    ),
    task(
        2,
        TaskType::Logic,
        "If all roses are flowers and some flowers are red, can we conclude that some roses are red?",
        "No, we cannot conclude that. While all roses are flowers, we don't know if the red flowers include roses.",
    ),
    task(
        3,
        TaskType::Logic,
        "In a group of people, everyone who likes pizza also likes cheese. Sarah doesn't like cheese. Does Sarah like pizza?",
        "No, Sarah does not like pizza. If she did, she would have to like cheese too.",
    ),
    task(4, TaskType::Math, "What is 23 × 17?", "391"),
    task(
        5,
        TaskType::Math,
        "If a train travels 120 km in 2 hours, what is its average speed in km/h?",
        "60 km/h",
    ),
    task(6, TaskType::Math, "Solve for x: 2x + 5 = 17", "x = 6"),
    task(
        7,
        TaskType::Reasoning,
        "If it is raining, the ground will be wet. The ground is wet. Does it mean it rained?",
        "Not necessarily (other causes possible).",
    ),
    task(
        8,
        TaskType::Reasoning,
        "A company's profits increased by 20% this year. Last year they made $100,000. How much did they make this year?",
        "$120,000",
    ),
    task(
        9,
        TaskType::Reasoning,
        "Every bird can fly. Penguins are birds. Can penguins fly?",
        "This presents a logical contradiction. The premise 'every bird can fly' is actually false, as penguins are flightless birds.",
    ),
];

/// Tasks of the given types; the first `per_type` of each when sampling
pub fn select_tasks(types: &[TaskType], per_type: Option<usize>) -> Vec<Task> {
    let types: &[TaskType] = if types.is_empty() {
        &TaskType::ALL
    } else {
        types
    };

    let mut selected = Vec::new();
    for task_type in TaskType::ALL.iter().filter(|t| types.contains(t)) {
        let of_type = TASKS.iter().filter(|t| t.task_type == *task_type).copied();
        match per_type {
            Some(n) => selected.extend(of_type.take(n)),
            None => selected.extend(of_type),
        }
    }
    selected
}

#[derive(Debug)]
pub struct StrategyRun {
    pub task: Task,
    pub strategy: Strategy,
    pub prompt: String,
    pub response: Result<GenerationResult, LlmError>,
}

/// Run every strategy against every task, task by task
pub async fn run_comparison(
    lab: &mut Lab,
    tasks: &[Task],
    strategies: &[Strategy],
) -> Vec<StrategyRun> {
    let mut runs = Vec::with_capacity(tasks.len() * strategies.len());

    for (i, task) in tasks.iter().enumerate() {
        info!(
            "Task {}/{} ({}): {}",
            i + 1,
            tasks.len(),
            task.task_type.name(),
            task.question
        );
        for strategy in strategies {
            let prompt = strategy.prompt(task);
            let response = lab.generate(prompt.clone(), STRATEGY_TEMPERATURE).await;
            if let Err(e) = &response {
                error!("{} failed on task {}: {}", strategy, task.id, e);
            }
            runs.push(StrategyRun {
                task: *task,
                strategy: *strategy,
                prompt,
                response,
            });
        }
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::*;

    #[test]
    fn test_every_prompt_embeds_question() {
        for task in TASKS {
            for strategy in Strategy::ALL {
                assert!(strategy.prompt(&task).contains(task.question));
            }
        }
        let cot = Strategy::ChainOfThought.prompt(&TASKS[3]);
        assert!(cot.contains("step by step"));
    }

    #[test]
    fn test_select_tasks() {
        assert_eq!(select_tasks(&[], None).len(), 9);

        let sample: Vec<u32> = select_tasks(&[], Some(1)).iter().map(|t| t.id).collect();
        assert_eq!(sample, vec![1, 4, 7]);

        let math: Vec<u32> = select_tasks(&[TaskType::Math], None).iter().map(|t| t.id).collect();
        assert_eq!(math, vec![4, 5, 6]);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("cot".parse::<Strategy>().unwrap(), Strategy::ChainOfThought);
        assert_eq!("Few-Shot".parse::<Strategy>().unwrap(), Strategy::FewShot);
        assert!("one_shot".parse::<Strategy>().is_err());
        assert_eq!("MATH".parse::<TaskType>().unwrap(), TaskType::Math);
    }

    #[tokio::test]
    async fn test_comparison_covers_grid_in_order() {
        let provider = answering("391");
        let mut lab = lab_with(provider.clone());
        let tasks = select_tasks(&[TaskType::Math], Some(2));

        let runs = run_comparison(&mut lab, &tasks, &Strategy::ALL).await;

        assert_eq!(runs.len(), 6);
        assert_eq!(runs[0].task.id, 4);
        assert_eq!(runs[0].strategy, Strategy::ZeroShot);
        assert_eq!(runs[5].task.id, 5);
        assert_eq!(runs[5].strategy, Strategy::ChainOfThought);
        assert_eq!(provider.call_count(), 6);
    }
}

mod article;
mod evaluator;
mod llm;
mod prompts;
mod qa;
mod report;
mod strategies;
mod summarizer;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use llm::Lab;
use llm_client::{Config, LlmClient, ProviderKind, ProviderSettings};
use std::path::{Path, PathBuf};

use article::Article;
use prompts::Style;
use report::Report;
use strategies::{Strategy, TaskType};

#[derive(Parser, Debug)]
#[command(
    name = "prompt-lab",
    about = "Summarize articles, ask questions about them, and compare prompting strategies",
    long_about = "Runs summarization, Q&A and prompting experiments against Gemini or OpenRouter, \
                  falling back to the other provider when one fails"
)]
#[command(version)]
struct Args {
    /// Pin every request to one provider (gemini, openrouter)
    #[arg(short, long, global = true)]
    provider: Option<ProviderKind>,

    /// Enable debug mode for verbose output
    #[arg(short, long, default_value_t = false, global = true)]
    debug: bool,

    /// Write the markdown report to a file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Run(RunCommand),
    /// Check which providers are configured and reachable
    Check,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands that send prompts and produce a report
#[derive(Subcommand, Debug)]
enum RunCommand {
    /// Summarize an article (the built-in sample when no file is given)
    Summarize {
        file: Option<PathBuf>,
        /// Sampling temperature
        #[arg(short, long, default_value_t = 0.7)]
        temperature: f32,
        /// Personality style (pirate, comedian, sports_commentator, detective, scientist)
        #[arg(short, long)]
        style: Option<Style>,
    },
    /// Summarize at deterministic, balanced and creative temperatures
    Experiment { file: Option<PathBuf> },
    /// Answer questions about an article
    Ask {
        /// Questions to answer in order
        questions: Vec<String>,
        /// Article file (defaults to the built-in sample)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Read questions from stdin until 'quit'
        #[arg(short, long)]
        interactive: bool,
    },
    /// Suggest questions worth asking about an article
    Suggest {
        file: Option<PathBuf>,
        #[arg(short, long, default_value_t = 5)]
        count: usize,
    },
    /// Compare zero-shot, few-shot and chain-of-thought prompting
    Strategies {
        /// Run only the first task of each type
        #[arg(long)]
        sample: bool,
        /// Strategies to run (repeatable; all when omitted)
        #[arg(short, long = "strategy")]
        strategies: Vec<Strategy>,
        /// Task types to run (repeatable; all when omitted)
        #[arg(short = 'T', long = "task-type")]
        task_types: Vec<TaskType>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default provider
    SetDefault { provider: ProviderKind },
    /// Store an API key for a provider in the config file
    SetKey { provider: ProviderKind, key: String },
    /// Print the config file location
    Path,
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            let path = Config::config_path()?;
            println!("Config file: {}", path.display());
            println!();
            println!("{:#?}", config);
            println!();
            for provider in config.provider_configs() {
                let status = if provider.is_available() {
                    "available"
                } else {
                    "no key"
                };
                println!("  {} - {} ({})", provider.kind, provider.model, status);
            }
        }
        ConfigAction::SetDefault { provider } => {
            let mut config = Config::load()?;
            config.default_provider = Some(*provider);
            config.save()?;
            println!("Default provider set to: {}", provider);
        }
        ConfigAction::SetKey { provider, key } => {
            if key.trim().is_empty() {
                bail!("API key must not be empty");
            }
            let mut config = Config::load()?;
            config
                .providers
                .entry(provider.as_str().to_string())
                .or_insert_with(ProviderSettings::default)
                .api_key = Some(key.trim().to_string());
            config.save()?;
            println!("Stored API key for {}", provider);
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

fn load_article(file: Option<&Path>) -> Result<Article> {
    match file {
        Some(path) => Article::from_file(path),
        None => Ok(Article::sample()),
    }
}

/// Report provider availability and a live probe of each configured one
async fn check_providers(config: &Config) -> Result<()> {
    let client = match LlmClient::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            println!("{}", e);
            for kind in ProviderKind::ALL {
                println!("  {}: set {}", kind, kind.env_var());
            }
            return Ok(());
        }
    };

    let available = client.available_providers();
    for kind in ProviderKind::ALL {
        if !available.contains(&kind) {
            println!("  {}: not configured (set {})", kind, kind.env_var());
            continue;
        }
        let model = client.model_for(kind).unwrap_or("unknown");
        let status = if client.check_connection(kind).await {
            "ok"
        } else {
            "FAILED"
        };
        let default_marker = if kind == client.default_provider() {
            " (default)"
        } else {
            ""
        };
        println!("  {}: {} [{}]{}", kind, model, status, default_marker);
    }
    Ok(())
}

async fn run(
    command: RunCommand,
    config: &Config,
    provider: Option<ProviderKind>,
    output: Option<&Path>,
) -> Result<()> {
    let mut lab = Lab::connect(config, provider)?;
    let mut report;

    match command {
        RunCommand::Summarize {
            file,
            temperature,
            style,
        } => {
            let article = load_article(file.as_deref())?;
            report = Report::new("Article Summary");
            report.article(&article);
            let summary = match style {
                Some(style) => {
                    summarizer::summarize_with_style(&mut lab, &article, style, temperature).await
                }
                None => summarizer::summarize(&mut lab, &article, temperature).await,
            }
            .context("Summarization failed")?;
            report.summary(&summary);
        }
        RunCommand::Experiment { file } => {
            let article = load_article(file.as_deref())?;
            report = Report::new("Temperature Experiment");
            report.article(&article);
            let experiment = summarizer::experiment_with_temperatures(&mut lab, &article).await;
            report.experiment(&experiment);
        }
        RunCommand::Ask {
            questions,
            file,
            interactive,
        } => {
            let article = load_article(file.as_deref())?;
            report = Report::new("Article Q&A");
            report.article(&article);
            let turns = if interactive {
                let stdin = std::io::stdin();
                let mut stdout = std::io::stdout();
                qa::interactive_session(&mut lab, &article, stdin.lock(), &mut stdout).await?
            } else {
                if questions.is_empty() {
                    bail!("No questions given. Pass questions as arguments or use --interactive");
                }
                qa::ask_multiple(&mut lab, &article, &questions, qa::QA_TEMPERATURE).await
            };
            report.questions(&turns);
        }
        RunCommand::Suggest { file, count } => {
            if count == 0 {
                bail!("--count must be at least 1");
            }
            let article = load_article(file.as_deref())?;
            report = Report::new("Suggested Questions");
            report.article(&article);
            let suggestions = qa::suggest_questions(&mut lab, &article, count).await;
            report.suggestions(&suggestions);
        }
        RunCommand::Strategies {
            sample,
            strategies,
            task_types,
        } => {
            let strategies = if strategies.is_empty() {
                Strategy::ALL.to_vec()
            } else {
                strategies
            };
            let tasks = strategies::select_tasks(&task_types, sample.then_some(1));
            println!(
                "Running {} strategies over {} tasks...",
                strategies.len(),
                tasks.len()
            );
            report = Report::new("Prompting Strategy Comparison");
            let runs = strategies::run_comparison(&mut lab, &tasks, &strategies).await;
            report.strategies(&runs);
        }
    }

    report.usage(lab.ledger());
    report.emit(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        // Config subcommands run before any client is built
        Commands::Config { action } => handle_config_command(&action),
        Commands::Check => {
            let config = Config::load().context("Failed to load configuration")?;
            check_providers(&config).await
        }
        Commands::Run(command) => {
            let config = Config::load().context("Failed to load configuration")?;
            run(command, &config, args.provider, args.output.as_deref()).await
        }
    }
}

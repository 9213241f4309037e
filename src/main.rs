use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

mod session;
mod terminal;

use promptui_core::ai::gemini::recommend_free_model;
use promptui_core::templates::build_prompt;
use promptui_core::{
    ActionHandler, Config, Diagnostics, GeminiClient, OpenAIClient, PromptOutcome, Provider, Renderer,
};
use session::{api_key, Session, Submission};
use terminal::{find_action, TerminalRenderer};

#[derive(Parser)]
#[command(name = "promptui")]
#[command(about = "Turn plain-language prompts into UI descriptions")]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BackendArgs {
    /// Backend to interpret with: mocked, openai or gemini
    #[arg(short, long, global = true)]
    backend: Option<String>,
    /// Model name for the generative backend
    #[arg(short, long, global = true)]
    model: Option<String>,
    /// Prompt table to load instead of the bundled one
    #[arg(short = 'p', long = "prompts", global = true)]
    prompt_table: Option<PathBuf>,
    /// Seconds to wait for a generative answer
    #[arg(short, long, global = true)]
    timeout: Option<u64>,
    /// Print the current description as JSON after each prompt
    #[arg(long, global = true)]
    json: bool,
    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply prompts in order and show the resulting screen
    Apply {
        /// Prompts to apply
        #[arg(required = true)]
        prompts: Vec<String>,
    },
    /// Read prompts from stdin, one per line
    Repl,
    /// Print the instruction/user pair sent to a generative backend
    Template {
        prompt: String,
        /// Dialect to build for
        #[arg(long, default_value = "gemini")]
        provider: String,
    },
    /// List Gemini models and the recommended free-tier one
    Models,
    /// Check that the Gemini key and model answer
    TestConnection,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the saved configuration
    Show,
    /// Save the default backend
    SetBackend { backend: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let diagnostics = Diagnostics::with_stderr(if cli.backend.verbose { "debug" } else { "warn" })?;
    let _guard = diagnostics.enter();

    let config = resolve_config(&cli.backend)?;

    match cli.command {
        Commands::Apply { prompts } => {
            let mut session = Session::open(config, diagnostics.dispatch().clone()).await?;
            println!("{} {}", "Interpreter:".bold(), session.label().cyan());
            for prompt in &prompts {
                submit_and_show(&mut session, prompt, cli.backend.json).await?;
            }
            session.close().await?;
        }
        Commands::Repl => {
            let session = Session::open(config, diagnostics.dispatch().clone()).await?;
            repl(session, cli.backend.json).await?;
        }
        Commands::Template { prompt, provider } => {
            let provider = Provider::from_str(&provider)
                .ok_or_else(|| anyhow!("Unknown provider '{}'. Expected openai or gemini", provider))?;
            show_template(provider, &prompt);
        }
        Commands::Models => list_models(&config).await?,
        Commands::TestConnection => test_connection(&config).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", Config::get_config_path()?.display().to_string().dimmed());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            ConfigAction::SetBackend { backend } => {
                Config::save_backend(&backend)?;
                println!("{} {}", "Backend saved:".green(), backend.trim().to_lowercase());
            }
        },
    }

    Ok(())
}

fn resolve_config(args: &BackendArgs) -> Result<Config> {
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("could not read config ({}), using defaults", e);
        Config::new()
    });

    if let Some(backend) = &args.backend {
        config.set_backend(backend)?;
    }
    if let Some(model) = &args.model {
        config.model = Some(model.clone());
    }
    if let Some(path) = &args.prompt_table {
        config.prompts_path = Some(path.clone());
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    Ok(config)
}

async fn submit_and_show(session: &mut Session, prompt: &str, json: bool) -> Result<()> {
    println!("\n{} {}", ">".bold().blue(), prompt.bold());

    match session.submit(prompt).await? {
        Submission::TimedOut => {
            println!("{}", "No answer in time; nothing changed.".yellow());
            return Ok(());
        }
        Submission::Applied(PromptOutcome::Ignored) => return Ok(()),
        Submission::Applied(PromptOutcome::Reset) => println!("{}", "Screen reset.".green()),
        Submission::Applied(_) => {}
    }

    show(session, json)
}

fn show(session: &Session, json: bool) -> Result<()> {
    let current = session.current();
    let mut renderer = TerminalRenderer::new(std::io::stdout());
    renderer.render_ui(&current, &|action: &str| run_action(action));
    renderer.render_screen(session.screen())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*current)?);
    }
    Ok(())
}

fn run_action(action: &str) {
    tracing::info!("action='{}' triggered", action);
    println!("{} {}", "Action:".bold().magenta(), action);
}

async fn repl(mut session: Session, json: bool) -> Result<()> {
    println!("{} {}", "Interpreter:".bold(), session.label().cyan());
    println!(
        "{}",
        "Type a prompt, or :reset, :state, :press <button>, :quit".dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":reset" => {
                session.reset();
                println!("{}", "Screen reset.".green());
                show(&session, json)?;
            }
            ":state" => show(&session, json)?,
            _ => {
                if let Some(label) = line.strip_prefix(":press") {
                    let handler = |action: &str| run_action(action);
                    match press(&session, label) {
                        Some(action) => handler.handle(&action),
                        None => println!("{} '{}'", "No button with an action named".red(), label.trim()),
                    }
                } else if line.starts_with(':') {
                    println!("{} {}", "Unknown command".red(), line);
                } else {
                    submit_and_show(&mut session, line, json).await?;
                }
            }
        }
    }

    session.close().await
}

// The screen keeps the last button applied; fall back to the current description.
fn press(session: &Session, label: &str) -> Option<String> {
    session
        .screen()
        .extra_button
        .as_ref()
        .filter(|button| button.text.eq_ignore_ascii_case(label.trim()))
        .and_then(|button| button.action.clone())
        .or_else(|| find_action(&session.current(), label))
}

fn show_template(provider: Provider, prompt: &str) {
    let (system_or_instruction, user) = build_prompt(provider, prompt);
    let first = match provider {
        Provider::OpenAI => "system",
        Provider::Gemini => "instruction",
    };
    println!("{}", format!("[{}] {}", provider.display_name(), first).bold().blue());
    println!("{}\n", system_or_instruction);
    println!("{}", "user".bold().blue());
    println!("{}", user);
}

async fn list_models(config: &Config) -> Result<()> {
    if config.provider() == Some(Provider::OpenAI) {
        println!("\n{}", "OpenAI models".bold().blue());
        for model in OpenAIClient::list_models() {
            println!("  • {}", model.green());
        }
        return Ok(());
    }

    let key = api_key(Provider::Gemini)
        .ok_or_else(|| anyhow!("{} is not set", Provider::Gemini.api_key_var()))?;
    let timeout = config.timeout();

    let models = tokio::task::spawn_blocking(move || {
        GeminiClient::new(&key, Provider::Gemini.default_model(), timeout)?.list_models()
    })
    .await??;

    println!("\n{}", "Gemini models".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    if models.is_empty() {
        println!("{}", "No models visible to this key.".yellow());
        return Ok(());
    }
    for model in &models {
        println!("  • {}", model.green());
    }
    println!("\n{} {}", "Recommended:".bold(), recommend_free_model(&models).cyan());
    Ok(())
}

async fn test_connection(config: &Config) -> Result<()> {
    let key = api_key(Provider::Gemini)
        .ok_or_else(|| anyhow!("{} is not set", Provider::Gemini.api_key_var()))?;
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| Provider::Gemini.default_model().to_string());
    let timeout = config.timeout();

    println!("Testing {} with {}...", "Gemini".bold(), model.cyan());
    let result = tokio::task::spawn_blocking(move || {
        GeminiClient::new(&key, &model, timeout)?.test_connection()
    })
    .await?;

    match result {
        Ok(()) => println!("{}", "Connection OK.".green()),
        Err(e) => println!("{}: {}", "Connection failed".red(), e),
    }
    Ok(())
}

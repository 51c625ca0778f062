use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use joblink_application::{AssistantController, AssistantRuntime, StageOutcome, SubmitOutcome};
use joblink_core::assistant::{AssistantEvent, InteractionMode};
use joblink_core::user::{User, UserType};
use joblink_infrastructure::{JobLinkPaths, load_source_image};

mod command;
mod helper;
mod render;

use command::{ReplCommand, help_text, parse};
use helper::CliHelper;
use render::{Renderer, print_state};

#[derive(Parser)]
#[command(name = "joblink")]
#[command(about = "JobLink AI assistant - chat, generate and edit images from the terminal", long_about = None)]
struct Cli {
    /// Role to sign in as
    #[arg(long, default_value = "student")]
    role: UserType,

    /// Display name (defaults to the demo user for the role)
    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory produced images are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn user(&self) -> User {
        let demo = User::demo(self.role);
        User::new(
            self.name.clone().unwrap_or(demo.name),
            self.email.clone().unwrap_or(demo.email),
            self.role,
        )
    }
}

/// Logs go to stderr so they never interleave with the transcript on stdout.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Prints every event already queued.
fn drain(events: &mut UnboundedReceiver<AssistantEvent>, renderer: &mut Renderer) {
    while let Ok(event) = events.try_recv() {
        renderer.handle(event);
    }
}

/// Runs a submission while rendering its events as they stream in.
async fn submit(
    controller: &AssistantController,
    events: &mut UnboundedReceiver<AssistantEvent>,
    renderer: &mut Renderer,
) -> SubmitOutcome {
    let submission = controller.submit();
    tokio::pin!(submission);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submission => break outcome,
            Some(event) = events.recv() => renderer.handle(event),
        }
    };
    drain(events, renderer);
    outcome
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = JobLinkPaths::default();

    let config = AssistantRuntime::load_config(&paths, cli.config.clone())?;
    init_tracing(&config.logging.level);

    let output_dir = match cli.output_dir.clone() {
        Some(dir) => dir,
        None => paths
            .images_dir()
            .context("Could not determine the image output directory")?,
    };

    let runtime = AssistantRuntime::load(&paths, config).await?;
    let (event_tx, mut events) = mpsc::unbounded_channel();
    let controller = runtime.controller(event_tx);
    let mut renderer = Renderer::new(output_dir);

    // ===== REPL Setup =====
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== JobLink AI Assistant ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/help' for commands, or 'quit' to exit.".bright_black()
    );
    if !runtime.api_key_configured() {
        println!(
            "{}",
            "No Gemini API key found (set GEMINI_API_KEY); requests will fail.".yellow()
        );
    }
    println!();

    if let Err(err) = controller.start_session(cli.user()).await {
        tracing::warn!(error = %err, "Continuing without a chat session");
    }
    drain(&mut events, &mut renderer);

    // ===== Main REPL Loop =====
    loop {
        let mode = controller.snapshot().await.mode;
        let readline = rl.readline(&format!("{mode}> "));

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        let command = parse(&line);
        if !matches!(command, ReplCommand::Empty) {
            let _ = rl.add_history_entry(line.as_str());
        }

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => {
                println!("{}", "Goodbye!".bright_green());
                break;
            }
            ReplCommand::Help => println!("{}", help_text().bright_black()),
            ReplCommand::State => print_state(&controller.snapshot().await),
            ReplCommand::Mode(mode) => {
                controller.set_mode(mode).await;
            }
            ReplCommand::Load(path) => match load_source_image(&path).await {
                Ok(image) => {
                    let name = image.name.clone();
                    let media_type = image.media_type.clone();
                    match controller.stage_source_image(image).await {
                        StageOutcome::Staged => println!(
                            "{}",
                            format!("Staged {name} ({media_type})").bright_green()
                        ),
                        StageOutcome::Ignored => println!(
                            "{}",
                            "Switch to /edit before loading an image.".yellow()
                        ),
                        StageOutcome::Rejected(_) => {}
                    }
                }
                Err(err) => eprintln!("{}", format!("Error: {err}").red()),
            },
            ReplCommand::Unload => {
                if controller.unstage_source_image().await {
                    println!("{}", "Source image removed.".bright_black());
                }
            }
            ReplCommand::User(role) => {
                let user = User::demo(role);
                println!("{}", format!("Signing in as {}...", user.name).bright_black());
                if let Err(err) = controller.start_session(user).await {
                    tracing::warn!(error = %err, "Continuing without a chat session");
                }
            }
            ReplCommand::Prompt(prompt) => {
                controller.set_prompt(prompt).await;
                let state = controller.snapshot().await;
                if state.mode == InteractionMode::ImageEdit && state.source_image.is_none() {
                    println!(
                        "{}",
                        "Load an image first with /load <path>.".yellow()
                    );
                    continue;
                }
                if let SubmitOutcome::Ignored =
                    submit(&controller, &mut events, &mut renderer).await
                {
                    println!("{}", "Nothing to send.".bright_black());
                }
            }
            ReplCommand::Usage(usage) => println!("{}", format!("Usage: {usage}").yellow()),
            ReplCommand::Unknown(cmd) => {
                println!("{}", format!("Unknown command {cmd}. Try /help.").bright_black())
            }
        }

        drain(&mut events, &mut renderer);
    }

    if controller.end_session().await {
        tracing::debug!(images = %renderer.output_dir().display(), "Session closed");
    }
    Ok(())
}

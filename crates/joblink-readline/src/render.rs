//! Terminal rendering of assistant events and state.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use joblink_application::AssistantState;
use joblink_core::assistant::{AssistantEvent, ImageReference, InteractionMode, MessageSender};

/// Writes a produced image into `dir` and returns its path.
pub fn save_image(dir: &Path, image: &ImageReference) -> Result<PathBuf> {
    let bytes = image.decode()?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let path = dir.join(format!("joblink-{stamp}.{}", image.extension()));
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Prints events as they arrive. Chat fragments are written without
/// newlines so the reply grows in place.
pub struct Renderer {
    output_dir: PathBuf,
    mode: InteractionMode,
}

impl Renderer {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            mode: InteractionMode::default(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn handle(&mut self, event: AssistantEvent) {
        match event {
            AssistantEvent::ModeChanged { mode } => {
                self.mode = mode;
                println!("{}", format!("Mode: {}", mode.label()).bright_magenta());
                println!("{}", mode.placeholder().bright_black());
            }
            AssistantEvent::BusyChanged {
                awaiting_response: true,
            } => match self.mode {
                InteractionMode::Chat => {}
                InteractionMode::ImageGenerate => {
                    println!("{}", "Generating image...".bright_black())
                }
                InteractionMode::ImageEdit => println!("{}", "Editing image...".bright_black()),
            },
            AssistantEvent::BusyChanged { .. } | AssistantEvent::UserMessage { .. } => {}
            AssistantEvent::StreamStarted { .. } => {
                print!("{} ", "AI:".bright_blue().bold());
                flush();
            }
            AssistantEvent::StreamChunk { fragment, .. } => {
                print!("{}", fragment.bright_blue());
                flush();
            }
            AssistantEvent::StreamFinished { .. } => println!(),
            AssistantEvent::AssistantMessage { text, .. } => {
                println!("{} {}", "AI:".bright_blue().bold(), text.bright_blue());
            }
            AssistantEvent::ImageProduced { image, explanation } => {
                match save_image(&self.output_dir, &image) {
                    Ok(path) => println!(
                        "{}",
                        format!("Image saved to {}", path.display()).bright_green()
                    ),
                    Err(err) => eprintln!("{}", format!("Could not save image: {err:#}").red()),
                }
                if let Some(text) = explanation {
                    for line in text.lines() {
                        println!("{}", line.bright_blue());
                    }
                }
            }
            AssistantEvent::Failed { error } => {
                eprintln!("{}", format!("Error: {error}").red());
            }
        }
    }
}

fn flush() {
    let _ = std::io::stdout().flush();
}

pub fn print_state(state: &AssistantState) {
    let user = state
        .user
        .as_ref()
        .map(|u| format!("{} <{}> ({})", u.name, u.email, u.user_type))
        .unwrap_or_else(|| "signed out".to_string());

    println!("{}", "=== Assistant state ===".bright_magenta().bold());
    println!("user:        {user}");
    println!(
        "session:     {}",
        state.session_id.as_deref().unwrap_or("none")
    );
    println!("mode:        {}", state.mode.label());
    println!("busy:        {}", state.awaiting_response);
    println!("input:       {}", if state.input_enabled() { "enabled" } else { "disabled" });
    if let Some(source) = &state.source_image {
        println!("source:      {} ({}, {} bytes)", source.name, source.media_type, source.len());
    }
    if let Some(image) = &state.produced_image {
        println!("image:       {}", image.media_type());
    }
    if let Some(text) = &state.edit_explanation {
        println!("explanation: {text}");
    }
    if let Some(error) = &state.error {
        println!("{}", format!("error:       {error}").red());
    }

    let users = state
        .transcript
        .iter()
        .filter(|m| m.sender == MessageSender::User)
        .count();
    println!(
        "transcript:  {} entries ({} from you)",
        state.transcript.len(),
        users
    );
}

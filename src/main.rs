//! llmproc - a runtime for LLM-backed processes.
//!
//! Thin binary entry point: parse arguments, compile the program, run it
//! against whichever prompt source wins (spec §6 "CLI surface").

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use llmproc_core::process::{Process, ProcessEvent};
use llmproc_core::program::Program;

/// A runtime for LLM-backed processes: tool calling, file-descriptor
/// pagination, fork/spawn/goto, and a linked-program graph.
#[derive(Debug, Parser)]
#[command(name = "llmproc", version, about)]
struct Cli {
    /// Path to a program source file (TOML).
    program: PathBuf,

    /// Run once, non-interactively, with this prompt.
    #[arg(short = 'p', long = "prompt")]
    prompt: Option<String>,

    /// Run once, non-interactively, reading the prompt from stdin.
    #[arg(short = 'n', long = "non-interactive")]
    non_interactive: bool,

    /// Suppress tool-call and turn progress output.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let program = Program::from_toml_file(&cli.program)
        .with_context(|| format!("failed to compile program '{}'", cli.program.display()))?;
    let mut process = program.start().await.context("failed to start process")?;
    process.on_event(progress_logger(cli.quiet));

    // Prompt-source priority (spec §6): CLI prompt -> stdin -> demo prompts
    // -> the program's own embedded default prompt -> interactive chat.
    if let Some(prompt) = cli.prompt {
        return run_once(&mut process, prompt).await;
    }

    if cli.non_interactive {
        let mut input = String::new();
        io::stdin().read_line(&mut input).context("failed to read prompt from stdin")?;
        return run_once(&mut process, input.trim().to_string()).await;
    }

    if !process.program.demo.prompts.is_empty() {
        return run_demo(&mut process).await;
    }

    if let Some(prompt) = process.program.default_prompt.clone() {
        return run_once(&mut process, prompt).await;
    }

    run_interactive(&mut process).await
}

async fn run_once(process: &mut Process, prompt: String) -> Result<()> {
    let outcome = process.run(prompt, None).await.context("run failed")?;
    println!("{}", outcome.text());
    Ok(())
}

async fn run_demo(process: &mut Process) -> Result<()> {
    let prompts = process.program.demo.prompts.clone();
    let pause = process.program.demo.pause_between_prompts;
    for (i, prompt) in prompts.iter().enumerate() {
        println!("> {prompt}");
        let outcome = process.run(prompt.clone(), None).await.context("run failed")?;
        println!("{}", outcome.text());

        if pause && i + 1 < prompts.len() {
            print!("\n(press enter to continue) ");
            io::stdout().flush().ok();
            let mut discard = String::new();
            io::stdin().read_line(&mut discard).ok();
        }
    }
    Ok(())
}

async fn run_interactive(process: &mut Process) -> Result<()> {
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let outcome = process.run(line.to_string(), None).await.context("run failed")?;
        println!("{}", outcome.text());
    }
    Ok(())
}

/// Renders tool-call and turn progress to stderr so stdout stays reserved
/// for the assistant's actual text. Suppressed entirely under `--quiet`.
fn progress_logger(quiet: bool) -> Arc<dyn Fn(&ProcessEvent) + Send + Sync> {
    Arc::new(move |event: &ProcessEvent| {
        if quiet {
            return;
        }
        match event {
            ProcessEvent::TurnStart { turn } => eprintln!("--- turn {turn} ---"),
            ProcessEvent::ToolStart { name, args } => eprintln!("-> {name}({args})"),
            ProcessEvent::ToolEnd { name, result } if result.is_error => {
                eprintln!("<- {name} error: {}", result.content)
            }
            ProcessEvent::ToolEnd { name, .. } => eprintln!("<- {name} ok"),
            _ => {}
        }
    })
}

mod console;
mod ledger;
mod media;
mod scan;
mod select;
mod workflow;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use ledger::{Ledger, LedgerStore, LoadOutcome};
use workflow::{Flow, Workflow};

/// All workflow parameters are gathered interactively; clap only supplies
/// `--help` and `--version`.
#[derive(Parser)]
#[command(
    name = "clipshelf",
    version,
    about = "Track a directory of video clips through an unused/in-progress/used ledger"
)]
struct Cli {}

fn main() -> Result<()> {
    let _cli = Cli::parse();

    // Every mutation is persisted before control returns to a prompt, so an
    // interrupt at any point leaves the ledger at its last saved state.
    ctrlc::set_handler(|| {
        println!("\nExit signal received.");
        std::process::exit(130);
    })
    .context("failed to install Ctrl-C handler")?;

    let source_dir = PathBuf::from(console::prompt(
        "Enter the directory to scan for video files: ",
    )?);
    if !source_dir.is_dir() {
        bail!(
            "source directory {} does not exist or is inaccessible",
            source_dir.display()
        );
    }

    let working_input = console::prompt("Enter a working directory for copies (blank to skip): ")?;
    let working_dir = if working_input.is_empty() {
        None
    } else {
        Some(PathBuf::from(working_input))
    };
    if let Some(dir) = &working_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create working directory {}", dir.display()))?;
    }

    let ledger_path = PathBuf::from(console::prompt("Enter the ledger file path: ")?);

    println!("Video directory: {}", source_dir.display());
    if let Some(dir) = &working_dir {
        println!("Working directory: {}", dir.display());
    }
    println!("Ledger path: {}", ledger_path.display());
    console::pause("Are these settings correct?")?;

    let store = LedgerStore::new(&ledger_path);
    let outcome = store.load_or_create(&source_dir)?;
    report_load(&store, &outcome);
    let mut ledger = outcome.ledger;

    let flow = Workflow {
        store: &store,
        source_dir: &source_dir,
        working_dir: working_dir.as_deref(),
        target: workflow::DEFAULT_TARGET,
    };

    let carried_over = !ledger.inprogress.is_empty();
    if carried_over && flow.manage_inprogress(&mut ledger)? == Flow::Exit {
        return Ok(());
    }

    prompt_prefix(&store, &mut ledger)?;
    flow.top_up(&mut ledger, carried_over)?;

    println!("Done. {} file(s) in progress.", ledger.inprogress.len());
    Ok(())
}

fn report_load(store: &LedgerStore, outcome: &LoadOutcome) {
    if outcome.created {
        println!(
            "Created {} with {} video(s) in 'unused'.",
            store.path().display(),
            outcome.ledger.unused.len()
        );
        return;
    }
    if outcome.migrated {
        println!("Added the 'b-roll' category to {}.", store.path().display());
    }
    if outcome.added > 0 {
        println!(
            "Updated {} with {} new video(s) in 'unused'.",
            store.path().display(),
            outcome.added
        );
    } else {
        println!("No new videos to add.");
    }
}

fn prompt_prefix(store: &LedgerStore, ledger: &mut Ledger) -> Result<()> {
    let current = ledger.last_prefix.clone().unwrap_or_default();
    let message = if current.is_empty() {
        "Enter a filename prefix for random selection (blank for all): ".to_string()
    } else {
        format!("Enter a filename prefix for random selection (Enter keeps '{current}'): ")
    };

    let input = console::prompt(&message)?;
    if !input.is_empty() && input != current {
        ledger.last_prefix = Some(input);
        store.save(ledger)?;
    }
    Ok(())
}

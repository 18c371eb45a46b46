use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Print `message` without a newline and read one trimmed line from stdin.
///
/// EOF means the user closed our input; treat it like an exit request so the
/// program never spins on an unreadable prompt.
pub fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        println!("\nExit signal received.");
        std::process::exit(0);
    }
    Ok(line.trim().to_string())
}

/// Yes/no question; re-prompts until the answer is recognizable.
pub fn confirm(message: &str) -> Result<bool> {
    loop {
        let input = prompt(&format!("{message} [y/n]: "))?;
        match input.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer 'y' or 'n'."),
        }
    }
}

/// Pause until the user presses Enter (Ctrl-C aborts the run).
pub fn pause(message: &str) -> Result<()> {
    if !message.is_empty() {
        println!("{message}");
    }
    prompt("Press Enter to continue...")?;
    Ok(())
}

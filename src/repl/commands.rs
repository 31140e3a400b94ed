//! Built-in chat commands

/// Parsed chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    /// Anything that is not a command is a question for the pipeline
    Ask(String),
    Empty,
    Unknown(String),
}

/// Check if input looks like a command
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}

/// Parse one line of chat input
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    if !is_command(trimmed) {
        return Command::Ask(trimmed.to_string());
    }

    let name = trimmed[1..]
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match name.as_str() {
        "help" | "h" => Command::Help,
        "exit" | "quit" | "q" => Command::Exit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

//! Line-oriented commands from stdin. This is the interaction surface:
//! detail lookup, stage advancement, search, manual refresh.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    View(String),
    Advance(String),
    Search(String),
    Refresh,
    Quit,
}

/// Parse one input line. `None` means blank or unrecognized input; the
/// caller reports it and keeps going.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.trim().splitn(2, char::is_whitespace);
    let verb = parts.next()?.to_ascii_lowercase();
    let rest = parts.next().map(str::trim).unwrap_or("");

    match verb.as_str() {
        "view" if !rest.is_empty() => Some(Command::View(rest.to_string())),
        "advance" if !rest.is_empty() => Some(Command::Advance(rest.to_string())),
        "search" if !rest.is_empty() => Some(Command::Search(rest.to_string())),
        "refresh" | "r" => Some(Command::Refresh),
        "quit" | "q" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

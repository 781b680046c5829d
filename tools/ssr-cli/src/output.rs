//! Terminal and JSON output for the CLI.

use std::fmt::Display;

use console::{style, StyledObject};

/// Where a line goes.
#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Prints human-readable lines, or nothing but JSON documents in `--json` mode.
#[derive(Debug, Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    /// Create a printer.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    fn line(&self, stream: Stream, marker: StyledObject<&str>, msg: impl Display) {
        if self.json {
            return;
        }
        match stream {
            Stream::Stdout => println!("{} {}", marker, msg),
            Stream::Stderr => eprintln!("{} {}", marker, msg),
        }
    }

    /// Neutral status line.
    pub fn info(&self, msg: &str) {
        self.line(Stream::Stdout, style("ℹ").blue(), msg);
    }

    /// Completed step.
    pub fn success(&self, msg: &str) {
        self.line(Stream::Stdout, style("✓").green(), msg);
    }

    /// Non-fatal problem, on stderr.
    pub fn warn(&self, msg: &str) {
        self.line(Stream::Stderr, style("⚠").yellow(), msg);
    }

    /// Fatal problem. In JSON mode this is an `{"error": ...}` document on stderr.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            self.line(Stream::Stderr, style("✗").red(), style(msg).red());
        }
    }

    /// Diagnostic line, shown with `--verbose` only.
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            self.line(Stream::Stderr, style("→").dim(), style(msg).dim());
        }
    }

    /// Section heading.
    pub fn header(&self, msg: &str) {
        if !self.json {
            println!("\n{}", style(msg).bold().underlined());
        }
    }

    /// Pretty-printed JSON document on stdout.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(doc) => println!("{}", doc),
            Err(e) => eprintln!("failed to encode output: {}", e),
        }
    }

    /// Indented `key: value` line.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    /// One row of a tree, indented by depth, with optional bracketed tags.
    pub fn tree_item(&self, depth: usize, item: &str, tags: &[&str]) {
        if self.json {
            return;
        }
        println!("{}", tree_line(depth, item, tags));
    }

    /// Whether `--verbose` was given.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether `--json` was given.
    pub fn is_json(&self) -> bool {
        self.json
    }
}

fn tree_line(depth: usize, item: &str, tags: &[&str]) -> String {
    let branch = if depth == 0 { "•" } else { "└─" };
    let mut line = format!("  {}{} {}", "  ".repeat(depth), style(branch).dim(), item);
    if !tags.is_empty() {
        line.push(' ');
        line.push_str(&style(format!("[{}]", tags.join(", "))).cyan().to_string());
    }
    line
}

/// Colored label for a render outcome.
pub fn outcome_badge(outcome: &str) -> String {
    let styled = style(outcome);
    match outcome {
        "rendered" => styled.green().to_string(),
        "client_only" => styled.yellow().to_string(),
        "auth_required" | "not_found" => styled.red().to_string(),
        _ => outcome.to_string(),
    }
}

/// Document size in B, KB or MB.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let size = bytes as f64;
    if size >= MB {
        format!("{:.2} MB", size / MB)
    } else if size >= KB {
        format!("{:.2} KB", size / KB)
    } else {
        format!("{} B", bytes)
    }
}

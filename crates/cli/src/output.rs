//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status lines,
//! the diagnostics tree of a build, and human-readable sizes.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use studio_build_lib::output::{Message, MessageKind};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const GROUP: &str = "▸";
}

pub fn format_bytes(bytes: u64) -> String {
  const KB: u64 = 1024;
  const MB: u64 = KB * 1024;
  const GB: u64 = MB * 1024;

  if bytes >= GB {
    format!("{:.1} GB", bytes as f64 / GB as f64)
  } else if bytes >= MB {
    format!("{:.1} MB", bytes as f64 / MB as f64)
  } else if bytes >= KB {
    format!("{:.1} KB", bytes as f64 / KB as f64)
  } else {
    format!("{} B", bytes)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// One diagnostics line without color: `<indent><symbol> <text>[ (<node>)]`.
pub fn message_line(message: &Message, depth: usize) -> String {
  let symbol = match message.kind {
    MessageKind::Info => symbols::INFO,
    MessageKind::Warning => symbols::WARNING,
    MessageKind::Error => symbols::ERROR,
    MessageKind::Group => symbols::GROUP,
  };
  let indent = "  ".repeat(depth);
  match &message.node {
    Some(node) if message.kind != MessageKind::Group => format!("{indent}{symbol} {} ({node})", message.text),
    _ => format!("{indent}{symbol} {}", message.text),
  }
}

/// Print a diagnostics tree: errors and warnings to stderr, the rest to stdout.
pub fn print_messages(messages: &[Message]) {
  print_level(messages, 0);
}

fn print_level(messages: &[Message], depth: usize) {
  for message in messages {
    let line = message_line(message, depth);
    match message.kind {
      MessageKind::Error => eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.red())),
      MessageKind::Warning => eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.yellow())),
      MessageKind::Group => println!("{}", line.if_supports_color(Stream::Stdout, |s| s.bold())),
      MessageKind::Info => println!("{}", line),
    }
    print_level(&message.children, depth + 1);
  }
}

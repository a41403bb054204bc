//! SCPI command table.

use super::{BuildCtx, SubBuilder};
use crate::build::BuildError;
use crate::build::parts::BuildResult;
use crate::consts::parts::{SCPI_COMMANDS, SCPI_COMMANDS_DECL};
use crate::project::{Project, ScpiFeature};
use crate::util::naming::TAB;

pub struct ScpiBuilder;

/// Full command name, `SUBsystem:COMMand`. Common commands (`*IDN?`) and
/// commands that already carry their subsystem are left alone.
pub fn full_command_name(subsystem: &str, command: &str) -> String {
  let already_qualified = command
    .get(..subsystem.len() + 1)
    .is_some_and(|head| head.eq_ignore_ascii_case(&format!("{subsystem}:")));

  if subsystem.is_empty() || command.starts_with('*') || already_qualified {
    command.to_string()
  } else {
    format!("{subsystem}:{command}")
  }
}

/// C handler name for a command: `MEASure:VOLTage?` -> `scpi_cmd_measureVoltageQ`,
/// `*IDN?` -> `scpi_cmd_coreIdnQ`.
pub fn command_handler_name(command: &str) -> String {
  let mut words: Vec<String> = Vec::new();
  for part in command.split(':') {
    let (core, rest) = match part.strip_prefix('*') {
      Some(rest) => (true, rest),
      None => (false, part),
    };
    if core {
      words.push("core".to_string());
    }
    let word: String = rest
      .chars()
      .filter_map(|c| match c {
        '?' => Some('Q'),
        c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
        _ => None,
      })
      .collect();
    if !word.is_empty() {
      words.push(word);
    }
  }

  let mut name = String::from("scpi_cmd_");
  for (index, word) in words.iter().enumerate() {
    if index == 0 {
      name.push_str(word);
    } else {
      let mut chars = word.chars();
      if let Some(first) = chars.next() {
        name.extend(first.to_uppercase());
        name.push_str(chars.as_str());
      }
    }
  }
  name
}

fn commands(feature: &ScpiFeature) -> Vec<(String, String)> {
  feature
    .subsystems
    .iter()
    .flat_map(|subsystem| {
      subsystem.commands.iter().map(move |command| {
        let full = full_command_name(&subsystem.name, &command.name);
        let handler = command_handler_name(&full);
        (full, handler)
      })
    })
    .collect()
}

impl SubBuilder for ScpiBuilder {
  fn name(&self) -> &'static str {
    "scpi"
  }

  fn applies(&self, project: &Project) -> bool {
    project.scpi.is_some()
  }

  fn build(&self, project: &Project, ctx: &BuildCtx<'_>) -> Result<BuildResult, BuildError> {
    let mut result = BuildResult::new();
    let Some(feature) = &project.scpi else {
      return Ok(result);
    };
    let commands = commands(feature);

    if ctx.wants(SCPI_COMMANDS_DECL) {
      let decl: Vec<String> = commands
        .iter()
        .map(|(_, handler)| format!("SCPI_COMMAND_DECL({handler})"))
        .collect();
      result.insert(SCPI_COMMANDS_DECL.to_string(), decl.join("\n").into());
    }

    if ctx.wants(SCPI_COMMANDS) {
      let mut table = String::from("#define SCPI_COMMANDS");
      for (full, handler) in &commands {
        table.push_str(&format!(" \\\n{TAB}SCPI_COMMAND(\"{full}\", {handler})"));
      }
      result.insert(SCPI_COMMANDS.to_string(), table.into());
    }

    Ok(result)
  }
}

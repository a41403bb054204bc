//! Identifier naming helpers for generated source.
//!
//! Project object names are free text ("Main page", "okButton"); generated C
//! and Python code needs identifiers such as `PAGE_ID_MAIN_PAGE` or
//! `ok_button`.

/// Indentation used by generated C sections.
pub const TAB: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
  UnderscoreUpperCase,
  UnderscoreLowerCase,
}

/// Build an identifier from `name` using `convention`, prefixed with `prefix`.
///
/// ```
/// use studio_build_lib::util::naming::{NamingConvention, get_name};
///
/// assert_eq!(get_name("PAGE_ID_", "Main page", NamingConvention::UnderscoreUpperCase), "PAGE_ID_MAIN_PAGE");
/// assert_eq!(get_name("", "okButton", NamingConvention::UnderscoreLowerCase), "ok_button");
/// ```
pub fn get_name(prefix: &str, name: &str, convention: NamingConvention) -> String {
  let cleaned: String = name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { ' ' })
    .collect();

  let underscored = underscore(&cleaned);
  let converted = match convention {
    NamingConvention::UnderscoreUpperCase => underscored.to_uppercase(),
    NamingConvention::UnderscoreLowerCase => underscored.to_lowercase(),
  };

  format!("{prefix}{converted}")
}

/// Split camelCase words and collapse whitespace/dash runs into single underscores.
fn underscore(input: &str) -> String {
  let mut out = String::with_capacity(input.len() + 8);
  let mut prev: Option<char> = None;
  let mut in_separator = false;

  for c in input.trim().chars() {
    if c.is_whitespace() || c == '-' {
      if !in_separator {
        out.push('_');
        in_separator = true;
      }
      prev = Some(c);
      continue;
    }
    in_separator = false;

    if let Some(p) = prev {
      if (p.is_ascii_lowercase() || p.is_ascii_digit()) && c.is_ascii_uppercase() {
        out.push('_');
      }
    }
    out.push(c);
    prev = Some(c);
  }

  out.to_lowercase()
}

/// Render bytes as a C initializer body: `0x..` values, 16 per line.
pub fn dump_data(data: &[u8]) -> String {
  const NUMBERS_PER_LINE: usize = 16;

  let mut result = String::with_capacity(data.len() * 6 + 8);
  for (index, value) in data.iter().enumerate() {
    if !result.is_empty() {
      result.push(',');
    }
    if index % NUMBERS_PER_LINE == 0 {
      result.push('\n');
      result.push_str(TAB);
    } else {
      result.push(' ');
    }
    result.push_str(&format!("0x{value:02x}"));
  }
  result.push('\n');
  result
}

/// Convert camelCase to snake_case, as used for variable accessor names.
pub fn to_snake_case(input: &str) -> String {
  let mut out = String::with_capacity(input.len() + 4);
  for c in input.chars() {
    if c.is_ascii_uppercase() {
      out.push('_');
      out.push(c.to_ascii_lowercase());
    } else {
      out.push(c);
    }
  }
  match out.strip_prefix('_') {
    Some(rest) => rest.to_string(),
    None => out,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn upper_case_page_identifier() {
    assert_eq!(
      get_name("PAGE_ID_", "Main page", NamingConvention::UnderscoreUpperCase),
      "PAGE_ID_MAIN_PAGE"
    );
  }

  #[test]
  fn camel_case_is_split() {
    assert_eq!(
      get_name("", "okButton", NamingConvention::UnderscoreLowerCase),
      "ok_button"
    );
    assert_eq!(
      get_name("STYLE_ID_", "defaultHTTPStyle", NamingConvention::UnderscoreUpperCase),
      "STYLE_ID_DEFAULT_HTTPSTYLE"
    );
  }

  #[test]
  fn punctuation_becomes_separator() {
    assert_eq!(
      get_name("", "volts/amps - ch1", NamingConvention::UnderscoreLowerCase),
      "volts_amps_ch1"
    );
  }

  #[test]
  fn dump_data_wraps_every_sixteen_bytes() {
    let data: Vec<u8> = (0u8..18).collect();
    let dumped = dump_data(&data);
    let lines: Vec<&str> = dumped.lines().collect();
    assert_eq!(lines[0], "");
    assert!(lines[1].starts_with("    0x00, 0x01"));
    assert!(lines[1].ends_with("0x0f,"));
    assert_eq!(lines[2], "    0x10, 0x11");
  }

  #[test]
  fn dump_data_empty() {
    assert_eq!(dump_data(&[]), "\n");
  }

  #[test]
  fn snake_case_from_camel() {
    assert_eq!(to_snake_case("counterValue"), "counter_value");
    assert_eq!(to_snake_case("Speed"), "speed");
    assert_eq!(to_snake_case("x"), "x");
  }
}

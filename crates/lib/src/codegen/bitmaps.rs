use std::collections::{BTreeMap, HashSet};

use crate::util::naming::{NamingConvention, get_name};

/// Resolves a bitmap reference to the variable holding its image.
pub trait BitmapRegistry {
  fn bitmap_variable(&self, bitmap: &str) -> Option<String>;
}

/// `img_*` variable names for every project bitmap.
///
/// Names use `UnderscoreLowerCase`; clashes get a numeric suffix in
/// declaration order (`logo`, `logo1`, ...).
#[derive(Debug, Clone, Default)]
pub struct BitmapNames {
  names: BTreeMap<String, String>,
  order: Vec<String>,
}

impl BitmapNames {
  pub fn new<'a>(bitmaps: impl IntoIterator<Item = &'a str>) -> Self {
    let mut taken = HashSet::new();
    let mut result = Self::default();

    for bitmap in bitmaps {
      if result.names.contains_key(bitmap) {
        continue;
      }
      let base = get_name("", bitmap, NamingConvention::UnderscoreLowerCase);
      let mut name = base.clone();
      let mut suffix = 1;
      while taken.contains(&name) {
        name = format!("{base}{suffix}");
        suffix += 1;
      }
      taken.insert(name.clone());
      result.names.insert(bitmap.to_string(), name);
      result.order.push(bitmap.to_string());
    }
    result
  }

  /// The de-duplicated name, without the `img_` prefix.
  pub fn name(&self, bitmap: &str) -> Option<&str> {
    self.names.get(bitmap).map(String::as_str)
  }

  /// `(bitmap, variable)` pairs in declaration order.
  pub fn variables(&self) -> impl Iterator<Item = (&str, String)> {
    self
      .order
      .iter()
      .filter_map(|bitmap| Some((bitmap.as_str(), self.bitmap_variable(bitmap)?)))
  }
}

impl BitmapRegistry for BitmapNames {
  fn bitmap_variable(&self, bitmap: &str) -> Option<String> {
    self.name(bitmap).map(|name| format!("img_{name}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_lower_snake_case() {
    let names = BitmapNames::new(["Logo Big", "arrowUp"]);
    assert_eq!(names.bitmap_variable("Logo Big").as_deref(), Some("img_logo_big"));
    assert_eq!(names.bitmap_variable("arrowUp").as_deref(), Some("img_arrow_up"));
  }

  #[test]
  fn clashes_get_numeric_suffix() {
    let names = BitmapNames::new(["logo", "Logo", "LOGO"]);
    assert_eq!(names.name("logo"), Some("logo"));
    assert_eq!(names.name("Logo"), Some("logo1"));
    assert_eq!(names.name("LOGO"), Some("logo2"));
  }

  #[test]
  fn unknown_bitmap_is_none() {
    let names = BitmapNames::new(["logo"]);
    assert_eq!(names.bitmap_variable("missing"), None);
  }

  #[test]
  fn variables_keep_declaration_order() {
    let names = BitmapNames::new(["b", "a"]);
    let vars: Vec<_> = names.variables().collect();
    assert_eq!(vars, vec![("b", "img_b".to_string()), ("a", "img_a".to_string())]);
  }
}

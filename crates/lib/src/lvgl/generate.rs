//! Whole-program MicroPython generation for LVGL projects.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use super::widgets::{self, WidgetKind};
use crate::codegen::{
  BitmapNames, Geometry, LineBuilder, LvglCode, MicroPythonCode, PythonWriter, WidgetInfo, escape_python,
};
use crate::consts::APP_NAME;
use crate::project::{ObjectNode, Project};
use crate::util::naming::{NamingConvention, get_name, to_snake_case};

/// Generated prefix for widgets without a name.
const GENERATED_NAME_PREFIX: &str = "obj";

const DEFAULT_SCREEN_WIDTH: i64 = 800;
const DEFAULT_SCREEN_HEIGHT: i64 = 480;

struct Screen {
  create_fn: String,
  tick_fn: String,
  create_at_start: bool,
  create_body: String,
  tick_body: Option<String>,
  globals: BTreeSet<String>,
}

struct Generator<'a> {
  project: &'a Project,
  code: MicroPythonCode<PythonWriter>,
  bitmaps: BitmapNames,
  identifiers: HashSet<String>,
  generated: usize,
  actions: Vec<String>,
}

/// Generate the MicroPython program for an LVGL project.
pub fn generate_micropython(project: &Project) -> String {
  Generator::new(project).generate()
}

fn unique(taken: &mut HashSet<String>, base: String) -> String {
  let mut name = base.clone();
  let mut suffix = 1;
  while taken.contains(&name) {
    name = format!("{base}{suffix}");
    suffix += 1;
  }
  taken.insert(name.clone());
  name
}

/// Splice an already generated block into `out` at its current indentation.
fn splice(out: &mut PythonWriter, body: &str) {
  for line in body.lines() {
    out.line(line);
  }
}

fn python_default(var_type: &str, default: Option<&str>) -> String {
  let default = default.map(str::trim).filter(|d| !d.is_empty());
  let numeric = matches!(var_type, "integer" | "float" | "double");
  match (var_type, default) {
    ("boolean", Some("true")) => "True".to_string(),
    ("boolean", _) => "False".to_string(),
    (_, Some(value)) if numeric && value.parse::<f64>().is_ok() => value.to_string(),
    (_, _) if numeric => "0".to_string(),
    // Already a literal; only raw line breaks need escaping.
    ("string", Some(value)) if value.starts_with('"') => value.replace('\n', "\\n").replace('\r', "\\r"),
    ("string", Some(value)) => escape_python(value),
    ("string", None) => "\"\"".to_string(),
    (t, _) if t.starts_with("array") => "[]".to_string(),
    _ => "None".to_string(),
  }
}

impl<'a> Generator<'a> {
  fn new(project: &'a Project) -> Self {
    let bitmaps = BitmapNames::new(
      project
        .root
        .array("bitmaps")
        .iter()
        .filter_map(|b| b.str_prop("name")),
    );
    let code = MicroPythonCode::new(
      PythonWriter::new(),
      Box::new(bitmaps.clone()),
      project.settings.build.screens_lifetime_support,
    );

    Self {
      project,
      code,
      bitmaps,
      identifiers: HashSet::new(),
      generated: 0,
      actions: Vec::new(),
    }
  }

  fn pages(&self) -> impl Iterator<Item = &'a ObjectNode> + use<'a> {
    self
      .project
      .root
      .array("pages")
      .iter()
      .filter(|p| !p.bool_prop("isUsedAsUserWidget").unwrap_or(false))
  }

  fn styles(&self) -> Vec<(String, &'a str)> {
    let mut seen = HashSet::new();
    let mut styles = Vec::new();
    for style in self.project.root.array("styles") {
      let Some(name) = style.str_prop("name").filter(|n| !n.is_empty()) else {
        continue;
      };
      let key = widgets::style_key(name);
      if !seen.insert(key.clone()) {
        warn!(style = name, key = %key, "style name clashes with an earlier style, skipping");
        continue;
      }
      styles.push((key, name));
    }
    styles
  }

  fn note_action(&mut self, action: &str) {
    let function = widgets::action_function(action);
    if !self.actions.contains(&function) {
      self.actions.push(function);
    }
  }

  fn widget_identifier(&mut self, node: &ObjectNode) -> String {
    let named = node
      .str_prop("identifier")
      .or_else(|| node.str_prop("name"))
      .map(|n| get_name("", n, NamingConvention::UnderscoreLowerCase))
      .filter(|n| !n.is_empty());
    let base = match named {
      Some(name) => name,
      None => {
        let name = format!("{GENERATED_NAME_PREFIX}{}", self.generated);
        self.generated += 1;
        name
      }
    };
    unique(&mut self.identifiers, base)
  }

  fn build_widget(&mut self, node: &ObjectNode, parent_is_flex: bool) {
    let kind = WidgetKind::from_type(node.str_prop("type").unwrap_or_default());
    let geometry = if parent_is_flex {
      Geometry::ControlledByParent
    } else {
      Geometry::At {
        left: node.int_prop("left").unwrap_or(0),
        top: node.int_prop("top").unwrap_or(0),
        width: node.int_prop("width").unwrap_or(100),
        height: node.int_prop("height").unwrap_or(50),
      }
    };
    let identifier = self.widget_identifier(node);

    for action in widgets::referenced_actions(node) {
      self.note_action(action);
    }

    self.code.writer().line(&format!("# {identifier}"));
    self.code.start_widget(WidgetInfo {
      id: node.id.clone(),
      identifier,
      geometry,
    });
    widgets::lower(&mut self.code, node, &kind);
    self.code.end_widget();

    let children = node.array("children");
    if !children.is_empty() {
      let is_flex = node.str_prop("layout") == Some("flex");
      self.code.writer().line("parent_obj = obj");
      for child in children {
        self.build_widget(child, is_flex);
      }
      self.code.writer().line("parent_obj = parent_obj.get_parent()");
    }
  }

  fn build_screen(&mut self, page: &ObjectNode, index: usize) -> Screen {
    let name = page.str_prop("name").unwrap_or_default();
    let base = match get_name("", name, NamingConvention::UnderscoreLowerCase) {
      n if n.is_empty() => format!("screen{index}"),
      n => n,
    };
    let identifier = unique(&mut self.identifiers, base);
    debug!(page = name, identifier = %identifier, "generating screen");

    self.code.start_widget(WidgetInfo {
      id: page.id.clone(),
      identifier: identifier.clone(),
      geometry: Geometry::At {
        left: page.int_prop("left").unwrap_or(0),
        top: page.int_prop("top").unwrap_or(0),
        width: page.int_prop("width").unwrap_or(DEFAULT_SCREEN_WIDTH),
        height: page.int_prop("height").unwrap_or(DEFAULT_SCREEN_HEIGHT),
      },
    });
    self.code.create_screen();
    self.code.end_widget();

    // A screen widget wraps the real widgets in newer project files.
    let mut top_level = Vec::new();
    for component in page.array("components") {
      match WidgetKind::from_type(component.str_prop("type").unwrap_or_default()) {
        WidgetKind::Screen => top_level.extend(component.array("children")),
        _ => top_level.push(component),
      }
    }

    if !top_level.is_empty() {
      self.code.writer().line("");
      self.code.writer().line("parent_obj = obj");
      let is_flex = page.str_prop("layout") == Some("flex");
      for widget in top_level {
        self.build_widget(widget, is_flex);
      }
    }

    self.code.finish_page();
    let create_body = self.code.take_output();
    let globals = self.code.take_assigned_statics();

    let tick_body = (self.code.write_tick_callbacks() > 0).then(|| self.code.take_output());

    Screen {
      create_fn: format!("create_screen_{identifier}"),
      tick_fn: format!("tick_screen_{identifier}"),
      create_at_start: page.bool_prop("createAtStart").unwrap_or(true),
      create_body,
      tick_body,
      globals,
    }
  }

  fn generate(mut self) -> String {
    for action in self.project.root.array("actions") {
      if let Some(name) = action.str_prop("name").filter(|n| !n.is_empty()) {
        self.note_action(name);
      }
    }

    let pages: Vec<&ObjectNode> = self.pages().collect();
    let screens: Vec<Screen> = pages
      .iter()
      .enumerate()
      .map(|(index, page)| self.build_screen(page, index))
      .collect();

    self.code.write_event_handlers();
    let event_handlers = self.code.take_output();

    let styles = self.styles();
    let mut out = PythonWriter::new();

    out.line(&format!("# Generated by {APP_NAME}"));
    out.line("# MicroPython LVGL 9.x code");
    out.line("");
    out.line("import lvgl as lv");
    out.line("");
    out.line("# Global objects storage");
    out.line("objects = {}");
    out.line("tick_value_change_obj = None");
    out.line("");

    let statics: Vec<&str> = self.code.static_vars().collect();
    if !statics.is_empty() {
      out.line("# Static variables");
      for var in statics {
        out.line(&format!("{var} = None"));
      }
      out.line("");
    }

    self.write_variables(&mut out);

    if !self.actions.is_empty() {
      out.line("# Actions");
      out.line("");
      for action in &self.actions {
        out.block_start(&format!("def {action}(e):"));
        out.line("pass");
        out.block_end("");
        out.line("");
      }
    }

    let images: Vec<(&str, String)> = self.bitmaps.variables().collect();
    if !images.is_empty() {
      out.line("# Images");
      for (bitmap, var) in images {
        out.line(&format!("# Bitmap: {bitmap}"));
        out.line(&format!("{var} = None"));
      }
      out.line("");
    }

    if !styles.is_empty() {
      out.line("# Styles");
      out.line("styles = {}");
      out.line("");
      out.block_start("def init_styles():");
      out.line("global styles");
      for (key, name) in &styles {
        out.line("");
        out.line(&format!("# Style: {name}"));
        out.line(&format!("styles[\"{key}\"] = lv.style_t()"));
        out.line(&format!("styles[\"{key}\"].init()"));
      }
      out.block_end("");
      out.line("");
    }

    if !event_handlers.is_empty() {
      out.line("# Event handlers");
      out.line("");
      splice(&mut out, &event_handlers);
    }

    out.line("# Screen creation functions");
    out.line("");
    for screen in &screens {
      out.block_start(&format!("def {}():", screen.create_fn));
      let mut globals = vec!["objects".to_string()];
      globals.extend(screen.globals.iter().cloned());
      out.line(&format!("global {}", globals.join(", ")));
      out.line("");
      splice(&mut out, &screen.create_body);
      out.block_end("");
      out.line("");
    }

    out.line("# Tick functions");
    out.line("");
    for screen in &screens {
      out.block_start(&format!("def {}():", screen.tick_fn));
      out.line("global objects, tick_value_change_obj");
      match &screen.tick_body {
        Some(body) => splice(&mut out, body),
        None => out.line("pass"),
      }
      out.block_end("");
      out.line("");
    }

    let tick_fns: Vec<&str> = screens.iter().map(|s| s.tick_fn.as_str()).collect();
    out.line(&format!("tick_screen_funcs = [{}]", tick_fns.join(", ")));
    out.line("");
    out.block_start("def tick_screen(screen_index):");
    out.line("tick_screen_funcs[screen_index]()");
    out.block_end("");
    out.line("");

    out.line("# Main initialization");
    out.line("");
    out.block_start("def create_screens():");
    if !styles.is_empty() {
      out.line("init_styles()");
      out.line("");
    }
    out.line("# Initialize display theme");
    out.line("disp = lv.display.get_default()");
    out.line(&format!(
      "theme = lv.theme_default_init(disp, lv.palette_main(lv.PALETTE.BLUE), lv.palette_main(lv.PALETTE.RED), {}, lv.font_default())",
      self.code.boolean(self.project.settings.general.dark_theme)
    ));
    out.line("disp.set_theme(theme)");
    out.line("");
    out.line("# Create screens");
    let lifetime = self.code.screens_lifetime_support();
    for screen in &screens {
      if screen.create_at_start || !lifetime {
        out.line(&format!("{}()", screen.create_fn));
      }
    }
    out.block_end("");
    out.line("");

    out.line("# Entry point");
    out.block_start("if __name__ == '__main__':");
    out.line("create_screens()");
    out.block_end("");

    out.finish()
  }

  fn write_variables(&self, out: &mut PythonWriter) {
    let Some(variables) = self.project.root.object("variables") else {
      return;
    };
    let globals = variables.array("globalVariables");
    if globals.is_empty() {
      return;
    }

    out.line("# Variables");
    out.line("");
    for variable in globals {
      let Some(name) = variable.str_prop("name").filter(|n| !n.is_empty()) else {
        continue;
      };
      let snake = to_snake_case(name);
      let var_type = variable.str_prop("type").unwrap_or_default();
      let default = python_default(var_type, variable.str_prop("defaultValue"));

      out.line(&format!("var_{snake} = {default}"));
      out.line("");
      out.block_start(&format!("def get_var_{snake}():"));
      out.line(&format!("return var_{snake}"));
      out.block_end("");
      out.line("");
      out.block_start(&format!("def set_var_{snake}(value):"));
      out.line(&format!("global var_{snake}"));
      out.line(&format!("var_{snake} = value"));
      out.block_end("");
      out.line("");
    }
  }
}

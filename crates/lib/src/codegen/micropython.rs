//! MicroPython target for lv_micropython (LVGL 9.x bindings).

use std::collections::BTreeSet;

use super::tables::{self, NS, OR};
use super::{BitmapRegistry, Geometry, LineBuilder, LvglCode, WidgetInfo};
use crate::util::naming::to_snake_case;

type Deferred<B> = Box<dyn FnOnce(&mut MicroPythonCode<B>)>;

/// Which generated function statements are currently written into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
  /// `create_screen_*`: the widget was just created and is bound to `obj`.
  Build,
  Tick,
  Event,
}

struct EventHandlers<B: LineBuilder> {
  widget: WidgetInfo,
  attached: bool,
  callbacks: Vec<Deferred<B>>,
}

struct StaticVar {
  id: String,
  name: String,
}

pub struct MicroPythonCode<B: LineBuilder> {
  out: B,
  bitmaps: Box<dyn BitmapRegistry>,
  screens_lifetime_support: bool,

  widget: Option<WidgetInfo>,
  phase: Phase,
  component_index: Option<usize>,
  property_index: Option<usize>,

  post_widget: Vec<Deferred<B>>,
  post_page: Vec<Deferred<B>>,
  ticks: Vec<Deferred<B>>,
  events: Vec<EventHandlers<B>>,

  static_vars: Vec<StaticVar>,
  assigned_statics: BTreeSet<String>,
}

impl<B: LineBuilder + 'static> MicroPythonCode<B> {
  pub fn new(out: B, bitmaps: Box<dyn BitmapRegistry>, screens_lifetime_support: bool) -> Self {
    Self {
      out,
      bitmaps,
      screens_lifetime_support,
      widget: None,
      phase: Phase::Build,
      component_index: None,
      property_index: None,
      post_widget: Vec::new(),
      post_page: Vec::new(),
      ticks: Vec::new(),
      events: Vec::new(),
      static_vars: Vec::new(),
      assigned_statics: BTreeSet::new(),
    }
  }

  /// Direct access to the output, for statements outside any widget.
  pub fn writer(&mut self) -> &mut B {
    &mut self.out
  }

  /// Take everything written so far.
  pub fn take_output(&mut self) -> String {
    self.out.finish()
  }

  fn widget(&self) -> &WidgetInfo {
    self
      .widget
      .as_ref()
      .expect("widget lowering operation called outside start_widget/end_widget")
  }

  /// Receiver for object calls: the fresh `obj` while building, the
  /// widget's accessor from deferred code.
  fn receiver(&self) -> String {
    match self.phase {
      Phase::Build => "obj".to_string(),
      Phase::Tick | Phase::Event => self.widget().accessor(),
    }
  }

  fn build_widget_assign(&mut self) {
    let line = format!("{} = obj", self.widget().accessor());
    self.out.line(&line);
  }

  fn build_widget_set_pos_and_size(&mut self) {
    if let Geometry::At {
      left,
      top,
      width,
      height,
    } = self.widget().geometry
    {
      self.out.line(&format!("obj.set_pos({left}, {top})"));
      self.out.line(&format!("obj.set_size({width}, {height})"));
    }
  }

  fn block(&mut self, header: String, body: impl FnOnce(&mut Self)) {
    self.widget();
    self.out.block_start(&header);
    body(self);
    self.out.block_end("");
  }

  /// Run post-page callbacks, first registered first.
  pub fn finish_page(&mut self) {
    while !self.post_page.is_empty() {
      for callback in std::mem::take(&mut self.post_page) {
        callback(self);
      }
    }
    self.widget = None;
  }

  /// Emit the statements of every pending tick callback; returns how many ran.
  pub fn write_tick_callbacks(&mut self) -> usize {
    let ticks = std::mem::take(&mut self.ticks);
    let count = ticks.len();
    for callback in ticks {
      callback(self);
    }
    self.widget = None;
    count
  }

  /// Name of the event handler function generated for `widget`.
  pub fn event_handler_name(widget: &WidgetInfo) -> String {
    format!("event_handler_cb_{}", widget.identifier)
  }

  /// Emit one handler function per widget with registered event callbacks.
  pub fn write_event_handlers(&mut self) {
    for handlers in std::mem::take(&mut self.events) {
      self
        .out
        .block_start(&format!("def {}(e):", Self::event_handler_name(&handlers.widget)));
      self.out.line("event = e.get_code()");
      for callback in handlers.callbacks {
        callback(self);
      }
      self.out.block_end("");
      self.out.line("");
    }
    self.widget = None;
  }

  /// Declared file-level variables, in creation order.
  pub fn static_vars(&self) -> impl Iterator<Item = &str> {
    self.static_vars.iter().map(|v| v.name.as_str())
  }

  /// File-level variables assigned since the last call, for a `global` line.
  pub fn take_assigned_statics(&mut self) -> BTreeSet<String> {
    std::mem::take(&mut self.assigned_statics)
  }

  fn attach_event_handlers(&mut self) {
    let id = self.widget().id.clone();
    let Some(handlers) = self.events.iter_mut().find(|h| h.widget.id == id) else {
      return;
    };
    if handlers.attached {
      return;
    }
    handlers.attached = true;
    let name = Self::event_handler_name(&handlers.widget);
    self
      .out
      .line(&format!("obj.add_event_cb({name}, {NS}.EVENT.ALL, None)"));
  }
}

/// `value` as a double-quoted, single-line Python string literal.
pub(crate) fn escape_python(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len() + 2);
  escaped.push('"');
  for c in value.chars() {
    match c {
      '\\' => escaped.push_str("\\\\"),
      '"' => escaped.push_str("\\\""),
      '\n' => escaped.push_str("\\n"),
      '\r' => escaped.push_str("\\r"),
      '\t' => escaped.push_str("\\t"),
      c => escaped.push(c),
    }
  }
  escaped.push('"');
  escaped
}

fn call(target: &str, args: &[&str]) -> String {
  format!("{target}({})", args.join(", "))
}

fn getter(variable: &str) -> String {
  format!("get_var_{}()", to_snake_case(variable))
}

impl<B: LineBuilder + 'static> LvglCode for MicroPythonCode<B> {
  fn is_v9(&self) -> bool {
    true
  }

  fn screens_lifetime_support(&self) -> bool {
    self.screens_lifetime_support
  }

  fn start_widget(&mut self, widget: WidgetInfo) {
    self.widget = Some(widget);
    self.phase = Phase::Build;
  }

  fn end_widget(&mut self) {
    while !self.post_widget.is_empty() {
      for callback in std::mem::take(&mut self.post_widget) {
        callback(self);
      }
    }
    if self.widget.is_some() {
      self.attach_event_handlers();
    }
  }

  fn set_indices(&mut self, component_index: Option<usize>, property_index: Option<usize>) {
    self.component_index = component_index;
    self.property_index = property_index;
  }

  fn component_index(&self) -> Option<usize> {
    self.component_index
  }

  fn property_index(&self) -> Option<usize> {
    self.property_index
  }

  fn object_accessor(&self) -> String {
    self.widget().accessor()
  }

  fn constant(&self, constant: &str) -> String {
    tables::translate_constant(constant)
  }

  fn string_literal(&self, value: &str) -> String {
    escape_python(value)
  }

  fn string_property(&self, kind: &str, value: &str, non_empty: bool) -> String {
    match kind {
      "literal" => escape_python(value),
      "translated-literal" => format!("_({})", escape_python(value)),
      _ if non_empty => "\" \"".to_string(),
      _ => "\"\"".to_string(),
    }
  }

  fn color(&self, rgb: u32) -> String {
    format!("{NS}.color_hex(0x{rgb:06X})")
  }

  fn color_expr(&self, expr: &str) -> String {
    format!("{NS}.color_hex({expr})")
  }

  fn boolean(&self, value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
  }

  fn image(&self, bitmap: &str) -> String {
    self
      .bitmaps
      .bitmap_variable(bitmap)
      .unwrap_or_else(|| "None".to_string())
  }

  fn or(&self, args: &[&str]) -> String {
    args.join(OR)
  }

  fn create_screen(&mut self) -> String {
    self.widget();
    self.out.line(&format!("obj = {NS}.obj(None)"));
    self.build_widget_assign();
    self.build_widget_set_pos_and_size();
    "obj".to_string()
  }

  fn create_object(&mut self, create_function: &str, args: &[&str]) -> String {
    self.widget();
    let mut all = vec!["parent_obj"];
    all.extend_from_slice(args);
    self
      .out
      .line(&format!("obj = {}", call(&tables::create_function(create_function), &all)));
    self.build_widget_assign();
    self.build_widget_set_pos_and_size();
    "obj".to_string()
  }

  fn get_object(&mut self, get_function: &str, args: &[&str]) -> String {
    self.widget();
    let mut all = vec!["parent_obj"];
    all.extend_from_slice(args);
    self
      .out
      .line(&format!("obj = {}", call(&tables::get_function(get_function), &all)));
    self.build_widget_assign();
    "obj".to_string()
  }

  fn get_parent_object(&mut self, get_function: &str, args: &[&str]) -> String {
    self.widget();
    let mut all = vec!["parent_obj.get_parent()"];
    all.extend_from_slice(args);
    self
      .out
      .line(&format!("obj = {}", call(&tables::get_function(get_function), &all)));
    self.build_widget_assign();
    "obj".to_string()
  }

  fn call_object_function(&mut self, func: &str, args: &[&str]) {
    let expr = self.call_object_function_inline(func, args);
    self.out.line(&expr);
  }

  fn call_object_function_with_assignment(
    &mut self,
    _decl_type: &str,
    decl_name: &str,
    func: &str,
    args: &[&str],
  ) -> String {
    let expr = self.call_object_function_inline(func, args);
    self.out.line(&format!("{decl_name} = {expr}"));
    decl_name.to_string()
  }

  fn call_object_function_inline(&self, func: &str, args: &[&str]) -> String {
    call(&format!("{}.{}", self.receiver(), tables::method_name(func)), args)
  }

  fn call_free_function(&mut self, func: &str, args: &[&str]) {
    self.out.line(&call(&tables::free_function(func), args));
  }

  fn call_free_function_with_assignment(
    &mut self,
    _decl_type: &str,
    decl_name: &str,
    func: &str,
    args: &[&str],
  ) -> String {
    let expr = call(&tables::free_function(func), args);
    self.out.line(&format!("{decl_name} = {expr}"));
    decl_name.to_string()
  }

  fn eval_text_property(&mut self, _decl_type: &str, decl_name: &str, variable: &str) -> String {
    self.out.line(&format!("{decl_name} = {}", getter(variable)));
    decl_name.to_string()
  }

  fn eval_integer_property(&mut self, _decl_type: &str, decl_name: &str, variable: &str) -> String {
    self.out.line(&format!("{decl_name} = {}", getter(variable)));
    decl_name.to_string()
  }

  fn eval_unsigned_integer_property(&mut self, _decl_type: &str, decl_name: &str, variable: &str) -> String {
    self.out.line(&format!("{decl_name} = {}", getter(variable)));
    decl_name.to_string()
  }

  fn eval_string_array_property_and_join(&mut self, _decl_type: &str, decl_name: &str, variable: &str) -> String {
    self
      .out
      .line(&format!("{decl_name} = \"\\n\".join({})", getter(variable)));
    decl_name.to_string()
  }

  fn assign_integer_property(&mut self, _property: &str, variable: &str, value: &str) {
    self
      .out
      .line(&format!("set_var_{}({value})", to_snake_case(variable)));
  }

  fn assign_string_property(&mut self, _property: &str, variable: &str, value: &str) {
    self
      .out
      .line(&format!("set_var_{}({value})", to_snake_case(variable)));
  }

  fn assign(&mut self, _decl_type: &str, decl_name: &str, rhs: &str) -> String {
    self.out.line(&format!("{decl_name} = {rhs}"));
    decl_name.to_string()
  }

  fn if_condition(&mut self, condition: &str, body: impl FnOnce(&mut Self)) {
    self.block(format!("if {condition}:"), body);
  }

  fn if_string_not_equal(&mut self, a: &str, b: &str, body: impl FnOnce(&mut Self)) {
    self.block(format!("if {a} != {b}:"), body);
  }

  fn if_string_not_equal_n(&mut self, a: &str, b: &str, n: usize, body: impl FnOnce(&mut Self)) {
    self.block(format!("if {a}[:{n}] != {b}[:{n}]:"), body);
  }

  fn if_integer_less(&mut self, a: &str, b: &str, body: impl FnOnce(&mut Self)) {
    self.block(format!("if {a} < {b}:"), body);
  }

  fn if_integer_not_equal(&mut self, a: &str, b: &str, body: impl FnOnce(&mut Self)) {
    self.block(format!("if {a} != {b}:"), body);
  }

  fn block_start(&mut self, header: &str) {
    self.out.block_start(header);
  }

  fn block_end(&mut self, footer: &str) {
    self.out.block_end(footer);
  }

  fn add_to_tick(&mut self, _property: &str, callback: impl FnOnce(&mut Self) + 'static) {
    let widget = self.widget().clone();
    self.ticks.push(Box::new(move |code: &mut Self| {
      code.widget = Some(widget);
      code.phase = Phase::Tick;
      callback(code);
      code.phase = Phase::Build;
    }));
  }

  fn tick_change_start(&mut self) {
    let accessor = self.object_accessor();
    self.out.line(&format!("tick_value_change_obj = {accessor}"));
  }

  fn tick_change_end(&mut self) {
    self.out.line("tick_value_change_obj = None");
  }

  fn add_event_handler(&mut self, event_name: &str, callback: impl FnOnce(&mut Self, &str, &str) + 'static) {
    let widget = self.widget().clone();
    let component_index = self.component_index;
    let property_index = self.property_index;
    let guard = format!("if event == {NS}.EVENT.{event_name}:");

    let restored = widget.clone();
    let deferred: Deferred<B> = Box::new(move |code: &mut Self| {
      code.out.block_start(&guard);
      code.widget = Some(restored);
      code.component_index = component_index;
      code.property_index = property_index;
      code.phase = Phase::Event;
      callback(code, "e", "tick_value_change_obj");
      code.phase = Phase::Build;
      code.out.block_end("");
    });

    match self.events.iter_mut().find(|h| h.widget.id == widget.id) {
      Some(handlers) => handlers.callbacks.push(deferred),
      None => self.events.push(EventHandlers {
        widget,
        attached: false,
        callbacks: vec![deferred],
      }),
    }
  }

  fn post_page_execute(&mut self, callback: impl FnOnce(&mut Self) + 'static) {
    self.post_page.push(Box::new(callback));
  }

  fn post_widget_execute(&mut self, callback: impl FnOnce(&mut Self) + 'static) {
    self.post_widget.push(Box::new(callback));
  }

  fn gen_file_static_var(&mut self, id: &str, _decl_type: &str, prefix: &str) -> String {
    if let Some(existing) = self.static_vars.iter().find(|v| v.id == id) {
      return existing.name.clone();
    }
    let name = format!("{prefix}_{}", self.static_vars.len());
    self.static_vars.push(StaticVar {
      id: id.to_string(),
      name: name.clone(),
    });
    name
  }

  fn assign_to_file_static_var(&mut self, var: &str, value: &str) {
    self.assigned_statics.insert(var.to_string());
    self.out.line(&format!("{var} = {value}"));
  }
}

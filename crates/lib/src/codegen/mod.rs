//! Lowering of LVGL widget builds to target source code.
//!
//! A widget walker drives an [`LvglCode`] implementation: it opens a widget
//! with [`LvglCode::start_widget`], lets the widget describe itself in terms of
//! C LVGL names (`lv_label_create`, `LV_ALIGN_CENTER`, ...), and closes it with
//! [`LvglCode::end_widget`]. The implementation translates every name for its
//! target and writes statements to a [`LineBuilder`].
//!
//! Names the tables do not know are never an error; they go through a generic
//! rewrite. Calling a widget-scoped operation with no open widget is a bug in
//! the walker and panics.

pub mod bitmaps;
mod micropython;
pub mod tables;
pub mod writer;

pub use bitmaps::{BitmapNames, BitmapRegistry};
pub(crate) use micropython::escape_python;
pub use micropython::MicroPythonCode;
pub use writer::{LineBuilder, PythonWriter};

use crate::project::NodeId;

/// Where a widget is placed after it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
  At { left: i64, top: i64, width: i64, height: i64 },
  /// Position and size come from the parent's layout.
  ControlledByParent,
}

/// The widget a lowering operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetInfo {
  pub id: NodeId,
  /// Key in the generated `objects` table.
  pub identifier: String,
  pub geometry: Geometry,
}

impl WidgetInfo {
  /// Expression that reaches this widget from anywhere in the generated file.
  pub fn accessor(&self) -> String {
    format!("objects[\"{}\"]", self.identifier)
  }
}

/// The fixed set of operations a widget build is expressed in.
///
/// Every method taking a function or constant name expects the C LVGL
/// spelling; implementations translate it.
pub trait LvglCode: Sized {
  fn is_v9(&self) -> bool;

  fn screens_lifetime_support(&self) -> bool;

  fn start_widget(&mut self, widget: WidgetInfo);

  /// Close the current widget, running its post-widget callbacks in order.
  fn end_widget(&mut self);

  /// Flow indices carried into event handlers registered from now on.
  fn set_indices(&mut self, component_index: Option<usize>, property_index: Option<usize>);

  fn component_index(&self) -> Option<usize>;

  fn property_index(&self) -> Option<usize>;

  /// Accessor of the current widget.
  fn object_accessor(&self) -> String;

  // Literals.

  fn constant(&self, constant: &str) -> String;

  fn string_literal(&self, value: &str) -> String;

  /// `kind` is `literal`, `translated-literal` or anything else for a value
  /// only known at run time, rendered as an empty (or single space) string.
  fn string_property(&self, kind: &str, value: &str, non_empty: bool) -> String;

  fn color(&self, rgb: u32) -> String;

  /// A color given as an expression rather than a value.
  fn color_expr(&self, expr: &str) -> String;

  fn boolean(&self, value: bool) -> String;

  fn image(&self, bitmap: &str) -> String;

  fn or(&self, args: &[&str]) -> String;

  // Objects.

  fn create_screen(&mut self) -> String;

  fn create_object(&mut self, create_function: &str, args: &[&str]) -> String;

  fn get_object(&mut self, get_function: &str, args: &[&str]) -> String;

  fn get_parent_object(&mut self, get_function: &str, args: &[&str]) -> String;

  // Calls.

  fn call_object_function(&mut self, func: &str, args: &[&str]);

  fn call_object_function_with_assignment(
    &mut self,
    decl_type: &str,
    decl_name: &str,
    func: &str,
    args: &[&str],
  ) -> String;

  /// The call expression, without emitting anything.
  fn call_object_function_inline(&self, func: &str, args: &[&str]) -> String;

  fn call_free_function(&mut self, func: &str, args: &[&str]);

  fn call_free_function_with_assignment(
    &mut self,
    decl_type: &str,
    decl_name: &str,
    func: &str,
    args: &[&str],
  ) -> String;

  // Variables.

  fn eval_text_property(&mut self, decl_type: &str, decl_name: &str, variable: &str) -> String;

  fn eval_integer_property(&mut self, decl_type: &str, decl_name: &str, variable: &str) -> String;

  fn eval_unsigned_integer_property(&mut self, decl_type: &str, decl_name: &str, variable: &str) -> String;

  fn eval_string_array_property_and_join(&mut self, decl_type: &str, decl_name: &str, variable: &str) -> String;

  fn assign_integer_property(&mut self, property: &str, variable: &str, value: &str);

  fn assign_string_property(&mut self, property: &str, variable: &str, value: &str);

  // Control flow.

  fn assign(&mut self, decl_type: &str, decl_name: &str, rhs: &str) -> String;

  fn if_condition(&mut self, condition: &str, body: impl FnOnce(&mut Self));

  fn if_string_not_equal(&mut self, a: &str, b: &str, body: impl FnOnce(&mut Self));

  fn if_string_not_equal_n(&mut self, a: &str, b: &str, n: usize, body: impl FnOnce(&mut Self));

  fn if_integer_less(&mut self, a: &str, b: &str, body: impl FnOnce(&mut Self));

  fn if_integer_not_equal(&mut self, a: &str, b: &str, body: impl FnOnce(&mut Self));

  fn block_start(&mut self, header: &str);

  fn block_end(&mut self, footer: &str);

  // Deferred execution.

  /// Run `callback` from the periodic update of the current page, with the
  /// current widget restored and calls addressed through its accessor.
  fn add_to_tick(&mut self, property: &str, callback: impl FnOnce(&mut Self) + 'static);

  fn tick_change_start(&mut self);

  fn tick_change_end(&mut self);

  /// Run `callback` inside the current widget's event handler, guarded by
  /// `event_name`. The callback receives the event and the tick-change
  /// object expressions.
  fn add_event_handler(&mut self, event_name: &str, callback: impl FnOnce(&mut Self, &str, &str) + 'static);

  fn post_page_execute(&mut self, callback: impl FnOnce(&mut Self) + 'static);

  fn post_widget_execute(&mut self, callback: impl FnOnce(&mut Self) + 'static);

  /// A file-level variable, one per `id`.
  fn gen_file_static_var(&mut self, id: &str, decl_type: &str, prefix: &str) -> String;

  fn assign_to_file_static_var(&mut self, var: &str, value: &str);
}

//! Per-widget lowering in terms of [`LvglCode`] operations.

use serde_json::Value;

use crate::codegen::LvglCode;
use crate::project::ObjectNode;
use crate::util::naming::{NamingConvention, get_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKind {
  Screen,
  Panel,
  Label,
  Button,
  Image,
  Slider,
  Bar,
  Arc,
  Switch,
  Checkbox,
  Textarea,
  /// Anything else; created through the generic `lv_<kind>_create` name.
  Other(String),
}

impl WidgetKind {
  /// Accepts both `LVGLLabelWidget` and `Label` spellings.
  pub fn from_type(type_name: &str) -> Self {
    let core = type_name.strip_prefix("LVGL").unwrap_or(type_name);
    let core = core.strip_suffix("Widget").unwrap_or(core);
    match core.to_ascii_lowercase().as_str() {
      "screen" => Self::Screen,
      "panel" | "obj" | "" => Self::Panel,
      "label" => Self::Label,
      "button" | "btn" => Self::Button,
      "image" | "img" => Self::Image,
      "slider" => Self::Slider,
      "bar" => Self::Bar,
      "arc" => Self::Arc,
      "switch" => Self::Switch,
      "checkbox" => Self::Checkbox,
      "textarea" => Self::Textarea,
      other => Self::Other(other.to_string()),
    }
  }

  pub fn create_function(&self) -> String {
    match self {
      Self::Screen | Self::Panel => "lv_obj_create".to_string(),
      Self::Label => "lv_label_create".to_string(),
      Self::Button => "lv_btn_create".to_string(),
      Self::Image => "lv_img_create".to_string(),
      Self::Slider => "lv_slider_create".to_string(),
      Self::Bar => "lv_bar_create".to_string(),
      Self::Arc => "lv_arc_create".to_string(),
      Self::Switch => "lv_switch_create".to_string(),
      Self::Checkbox => "lv_checkbox_create".to_string(),
      Self::Textarea => "lv_textarea_create".to_string(),
      Self::Other(kind) => format!("lv_{kind}_create"),
    }
  }
}

/// Key of a style in the generated `styles` table.
pub fn style_key(name: &str) -> String {
  get_name("", name, NamingConvention::UnderscoreLowerCase)
}

/// Function generated for a user action.
pub fn action_function(action: &str) -> String {
  get_name("action_", action, NamingConvention::UnderscoreLowerCase)
}

/// Actions referenced from the event handlers of `node`.
pub fn referenced_actions(node: &ObjectNode) -> impl Iterator<Item = &str> {
  node
    .array("eventHandlers")
    .iter()
    .filter(|h| h.str_prop("handlerType").is_none_or(|t| t == "action"))
    .filter_map(|h| h.str_prop("action"))
    .filter(|a| !a.is_empty())
}

/// How a property gets its value.
enum Binding<'a> {
  /// `literal` or `translated-literal` text, or a literal number.
  Value { kind: &'a str, value: &'a Value },
  /// Read from a variable at run time.
  Variable(String),
  Unset,
}

fn binding<'a>(node: &'a ObjectNode, prop: &str) -> Binding<'a> {
  let kind = node
    .properties
    .get(&format!("{prop}Type"))
    .and_then(Value::as_str)
    .unwrap_or("literal");
  match (kind, node.properties.get(prop)) {
    ("expression", Some(Value::String(var))) if !var.is_empty() => Binding::Variable(var.clone()),
    ("expression", _) | (_, None) => Binding::Unset,
    (kind, Some(value)) => Binding::Value { kind, value },
  }
}

fn split_flags(list: &str) -> impl Iterator<Item = &str> {
  list.split('|').map(str::trim).filter(|f| !f.is_empty())
}

/// Create the widget and apply its own properties. The caller opens and
/// closes the widget around this.
pub fn lower<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode, kind: &WidgetKind) {
  code.create_object(&kind.create_function(), &[]);

  match kind {
    WidgetKind::Label => label(code, node),
    WidgetKind::Image => image(code, node),
    WidgetKind::Slider => {
      range(code, node, "lv_slider_set_range", ("min", "max"));
      value(code, node, Ranged::SLIDER);
    }
    WidgetKind::Bar => {
      range(code, node, "lv_bar_set_range", ("min", "max"));
      value(code, node, Ranged::BAR);
    }
    WidgetKind::Arc => arc(code, node),
    WidgetKind::Checkbox => {
      if let Binding::Value { kind, value: Value::String(text) } = binding(node, "text") {
        let text = code.string_property(kind, text, false);
        code.call_object_function("lv_checkbox_set_text", &[&text]);
      }
    }
    WidgetKind::Textarea => textarea(code, node),
    WidgetKind::Screen | WidgetKind::Panel | WidgetKind::Button | WidgetKind::Switch | WidgetKind::Other(_) => {}
  }

  common(code, node);
}

fn label<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode) {
  if let Some(mode) = node.str_prop("longMode").filter(|m| !m.is_empty() && *m != "WRAP") {
    let mode = code.constant(&format!("LV_LABEL_LONG_{mode}"));
    code.call_object_function("lv_label_set_long_mode", &[&mode]);
  }
  text(code, node, "text", "lv_label_set_text", "lv_label_get_text", false);
}

fn textarea<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode) {
  if let Some(chars) = node.str_prop("acceptedCharacters").filter(|c| !c.is_empty()) {
    let chars = code.string_literal(chars);
    code.call_object_function("lv_textarea_set_accepted_chars", &[&chars]);
  }
  let max_length = node.int_prop("maxTextLength").unwrap_or(128).to_string();
  code.call_object_function("lv_textarea_set_max_length", &[&max_length]);

  text(code, node, "text", "lv_textarea_set_text", "lv_textarea_get_text", true);

  if let Some(placeholder) = node.str_prop("placeholder").filter(|p| !p.is_empty()) {
    let placeholder = code.string_literal(placeholder);
    code.call_object_function("lv_textarea_set_placeholder_text", &[&placeholder]);
  }
  let one_line = code.boolean(node.bool_prop("oneLineMode").unwrap_or(false));
  code.call_object_function("lv_textarea_set_one_line", &[&one_line]);
  let password = code.boolean(node.bool_prop("passwordMode").unwrap_or(false));
  code.call_object_function("lv_textarea_set_password_mode", &[&password]);
}

/// A text property: set once when literal, refreshed from the tick when bound
/// to a variable, and written back on edit when `two_way`.
fn text<C: LvglCode + 'static>(
  code: &mut C,
  node: &ObjectNode,
  prop: &'static str,
  set_fn: &'static str,
  get_fn: &'static str,
  two_way: bool,
) {
  match binding(node, prop) {
    Binding::Value { kind, value: Value::String(text) } if !text.is_empty() => {
      let text = code.string_property(kind, text, false);
      code.call_object_function(set_fn, &[&text]);
    }
    Binding::Variable(variable) => {
      let tick_variable = variable.clone();
      code.add_to_tick(prop, move |code| {
        let new_val = code.eval_text_property("const char *", "new_val", &tick_variable);
        let cur_val = code.call_object_function_with_assignment("const char *", "cur_val", get_fn, &[]);
        code.if_string_not_equal(&new_val, &cur_val, |code| {
          code.tick_change_start();
          code.call_object_function(set_fn, &[&new_val]);
          code.tick_change_end();
        });
      });

      if two_way {
        code.add_event_handler("VALUE_CHANGED", move |code, event, tick_value_change_obj| {
          let ta = code.call_free_function_with_assignment("lv_obj_t *", "ta", "lv_event_get_target", &[event]);
          code.if_integer_not_equal(tick_value_change_obj, &ta, |code| {
            let value = code.call_object_function_with_assignment("const char *", "value", get_fn, &[]);
            code.assign_string_property(prop, &variable, &value);
          });
        });
      }
    }
    _ => {}
  }
}

fn image<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode) {
  if let Some(bitmap) = node.str_prop("image").filter(|b| !b.is_empty()) {
    let src = code.image(bitmap);
    code.call_object_function("lv_image_set_src", &[&src]);
  }
  if let (Some(x), Some(y)) = (node.int_prop("pivotX"), node.int_prop("pivotY")) {
    code.call_object_function("lv_image_set_pivot", &[&x.to_string(), &y.to_string()]);
  }
  if let Some(zoom) = node.int_prop("zoom").filter(|z| *z != 256) {
    code.call_object_function("lv_image_set_scale", &[&zoom.to_string()]);
  }
  if let Some(angle) = node.int_prop("angle").filter(|a| *a != 0) {
    code.call_object_function("lv_image_set_rotation", &[&angle.to_string()]);
  }
}

fn arc<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode) {
  range(code, node, "lv_arc_set_range", ("rangeMin", "rangeMax"));
  if let (Some(start), Some(end)) = (node.int_prop("bgStartAngle"), node.int_prop("bgEndAngle")) {
    code.call_object_function("lv_arc_set_bg_angles", &[&start.to_string(), &end.to_string()]);
  }
  if let Some(mode) = node.str_prop("mode").filter(|m| !m.is_empty() && *m != "NORMAL") {
    let mode = code.constant(&format!("LV_ARC_MODE_{mode}"));
    code.call_object_function("lv_arc_set_mode", &[&mode]);
  }
  if let Some(rotation) = node.int_prop("rotation").filter(|r| *r != 0) {
    code.call_object_function("lv_arc_set_rotation", &[&rotation.to_string()]);
  }
  value(code, node, Ranged::ARC);
}

fn range<C: LvglCode>(code: &mut C, node: &ObjectNode, set_fn: &str, (min_prop, max_prop): (&str, &str)) {
  let min = node.int_prop(min_prop).unwrap_or(0);
  let max = node.int_prop(max_prop).unwrap_or(100);
  if min != 0 || max != 100 {
    code.call_object_function(set_fn, &[&min.to_string(), &max.to_string()]);
  }
}

/// Integer `value` property of a ranged widget.
struct Ranged {
  set_fn: &'static str,
  get_fn: &'static str,
  animated: bool,
  two_way: bool,
}

impl Ranged {
  const SLIDER: Ranged = Ranged {
    set_fn: "lv_slider_set_value",
    get_fn: "lv_slider_get_value",
    animated: true,
    two_way: true,
  };
  const BAR: Ranged = Ranged {
    set_fn: "lv_bar_set_value",
    get_fn: "lv_bar_get_value",
    animated: true,
    two_way: false,
  };
  const ARC: Ranged = Ranged {
    set_fn: "lv_arc_set_value",
    get_fn: "lv_arc_get_value",
    animated: false,
    two_way: true,
  };
}

fn value<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode, ranged: Ranged) {
  let anim = node.bool_prop("enableAnimation").unwrap_or(false);
  let anim = ranged
    .animated
    .then(|| code.constant(if anim { "LV_ANIM_ON" } else { "LV_ANIM_OFF" }));

  match binding(node, "value") {
    Binding::Value { value, .. } => {
      let value = value.as_i64().unwrap_or(0);
      if value != 0 {
        let value = value.to_string();
        let mut args = vec![value.as_str()];
        args.extend(anim.as_deref());
        code.call_object_function(ranged.set_fn, &args);
      }
    }
    Binding::Variable(variable) => {
      let Ranged {
        set_fn,
        get_fn,
        two_way,
        ..
      } = ranged;
      let tick_variable = variable.clone();
      code.add_to_tick("value", move |code| {
        let new_val = code.eval_integer_property("int32_t", "new_val", &tick_variable);
        let cur_val = code.call_object_function_with_assignment("int32_t", "cur_val", get_fn, &[]);
        code.if_integer_not_equal(&new_val, &cur_val, |code| {
          code.tick_change_start();
          let mut args = vec![new_val.as_str()];
          args.extend(anim.as_deref());
          code.call_object_function(set_fn, &args);
          code.tick_change_end();
        });
      });

      if two_way {
        code.add_event_handler("VALUE_CHANGED", move |code, event, tick_value_change_obj| {
          let ta = code.call_free_function_with_assignment("lv_obj_t *", "ta", "lv_event_get_target", &[event]);
          code.if_integer_not_equal(tick_value_change_obj, &ta, |code| {
            let value = code.call_object_function_with_assignment("int32_t", "value", get_fn, &[]);
            code.assign_integer_property("value", &variable, &value);
          });
        });
      }
    }
    Binding::Unset => {}
  }
}

/// Event handlers, flags, states and shared styles.
fn common<C: LvglCode + 'static>(code: &mut C, node: &ObjectNode) {
  for handler in node.array("eventHandlers") {
    let (Some(event), Some(action)) = (handler.str_prop("eventName"), handler.str_prop("action")) else {
      continue;
    };
    if action.is_empty() || handler.str_prop("handlerType").is_some_and(|t| t != "action") {
      continue;
    }
    let function = action_function(action);

    match event {
      "CHECKED" | "UNCHECKED" => {
        let checked = event == "CHECKED";
        code.add_event_handler("VALUE_CHANGED", move |code, event, _| {
          let state = code.constant("LV_STATE_CHECKED");
          let has_state = code.call_object_function_inline("lv_obj_has_state", &[&state]);
          let expected = code.boolean(checked);
          code.if_condition(&format!("{has_state} == {expected}"), |code| {
            code.call_free_function(&function, &[event]);
          });
        });
      }
      _ => code.add_event_handler(event, move |code, event, _| {
        code.call_free_function(&function, &[event]);
      }),
    }
  }

  if let Some(flags) = node.str_prop("flags") {
    flag_call(code, "lv_obj_add_flag", "LV_OBJ_FLAG_", flags);
  }
  if let Some(flags) = node.str_prop("clearFlags") {
    flag_call(code, "lv_obj_remove_flag", "LV_OBJ_FLAG_", flags);
  }
  if let Some(states) = node.str_prop("states") {
    flag_call(code, "lv_obj_add_state", "LV_STATE_", states);
  }

  if let Some(style) = node.str_prop("useStyle").filter(|s| !s.is_empty()) {
    let style = format!("styles[\"{}\"]", style_key(style));
    code.call_object_function("lv_obj_add_style", &[&style, "0"]);
  }
}

fn flag_call<C: LvglCode>(code: &mut C, func: &str, prefix: &str, list: &str) {
  let constants: Vec<String> = split_flags(list)
    .map(|flag| code.constant(&format!("{prefix}{flag}")))
    .collect();
  if constants.is_empty() {
    return;
  }
  let refs: Vec<&str> = constants.iter().map(String::as_str).collect();
  let combined = code.or(&refs);
  code.call_object_function(func, &[&combined]);
}

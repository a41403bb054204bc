//! C LVGL names to MicroPython names.
//!
//! Every translation is an explicit table lookup first, then a generic
//! rewrite for anything the table does not know. Nothing here fails.

/// Namespace of the generated bindings.
pub const NS: &str = "lv";

/// Bitwise-or token, shared by C and Python.
pub const OR: &str = " | ";

/// `LV_<prefix>` -> enum group, first match wins.
const ENUM_GROUPS: &[(&str, &str)] = &[
  ("ALIGN_", "ALIGN"),
  ("STATE_", "STATE"),
  ("PART_", "PART"),
  ("OPA_", "OPA"),
  ("FLEX_FLOW_", "FLEX_FLOW"),
  ("FLEX_ALIGN_", "FLEX_ALIGN"),
  ("GRID_ALIGN_", "GRID_ALIGN"),
  ("DIR_", "DIR"),
  ("BASE_DIR_", "BASE_DIR"),
  ("TEXT_ALIGN_", "TEXT_ALIGN"),
  ("BORDER_SIDE_", "BORDER_SIDE"),
  ("GRAD_DIR_", "GRAD_DIR"),
  ("SCROLLBAR_MODE_", "SCROLLBAR_MODE"),
  ("SCROLL_SNAP_", "SCROLL_SNAP"),
  ("ANIM_", "ANIM"),
  ("BLEND_MODE_", "BLEND_MODE"),
  ("SCR_LOAD_ANIM_", "SCR_LOAD_ANIM"),
  ("EVENT_", "EVENT"),
  ("KEY_", "KEY"),
  ("LABEL_LONG_", "LABEL_LONG"),
  ("ARC_MODE_", "ARC_MODE"),
  ("BAR_MODE_", "BAR_MODE"),
  ("BTNMATRIX_CTRL_", "BUTTONMATRIX_CTRL"),
  ("CHART_TYPE_", "CHART_TYPE"),
  ("CHART_UPDATE_MODE_", "CHART_UPDATE_MODE"),
  ("CHART_AXIS_", "CHART_AXIS"),
  ("COLORWHEEL_MODE_", "COLORWHEEL_MODE"),
  ("IMG_SIZE_MODE_", "IMAGE_SIZE_MODE"),
  ("KEYBOARD_MODE_", "KEYBOARD_MODE"),
  ("MENU_HEADER_", "MENU_HEADER"),
  ("ROLLER_MODE_", "ROLLER_MODE"),
  ("SLIDER_MODE_", "SLIDER_MODE"),
  ("SPAN_MODE_", "SPAN_MODE"),
  ("SPAN_OVERFLOW_", "SPAN_OVERFLOW"),
  ("TABLE_CELL_CTRL_", "TABLE_CELL_CTRL"),
  ("TEXTAREA_", "TEXTAREA"),
];

/// Constants that are plain module attributes rather than enum members.
const PLAIN_CONSTANTS: &[(&str, &str)] = &[
  ("LV_SIZE_CONTENT", "lv.SIZE_CONTENT"),
  ("LV_RADIUS_CIRCLE", "lv.RADIUS_CIRCLE"),
];

const CREATE_FUNCTIONS: &[(&str, &str)] = &[
  ("lv_obj_create", "lv.obj"),
  ("lv_btn_create", "lv.button"),
  ("lv_label_create", "lv.label"),
  ("lv_img_create", "lv.image"),
  ("lv_arc_create", "lv.arc"),
  ("lv_bar_create", "lv.bar"),
  ("lv_slider_create", "lv.slider"),
  ("lv_switch_create", "lv.switch"),
  ("lv_checkbox_create", "lv.checkbox"),
  ("lv_dropdown_create", "lv.dropdown"),
  ("lv_roller_create", "lv.roller"),
  ("lv_textarea_create", "lv.textarea"),
  ("lv_table_create", "lv.table"),
  ("lv_chart_create", "lv.chart"),
  ("lv_canvas_create", "lv.canvas"),
  ("lv_calendar_create", "lv.calendar"),
  ("lv_keyboard_create", "lv.keyboard"),
  ("lv_list_create", "lv.list"),
  ("lv_menu_create", "lv.menu"),
  ("lv_msgbox_create", "lv.msgbox"),
  ("lv_spinner_create", "lv.spinner"),
  ("lv_spinbox_create", "lv.spinbox"),
  ("lv_tabview_create", "lv.tabview"),
  ("lv_tileview_create", "lv.tileview"),
  ("lv_win_create", "lv.win"),
  ("lv_colorwheel_create", "lv.colorwheel"),
  ("lv_led_create", "lv.led"),
  ("lv_meter_create", "lv.meter"),
  ("lv_span_create", "lv.span"),
  ("lv_spangroup_create", "lv.spangroup"),
  ("lv_btnmatrix_create", "lv.buttonmatrix"),
  ("lv_line_create", "lv.line"),
  ("lv_scale_create", "lv.scale"),
  ("lv_imagebutton_create", "lv.imagebutton"),
  ("lv_animimg_create", "lv.animimg"),
];

/// Widget-type prefixes stripped from object function names, in match order.
const METHOD_PREFIXES: &[&str] = &[
  "obj_",
  "label_",
  "btn_",
  "img_",
  "arc_",
  "bar_",
  "slider_",
  "switch_",
  "checkbox_",
  "dropdown_",
  "roller_",
  "textarea_",
  "table_",
  "chart_",
  "canvas_",
  "calendar_",
  "keyboard_",
  "list_",
  "menu_",
  "msgbox_",
  "spinner_",
  "spinbox_",
  "tabview_",
  "tileview_",
  "win_",
  "colorwheel_",
  "led_",
  "meter_",
  "span_",
  "spangroup_",
  "btnmatrix_",
  "line_",
  "scale_",
  "imagebutton_",
  "animimg_",
  "style_",
  "image_",
  "button_",
  "buttonmatrix_",
];

const FREE_FUNCTIONS: &[(&str, &str)] = &[
  ("lv_scr_load", "lv.screen_load"),
  ("lv_scr_load_anim", "lv.screen_load_anim"),
  ("lv_scr_act", "lv.screen_active"),
  ("lv_layer_top", "lv.layer_top"),
  ("lv_layer_sys", "lv.layer_sys"),
  ("lv_disp_get_default", "lv.display.get_default"),
  ("lv_theme_default_init", "lv.theme_default_init"),
  ("lv_color_hex", "lv.color_hex"),
  ("lv_color_make", "lv.color_make"),
  ("lv_color_white", "lv.color_white"),
  ("lv_color_black", "lv.color_black"),
  ("lv_pct", "lv.pct"),
  ("lv_anim_init", "lv.anim_t"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
  table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// `lv_foo` -> `lv.foo`; anything else unchanged.
fn dotted(name: &str) -> String {
  match name.strip_prefix("lv_") {
    Some(rest) => format!("{NS}.{rest}"),
    None => name.to_string(),
  }
}

/// Python attribute names cannot start with a digit (`LV_OPA_50`).
fn member(value: &str) -> String {
  if value.starts_with(|c: char| c.is_ascii_digit()) {
    format!("_{value}")
  } else {
    value.to_string()
  }
}

fn translate_token(token: &str) -> String {
  if let Some(plain) = lookup(PLAIN_CONSTANTS, token) {
    return plain.to_string();
  }
  let Some(rest) = token.strip_prefix("LV_") else {
    return token.to_string();
  };

  for (prefix, group) in ENUM_GROUPS {
    if let Some(value) = rest.strip_prefix(prefix) {
      return format!("{NS}.{group}.{}", member(value));
    }
  }

  match rest.split_once('_') {
    Some((group, value)) => format!("{NS}.{group}.{}", member(value)),
    None => format!("{NS}.{rest}"),
  }
}

/// Translate a C constant expression, element-wise across ` | `.
///
/// ```
/// use studio_build_lib::codegen::tables::translate_constant;
///
/// assert_eq!(translate_constant("LV_ALIGN_CENTER"), "lv.ALIGN.CENTER");
/// assert_eq!(translate_constant("LV_FOO_BAR_BAZ"), "lv.FOO.BAR_BAZ");
/// ```
pub fn translate_constant(constant: &str) -> String {
  constant
    .split('|')
    .map(|token| translate_token(token.trim()))
    .collect::<Vec<_>>()
    .join(OR)
}

/// Constructor for a `lv_*_create` function.
pub fn create_function(func: &str) -> String {
  if let Some(class) = lookup(CREATE_FUNCTIONS, func) {
    return class.to_string();
  }
  match func.strip_prefix("lv_").and_then(|rest| rest.strip_suffix("_create")) {
    Some(kind) if !kind.is_empty() => format!("{NS}.{kind}"),
    _ => func.to_string(),
  }
}

/// Getter used as a child lookup (`lv_tabview_get_content` -> `lv.tabview_get_content`).
pub fn get_function(func: &str) -> String {
  dotted(func)
}

/// Method name for an object function (`lv_obj_set_pos` -> `set_pos`).
pub fn method_name(func: &str) -> String {
  let without_ns = func.strip_prefix("lv_").unwrap_or(func);
  METHOD_PREFIXES
    .iter()
    .find_map(|prefix| without_ns.strip_prefix(prefix))
    .unwrap_or(without_ns)
    .to_string()
}

/// Module-level function for a free C function.
pub fn free_function(func: &str) -> String {
  match lookup(FREE_FUNCTIONS, func) {
    Some(name) => name.to_string(),
    None => dotted(func),
  }
}

//! LVGL projects: widget lowering and the generated MicroPython program.

mod generate;
pub mod widgets;

pub use generate::generate_micropython;

//! studio-build-lib: the project build pipeline
//!
//! This crate turns a project file into build outputs:
//! - `project`: the project document, typed settings plus a generic object tree
//! - `build`: per-configuration orchestration, sub-builders and file emission
//! - `template`: section markers in build file templates
//! - `check`: memoized validation and debounced background checking
//! - `codegen` / `lvgl`: lowering LVGL widget builds to MicroPython
//! - `output`: the diagnostics store shared by all of the above

pub mod build;
pub mod check;
pub mod codegen;
pub mod config;
pub mod consts;
pub mod lvgl;
pub mod output;
pub mod project;
pub mod template;
pub mod util;

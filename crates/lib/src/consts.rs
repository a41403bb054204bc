//! Crate-wide constants: part names, file extensions and placeholder tokens.

pub const APP_NAME: &str = "studio-build";

/// Number of hex characters kept from a SHA-256 digest for content stamps.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Configuration name used when a project declares no build configurations.
pub const DEFAULT_CONFIGURATION: &str = "default";

/// Token in a build file name expanded once per declared configuration.
pub const CONFIGURATION_PLACEHOLDER: &str = "<configuration>";

pub const PROJECT_EXTENSION: &str = ".eez-project";
pub const DASHBOARD_EXTENSION: &str = ".eez-dashboard";
pub const PROJECT_BUILD_EXTENSION: &str = ".eez-project-build";
pub const APPLET_EXTENSION: &str = ".app";
pub const RESOURCE_EXTENSION: &str = ".res";
pub const MAP_EXTENSION: &str = ".map";
pub const PYTHON_EXTENSION: &str = ".py";

/// Well-known part names produced by the sub-builders.
pub mod parts {
  pub const GUI_ASSETS_DATA: &str = "GUI_ASSETS_DATA";
  pub const GUI_ASSETS_DATA_MAP: &str = "GUI_ASSETS_DATA_MAP";
  pub const GUI_ASSETS_DECL: &str = "GUI_ASSETS_DECL";
  pub const GUI_ASSETS_DEF: &str = "GUI_ASSETS_DEF";
  pub const GUI_PAGES_ENUM: &str = "GUI_PAGES_ENUM";
  pub const GUI_STYLES_ENUM: &str = "GUI_STYLES_ENUM";
  pub const GUI_FONTS_ENUM: &str = "GUI_FONTS_ENUM";
  pub const GUI_BITMAPS_ENUM: &str = "GUI_BITMAPS_ENUM";
  pub const SCPI_COMMANDS_DECL: &str = "SCPI_COMMANDS_DECL";
  pub const SCPI_COMMANDS: &str = "SCPI_COMMANDS";
  pub const MICROPYTHON_CODE: &str = "MICROPYTHON_CODE";
}

//! GUI assets: ID enums and the packed assets blob.
//!
//! The blob layout is `EZAS`, the little-endian u32 length of the payload,
//! then the zlib-compressed compact JSON of every page, style, font and
//! bitmap used by the active configuration.

use std::collections::BTreeSet;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::{BuildCtx, SubBuilder};
use crate::build::BuildError;
use crate::build::parts::{BuildResult, PartValue};
use crate::consts::parts::*;
use crate::output::{MessageKind, Section};
use crate::project::{ObjectNode, Project};
use crate::util::naming::{NamingConvention, TAB, dump_data, get_name};

pub const ASSETS_MAGIC: &[u8; 4] = b"EZAS";

/// Property names through which a widget refers to each asset kind.
const BITMAP_REFS: &[&str] = &["bitmap", "image"];
const FONT_REFS: &[&str] = &["font"];
const STYLE_REFS: &[&str] = &["style", "useStyle", "inheritFrom"];

pub struct AssetsBuilder;

/// Objects of one configuration, in project order.
#[derive(Serialize)]
struct Assets<'a> {
  pages: Vec<&'a ObjectNode>,
  styles: Vec<&'a ObjectNode>,
  fonts: Vec<&'a ObjectNode>,
  bitmaps: Vec<&'a ObjectNode>,
}

/// Objects without `usedIn` belong to every configuration.
fn used_in(node: &ObjectNode, configuration: Option<&str>) -> bool {
  let (Some(configuration), Some(used_in)) = (configuration, node.properties.get("usedIn")) else {
    return true;
  };
  match used_in.as_array() {
    Some(names) => names.iter().any(|n| n.as_str() == Some(configuration)),
    None => true,
  }
}

impl<'a> Assets<'a> {
  fn collect(project: &'a Project, configuration: Option<&str>) -> Self {
    let pick = |slot: &str| -> Vec<&'a ObjectNode> {
      project
        .root
        .array(slot)
        .iter()
        .filter(|n| used_in(n, configuration))
        .collect()
    };
    Self {
      pages: pick("pages"),
      styles: pick("styles"),
      fonts: pick("fonts"),
      bitmaps: pick("bitmaps"),
    }
  }

  /// Names referenced through any of `keys` anywhere under the pages and styles.
  fn referenced(&self, keys: &[&str]) -> BTreeSet<String> {
    self
      .pages
      .iter()
      .chain(self.styles.iter())
      .flat_map(|root| root.walk())
      .flat_map(|node| keys.iter().filter_map(move |k| node.str_prop(k)))
      .map(str::to_string)
      .collect()
  }

  fn report_unused(&self, ctx: &BuildCtx<'_>) {
    let styles = self.referenced(STYLE_REFS);
    let fonts = self.referenced(FONT_REFS);
    let bitmaps = self.referenced(BITMAP_REFS);

    let groups: [(&str, &Vec<&ObjectNode>, &BTreeSet<String>); 3] = [
      ("style", &self.styles, &styles),
      ("font", &self.fonts, &fonts),
      ("bitmap", &self.bitmaps, &bitmaps),
    ];
    for (kind, objects, used) in groups {
      for object in objects {
        let name = object.str_prop("name").unwrap_or_default();
        if !used.contains(name) {
          ctx.output.write(
            Section::Output,
            MessageKind::Info,
            format!("Unused {kind}: {name}"),
            Some(object.id.clone()),
          );
        }
      }
    }
  }
}

fn build_enum(enum_name: &str, prefix: &str, objects: &[&ObjectNode]) -> String {
  let mut members = vec![format!("{TAB}{prefix}NONE = 0")];
  members.extend(objects.iter().enumerate().map(|(i, object)| {
    let name = object.str_prop("name").unwrap_or_default();
    format!(
      "{TAB}{} = {}",
      get_name(prefix, name, NamingConvention::UnderscoreUpperCase),
      i + 1
    )
  }));
  format!("enum {enum_name} {{\n{}\n}};", members.join(",\n"))
}

/// Pack the assets into the blob; returns the blob and its uncompressed size.
fn pack(assets: &Assets<'_>) -> Result<(Vec<u8>, usize), BuildError> {
  let payload = serde_json::to_vec(assets)?;

  let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
  encoder.write_all(&payload)?;
  let compressed = encoder.finish()?;

  let length = u32::try_from(payload.len()).map_err(|_| BuildError::build("Assets are too large to pack."))?;

  let mut blob = Vec::with_capacity(compressed.len() + 8);
  blob.extend_from_slice(ASSETS_MAGIC);
  blob.extend_from_slice(&length.to_le_bytes());
  blob.extend_from_slice(&compressed);
  Ok((blob, payload.len()))
}

fn build_map(assets: &Assets<'_>, configuration: Option<&str>, blob_len: usize, payload_len: usize) -> String {
  let entries = |objects: &[&ObjectNode]| -> Vec<serde_json::Value> {
    objects
      .iter()
      .enumerate()
      .map(|(index, o)| json!({ "index": index, "name": o.str_prop("name"), "id": o.id }))
      .collect()
  };
  let map = json!({
    "configuration": configuration,
    "size": blob_len,
    "uncompressedSize": payload_len,
    "pages": entries(&assets.pages),
    "styles": entries(&assets.styles),
    "fonts": entries(&assets.fonts),
    "bitmaps": entries(&assets.bitmaps),
  });
  // A json! value always serializes.
  serde_json::to_string_pretty(&map).unwrap_or_default()
}

impl SubBuilder for AssetsBuilder {
  fn name(&self) -> &'static str {
    "assets"
  }

  fn applies(&self, _project: &Project) -> bool {
    true
  }

  fn build(&self, project: &Project, ctx: &BuildCtx<'_>) -> Result<BuildResult, BuildError> {
    let configuration = ctx.configuration_name();
    let assets = Assets::collect(project, configuration);
    debug!(
      configuration = ?configuration,
      pages = assets.pages.len(),
      styles = assets.styles.len(),
      fonts = assets.fonts.len(),
      bitmaps = assets.bitmaps.len(),
      "collected assets"
    );

    assets.report_unused(ctx);

    let mut result = BuildResult::new();

    let enums = [
      (GUI_PAGES_ENUM, "PagesEnum", "PAGE_ID_", &assets.pages),
      (GUI_STYLES_ENUM, "StylesEnum", "STYLE_ID_", &assets.styles),
      (GUI_FONTS_ENUM, "FontsEnum", "FONT_ID_", &assets.fonts),
      (GUI_BITMAPS_ENUM, "BitmapsEnum", "BITMAP_ID_", &assets.bitmaps),
    ];
    for (part, enum_name, prefix, objects) in enums {
      if ctx.wants(part) {
        result.insert(part.to_string(), build_enum(enum_name, prefix, objects).into());
      }
    }

    let data_parts = [GUI_ASSETS_DATA, GUI_ASSETS_DATA_MAP, GUI_ASSETS_DECL, GUI_ASSETS_DEF];
    if data_parts.iter().any(|p| ctx.wants(p)) {
      let (blob, payload_len) = pack(&assets)?;

      if ctx.wants(GUI_ASSETS_DECL) {
        result.insert(
          GUI_ASSETS_DECL.to_string(),
          format!("extern const uint8_t assets[{}];", blob.len()).into(),
        );
      }
      if ctx.wants(GUI_ASSETS_DEF) {
        result.insert(
          GUI_ASSETS_DEF.to_string(),
          format!(
            "// ASSETS DEFINITION\nconst uint8_t assets[{}] = {{{}}};",
            blob.len(),
            dump_data(&blob)
          )
          .into(),
        );
      }
      if ctx.wants(GUI_ASSETS_DATA_MAP) {
        result.insert(
          GUI_ASSETS_DATA_MAP.to_string(),
          build_map(&assets, configuration, blob.len(), payload_len).into(),
        );
      }
      if ctx.wants(GUI_ASSETS_DATA) {
        result.insert(GUI_ASSETS_DATA.to_string(), PartValue::Bytes(blob));
      }
    }

    Ok(result)
  }
}

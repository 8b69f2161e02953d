//! Per-render registry accumulating requested resources.
//!
//! A [`Registry`] is created once per page render from a shared
//! [`Manifest`], mutated by any number of uncoordinated callers while the
//! page is being built, and consumed once for the header and once for the
//! footer. It is deliberately unsynchronized; concurrent renders each get
//! their own instance while sharing the read-only manifest.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::manifest::{AttributeMap, Location, Manifest};
use crate::models::{AssetTag, HeaderBundle, ScriptRecord};
use crate::resolver::{resolve_script, resolve_style};

/// Mutable per-render state: requested resource names plus direct
/// manifest-bypassing injections.
#[derive(Debug)]
pub struct Registry<'m> {
  manifest: &'m Manifest,
  build: String,
  scripts: Vec<String>,
  styles: Vec<String>,
  direct_header_scripts: IndexMap<String, AssetTag>,
  direct_footer_scripts: IndexMap<String, AssetTag>,
  direct_styles: IndexMap<String, AssetTag>,
}

impl<'m> Registry<'m> {
  /// Create a registry for one page render, seeded from the manifest's
  /// default script and style name lists.
  pub fn new(manifest: &'m Manifest) -> Self {
    Self {
      build: manifest.build_version(),
      scripts: manifest.scripts.clone(),
      styles: manifest.styles.clone(),
      direct_header_scripts: IndexMap::new(),
      direct_footer_scripts: IndexMap::new(),
      direct_styles: IndexMap::new(),
      manifest,
    }
  }

  /// Cache-busting suffix appended to local manifest-resolved paths.
  ///
  /// Directly-injected resources are responsible for their own versioning;
  /// templates can use this accessor to apply the same suffix.
  pub fn build_version(&self) -> &str {
    &self.build
  }

  /// Request scripts by manifest name.
  ///
  /// Names are not validated here; a name missing from the manifest drops
  /// silently at resolution so optional components can register resources
  /// they may not ship.
  pub fn add_scripts<I, S>(&mut self, names: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    for name in names {
      let name = name.into();
      trace!(name = %name, "script requested");
      self.scripts.push(name);
    }
    self
  }

  /// Request styles by manifest name.
  pub fn add_styles<I, S>(&mut self, names: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    for name in names {
      let name = name.into();
      trace!(name = %name, "style requested");
      self.styles.push(name);
    }
    self
  }

  /// Drop the first matching occurrence of each given script name.
  ///
  /// Removing a name that was never requested is a no-op.
  pub fn remove_scripts<I, S>(&mut self, names: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for name in names {
      remove_first(&mut self.scripts, name.as_ref());
    }
    self
  }

  /// Drop the first matching occurrence of each given style name.
  pub fn remove_styles<I, S>(&mut self, names: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for name in names {
      remove_first(&mut self.styles, name.as_ref());
    }
    self
  }

  /// Inject a literal script source, bypassing the manifest.
  ///
  /// The source is normalized (trimmed, one leading slash stripped) and
  /// used as the dedup key; re-injecting the same normalized path keeps
  /// the first record.
  pub fn add_script_directly(
    &mut self,
    source: &str,
    location: Location,
    attributes: AttributeMap,
  ) -> &mut Self {
    let key = normalize_source(source);
    let slot = match location {
      Location::Header => &mut self.direct_header_scripts,
      Location::Footer => &mut self.direct_footer_scripts,
    };
    if slot.contains_key(&key) {
      debug!(source = %key, "script already injected, keeping the first record");
    } else {
      slot.insert(key.clone(), AssetTag {
        src: key,
        attributes,
      });
    }
    self
  }

  /// Inject a literal stylesheet source, bypassing the manifest.
  pub fn add_style_directly(&mut self, source: &str, attributes: AttributeMap) -> &mut Self {
    let key = normalize_source(source);
    if self.direct_styles.contains_key(&key) {
      debug!(source = %key, "style already injected, keeping the first record");
    } else {
      self.direct_styles.insert(key.clone(), AssetTag {
        src: key,
        attributes,
      });
    }
    self
  }

  /// Remove direct injections by normalized source path.
  ///
  /// With a location the key is removed from that script collection only;
  /// without one it is removed from both. The flat style collection has no
  /// location axis and is always cleared of the key.
  pub fn remove_direct<I, S>(&mut self, sources: I, location: Option<Location>) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    for source in sources {
      let key = normalize_source(source.as_ref());
      match location {
        Some(Location::Header) => {
          self.direct_header_scripts.shift_remove(&key);
        }
        Some(Location::Footer) => {
          self.direct_footer_scripts.shift_remove(&key);
        }
        None => {
          self.direct_header_scripts.shift_remove(&key);
          self.direct_footer_scripts.shift_remove(&key);
        }
      }
      self.direct_styles.shift_remove(&key);
    }
    self
  }

  /// Resolve the requested scripts into ordered render records.
  ///
  /// Names deduplicate to their first occurrence before resolution. With a
  /// location only matching descriptors resolve and only that location's
  /// direct injections append; without one everything resolves and header
  /// injections precede footer injections. A resolved script that requires
  /// a style registers that name for the next style pass.
  pub fn get_scripts(&mut self, location: Option<Location>) -> Vec<ScriptRecord> {
    let mut records = Vec::new();
    let mut required_styles = Vec::new();

    for name in dedup_preserving_order(&self.scripts) {
      let Some(descriptor) = self.manifest.script(&name) else {
        trace!(name = %name, "skipping script missing from the manifest");
        continue;
      };

      let resolution = resolve_script(descriptor, location, self.manifest.offline, &self.build);
      if resolution.requires_style {
        required_styles.push(name);
      }
      records.extend(resolution.records);
    }

    if !required_styles.is_empty() {
      debug!(count = required_styles.len(), "scripts registered companion styles");
      self.styles.extend(required_styles);
    }

    match location {
      Some(Location::Header) => append_direct(&mut records, &self.direct_header_scripts),
      Some(Location::Footer) => append_direct(&mut records, &self.direct_footer_scripts),
      None => {
        append_direct(&mut records, &self.direct_header_scripts);
        append_direct(&mut records, &self.direct_footer_scripts);
      }
    }

    records
  }

  /// Resolve the requested styles into ordered tag records.
  ///
  /// `extra` names merge in after everything already requested, letting a
  /// page type append its base bundle behind feature-specific styles.
  /// Direct style injections always come last.
  pub fn get_styles(&mut self, extra: &[&str]) -> Vec<AssetTag> {
    self.add_styles(extra.iter().copied());

    let mut records = Vec::new();
    for name in dedup_preserving_order(&self.styles) {
      let Some(descriptor) = self.manifest.style(&name) else {
        trace!(name = %name, "skipping style missing from the manifest");
        continue;
      };
      records.extend(resolve_style(descriptor, self.manifest.offline, &self.build));
    }

    records.extend(self.direct_styles.values().cloned());
    records
  }

  /// Resolve everything the page header consumes.
  ///
  /// Header scripts resolve first so that a script's companion style
  /// registered during this pass lands in the same bundle's style list.
  pub fn header_bundle(&mut self, extra_styles: &[&str]) -> HeaderBundle {
    let scripts = self.get_scripts(Some(Location::Header));
    let styles = self.get_styles(extra_styles);
    HeaderBundle { styles, scripts }
  }

  /// Resolve the scripts placed at the end of the body.
  pub fn footer_bundle(&mut self) -> Vec<ScriptRecord> {
    self.get_scripts(Some(Location::Footer))
  }

  /// The manifest this registry resolves against.
  pub fn manifest(&self) -> &'m Manifest {
    self.manifest
  }
}

/// Normalize a directly-injected source path: trim surrounding whitespace
/// and strip one leading slash.
fn normalize_source(source: &str) -> String {
  let trimmed = source.trim();
  trimmed.strip_prefix('/').unwrap_or(trimmed).to_string()
}

fn remove_first(names: &mut Vec<String>, name: &str) {
  if let Some(index) = names.iter().position(|existing| existing == name) {
    names.remove(index);
  }
}

fn dedup_preserving_order(names: &[String]) -> Vec<String> {
  let mut seen = BTreeSet::new();
  let mut unique = Vec::new();
  for name in names {
    if seen.insert(name.clone()) {
      unique.push(name.clone());
    }
  }
  unique
}

fn append_direct(records: &mut Vec<ScriptRecord>, direct: &IndexMap<String, AssetTag>) {
  records.extend(direct.values().cloned().map(ScriptRecord::Tag));
}

#[cfg(test)]
mod tests {
  use super::*;

  fn manifest() -> Manifest {
    Manifest::from_json(
      r#"{
        "resources": {
          "scripts": {
            "app": {"local": "/js/app.js", "location": "footer", "includeStyle": true},
            "modernizr": {"local": "/vendor/modernizr.min.js", "location": "header"},
            "jquery": {
              "useCdn": true,
              "location": "footer",
              "local": "/js/jquery.js",
              "cdn": "//cdn.example.com/jquery.min.js",
              "attributes": {"integrity": "sha384-abc", "crossorigin": "anonymous"}
            },
            "analytics": {"local": "/js/analytics.js", "location": "header", "includeStyle": true}
          },
          "styles": {
            "app": {"local": "/css/app.css"},
            "core": {"local": "/css/core.css"},
            "analytics": {"local": "/css/analytics.css"}
          }
        }
      }"#,
    )
    .expect("fixture manifest should parse")
  }

  fn script_sources(records: &[ScriptRecord]) -> Vec<String> {
    records
      .iter()
      .filter_map(ScriptRecord::as_tag)
      .map(|tag| tag.src.clone())
      .collect()
  }

  fn style_sources(records: &[AssetTag]) -> Vec<String> {
    records.iter().map(|tag| tag.src.clone()).collect()
  }

  #[test]
  fn repeated_requests_resolve_once() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app"]);
    registry.add_scripts(["app"]);

    let records = registry.get_scripts(None);
    assert_eq!(script_sources(&records), ["/js/app.js"]);
  }

  #[test]
  fn first_seen_order_survives_deduplication() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app", "modernizr", "app", "jquery"]);

    let records = registry.get_scripts(None);
    assert_eq!(script_sources(&records), [
      "/js/app.js",
      "/vendor/modernizr.min.js",
      "//cdn.example.com/jquery.min.js",
    ]);
  }

  #[test]
  fn unknown_names_drop_silently() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app", "not-in-manifest"]);

    let records = registry.get_scripts(None);
    assert_eq!(script_sources(&records), ["/js/app.js"]);
  }

  #[test]
  fn removal_takes_the_first_occurrence_and_tolerates_absent_names() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app", "modernizr", "app"]);
    registry.remove_scripts(["app", "never-added"]);

    let records = registry.get_scripts(None);
    assert_eq!(script_sources(&records), [
      "/vendor/modernizr.min.js",
      "/js/app.js",
    ]);
  }

  #[test]
  fn seeds_come_from_the_manifest_lists() {
    let manifest = Manifest::from_json(
      r#"{
        "scripts": ["app"],
        "styles": ["core"],
        "resources": {
          "scripts": {"app": {"local": "/js/app.js"}},
          "styles": {"core": {"local": "/css/core.css"}}
        }
      }"#,
    )
    .unwrap();

    let mut registry = Registry::new(&manifest);
    assert_eq!(script_sources(&registry.get_scripts(None)), ["/js/app.js"]);
    assert_eq!(style_sources(&registry.get_styles(&[])), ["/css/core.css"]);
  }

  #[test]
  fn location_filter_partitions_scripts() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app", "modernizr"]);

    let header = registry.get_scripts(Some(Location::Header));
    assert_eq!(script_sources(&header), ["/vendor/modernizr.min.js"]);

    let footer = registry.get_scripts(Some(Location::Footer));
    assert_eq!(script_sources(&footer), ["/js/app.js"]);
  }

  #[test]
  fn direct_injection_is_idempotent_and_normalizes_the_key() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_script_directly("/js/x.js", Location::Footer, AttributeMap::new());
    registry.add_script_directly(" js/x.js ", Location::Footer, AttributeMap::new());

    let records = registry.get_scripts(Some(Location::Footer));
    assert_eq!(script_sources(&records), ["js/x.js"]);
  }

  #[test]
  fn direct_injection_keeps_the_first_record() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);

    let mut first = AttributeMap::new();
    first.insert("defer".into(), true.into());
    registry.add_script_directly("/js/x.js", Location::Footer, first);
    registry.add_script_directly("/js/x.js", Location::Footer, AttributeMap::new());

    let records = registry.get_scripts(Some(Location::Footer));
    let tag = records[0].as_tag().unwrap();
    assert!(tag.attributes.contains_key("defer"));
  }

  #[test]
  fn direct_records_follow_manifest_records() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_script_directly("/js/injected.js", Location::Footer, AttributeMap::new());
    registry.add_scripts(["app"]);

    let records = registry.get_scripts(Some(Location::Footer));
    assert_eq!(script_sources(&records), ["/js/app.js", "js/injected.js"]);
  }

  #[test]
  fn unfiltered_queries_append_header_directs_before_footer_directs() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_script_directly("/js/foot.js", Location::Footer, AttributeMap::new());
    registry.add_script_directly("/js/head.js", Location::Header, AttributeMap::new());

    let records = registry.get_scripts(None);
    assert_eq!(script_sources(&records), ["js/head.js", "js/foot.js"]);
  }

  #[test]
  fn remove_direct_clears_the_requested_locations() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_script_directly("/js/x.js", Location::Header, AttributeMap::new());
    registry.add_script_directly("/js/x.js", Location::Footer, AttributeMap::new());

    registry.remove_direct(["/js/x.js"], Some(Location::Header));
    assert!(registry.get_scripts(Some(Location::Header)).is_empty());
    assert_eq!(registry.get_scripts(Some(Location::Footer)).len(), 1);

    registry.remove_direct(["js/x.js"], None);
    assert!(registry.get_scripts(Some(Location::Footer)).is_empty());
  }

  #[test]
  fn remove_direct_also_clears_styles() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_style_directly("/css/x.css", AttributeMap::new());
    registry.remove_direct(["/css/x.css"], None);

    assert!(registry.get_styles(&[]).is_empty());
  }

  #[test]
  fn companion_styles_flow_into_the_next_style_pass() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app"]);

    registry.get_scripts(Some(Location::Footer));
    let styles = registry.get_styles(&[]);
    assert_eq!(style_sources(&styles), ["/css/app.css"]);
  }

  #[test]
  fn filtered_out_scripts_do_not_register_companion_styles() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app"]);

    registry.get_scripts(Some(Location::Header));
    assert!(registry.get_styles(&[]).is_empty());
  }

  #[test]
  fn extra_styles_append_behind_registered_ones() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_styles(["app"]);

    let styles = registry.get_styles(&["core"]);
    assert_eq!(style_sources(&styles), ["/css/app.css", "/css/core.css"]);
  }

  #[test]
  fn direct_styles_always_come_last() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_style_directly("/css/injected.css", AttributeMap::new());
    registry.add_styles(["app"]);

    let styles = registry.get_styles(&["core"]);
    assert_eq!(style_sources(&styles), [
      "/css/app.css",
      "/css/core.css",
      "css/injected.css",
    ]);
  }

  #[test]
  fn header_bundle_sees_companion_styles_from_header_scripts() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["analytics"]);

    let bundle = registry.header_bundle(&["core"]);
    assert_eq!(script_sources(&bundle.scripts), ["/js/analytics.js"]);
    assert_eq!(style_sources(&bundle.styles), [
      "/css/analytics.css",
      "/css/core.css",
    ]);
  }

  #[test]
  fn build_suffix_applies_to_manifest_resolved_locals_only() {
    let manifest = Manifest::from_json(
      r#"{
        "enableVersion": true,
        "version": "1.0",
        "resources": {
          "scripts": {"app": {"local": "/js/app.js"}}
        }
      }"#,
    )
    .unwrap();

    let mut registry = Registry::new(&manifest);
    assert_eq!(registry.build_version(), "?v=1.0");
    registry.add_scripts(["app"]);
    registry.add_script_directly("/js/raw.js", Location::Footer, AttributeMap::new());

    let records = registry.get_scripts(Some(Location::Footer));
    assert_eq!(script_sources(&records), ["/js/app.js?v=1.0", "js/raw.js"]);
  }

  #[test]
  fn offline_render_end_to_end() {
    let manifest = Manifest::from_json(
      r#"{
        "offline": true,
        "scripts": ["modernizr", "app"],
        "resources": {
          "scripts": {
            "modernizr": {"location": "header", "local": "/vendor/modernizr.min.js"},
            "app": {"location": "footer", "local": "/js/app.js"}
          }
        }
      }"#,
    )
    .unwrap();

    let mut registry = Registry::new(&manifest);

    let header = registry.get_scripts(Some(Location::Header));
    assert_eq!(header.len(), 1);
    let tag = header[0].as_tag().unwrap();
    assert_eq!(tag.src, "/vendor/modernizr.min.js");
    assert!(tag.attributes.is_empty());

    let footer = registry.get_scripts(Some(Location::Footer));
    assert_eq!(script_sources(&footer), ["/js/app.js"]);
  }

  #[test]
  fn queries_are_repeatable() {
    let manifest = manifest();
    let mut registry = Registry::new(&manifest);
    registry.add_scripts(["app", "app"]);

    let first = registry.get_scripts(Some(Location::Footer));
    let second = registry.get_scripts(Some(Location::Footer));
    assert_eq!(first, second);
  }
}

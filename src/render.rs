//! Markup assembly for header and footer asset bundles.
//!
//! The templating layer can consume [`Registry`](crate::Registry) records
//! directly, or use these helpers to emit finished markup: one tag per
//! line, with fallback records rendered as the inline CDN-failure guard.

use tracing::debug;

use crate::html::{script_tag, style_tag};
use crate::manifest::{AttributeMap, AttributeValue, Manifest};
use crate::models::{CdnFallback, HeaderBundle, ScriptRecord};
use crate::registry::Registry;
use crate::resolver::selected_sources;

/// Render the `<head>` portion of a page's asset markup: style tags
/// followed by header script tags and any fallback guards.
pub fn header_markup(registry: &mut Registry<'_>, extra_styles: &[&str]) -> String {
  let HeaderBundle { styles, scripts } = registry.header_bundle(extra_styles);
  debug!(
    styles = styles.len(),
    scripts = scripts.len(),
    "rendering header bundle"
  );

  let mut lines = Vec::new();
  for style in &styles {
    push_line(&mut lines, style_tag(&style.src, &style.attributes));
  }
  append_script_lines(&mut lines, &scripts);
  lines.join("\n")
}

/// Render the end-of-body portion of a page's asset markup.
pub fn footer_markup(registry: &mut Registry<'_>) -> String {
  let scripts = registry.footer_bundle();
  debug!(scripts = scripts.len(), "rendering footer bundle");

  let mut lines = Vec::new();
  append_script_lines(&mut lines, &scripts);
  lines.join("\n")
}

/// Inline guard that loads the local copy when the CDN global is absent.
pub fn fallback_snippet(fallback: &CdnFallback) -> String {
  format!(
    "<script>window.{global} || document.write('<script src=\"{url}\"><\\/script>')</script>",
    global = fallback.global,
    url = fallback.fallback_url,
  )
}

/// Render one named script to markup, outside the bundle passes.
///
/// The resource keeps its CDN/offline selection and build suffix but is
/// emitted with a lone `hidden` class instead of its descriptor
/// attributes. Unknown names yield `None`.
pub fn script_html(manifest: &Manifest, name: &str) -> Option<String> {
  item_html(manifest, name, TagKind::Script)
}

/// Render one named stylesheet to markup, outside the bundle passes.
pub fn style_html(manifest: &Manifest, name: &str) -> Option<String> {
  item_html(manifest, name, TagKind::Style)
}

enum TagKind {
  Script,
  Style,
}

fn item_html(manifest: &Manifest, name: &str, kind: TagKind) -> Option<String> {
  let descriptor = match kind {
    TagKind::Script => manifest.script(name),
    TagKind::Style => manifest.style(name),
  }?;

  let using_cdn = descriptor.use_cdn && !manifest.offline;
  let build = manifest.build_version();

  let mut attributes = AttributeMap::new();
  attributes.insert(
    "class".to_string(),
    AttributeValue::Text("hidden".to_string()),
  );

  let mut html = String::new();
  for path in selected_sources(descriptor, using_cdn).as_slice() {
    if path.is_empty() {
      continue;
    }
    let src = if using_cdn {
      path.clone()
    } else {
      format!("{path}{build}")
    };
    html.push_str(&match kind {
      TagKind::Script => script_tag(&src, &attributes),
      TagKind::Style => style_tag(&src, &attributes),
    });
  }

  Some(html)
}

fn append_script_lines(lines: &mut Vec<String>, records: &[ScriptRecord]) {
  for record in records {
    match record {
      ScriptRecord::Tag(tag) => push_line(lines, script_tag(&tag.src, &tag.attributes)),
      ScriptRecord::Fallback(fallback) => push_line(lines, fallback_snippet(fallback)),
    }
  }
}

fn push_line(lines: &mut Vec<String>, line: String) {
  if !line.is_empty() {
    lines.push(line);
  }
}

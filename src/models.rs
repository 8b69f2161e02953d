//! Data structures produced while resolving page assets.

use crate::manifest::AttributeMap;

/// A plain renderable tag record: one source plus its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetTag {
  /// Source path or URL emitted on the tag.
  pub src: String,
  /// Attributes attached to the tag.
  pub attributes: AttributeMap,
}

/// Client-side guard emitted in place of a script tag when a CDN source is
/// declared but resolves empty.
///
/// The render layer turns this into an inline snippet that probes `global`
/// and document-writes a script tag for `fallback_url` when the symbol is
/// absent after the CDN tag failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct CdnFallback {
  /// Global symbol probed by the guard snippet.
  pub global: String,
  /// Local source loaded when the symbol is absent.
  pub fallback_url: String,
}

/// A resolved script render record.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptRecord {
  /// A plain `<script>` tag.
  Tag(AssetTag),
  /// A CDN-failure guard snippet.
  Fallback(CdnFallback),
}

impl ScriptRecord {
  /// The contained tag record, when this is a plain tag.
  pub fn as_tag(&self) -> Option<&AssetTag> {
    match self {
      ScriptRecord::Tag(tag) => Some(tag),
      ScriptRecord::Fallback(_) => None,
    }
  }

  /// The contained fallback record, when this is a guard snippet.
  pub fn as_fallback(&self) -> Option<&CdnFallback> {
    match self {
      ScriptRecord::Tag(_) => None,
      ScriptRecord::Fallback(fallback) => Some(fallback),
    }
  }
}

/// Everything the page header consumes: styles plus header scripts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderBundle {
  /// Resolved stylesheet records, direct injections last.
  pub styles: Vec<AssetTag>,
  /// Resolved header script records.
  pub scripts: Vec<ScriptRecord>,
}

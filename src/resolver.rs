//! Pure resolution of manifest descriptors into render records.
//!
//! Resolution is a function of the descriptor, the manifest-wide offline
//! flag, an optional placement filter, and the cache-busting suffix. It
//! never touches registry state; a script's style requirement is reported
//! back to the caller as data so the registry stays the single mutation
//! point.

use crate::manifest::{AttributeMap, Location, ResourceDescriptor, Sources};
use crate::models::{AssetTag, CdnFallback, ScriptRecord};

/// Outcome of resolving one script descriptor.
#[derive(Debug, Default)]
pub struct ScriptResolution {
  /// Render records emitted for the descriptor.
  pub records: Vec<ScriptRecord>,
  /// True when a style of the same name must also resolve this render.
  pub requires_style: bool,
}

/// Resolve a script descriptor into zero or more render records.
///
/// A `location` filter drops descriptors placed elsewhere. A CDN source
/// that is declared but empty stays empty rather than silently swapping
/// back to local; when that happens for a header-placed script with a
/// declared fallback global, a single [`ScriptRecord::Fallback`] record is
/// emitted instead of a plain tag.
pub fn resolve_script(
  descriptor: &ResourceDescriptor,
  location: Option<Location>,
  offline: bool,
  build: &str,
) -> ScriptResolution {
  if location.is_some_and(|wanted| descriptor.location != wanted) {
    return ScriptResolution::default();
  }

  let using_cdn = descriptor.use_cdn && !offline;
  let mut records: Vec<ScriptRecord> = tag_records(descriptor, using_cdn, build)
    .into_iter()
    .map(ScriptRecord::Tag)
    .collect();

  if using_cdn && records.is_empty() && location == Some(Location::Header) {
    if let Some(global) = &descriptor.fallback_global {
      records.push(ScriptRecord::Fallback(CdnFallback {
        global: global.clone(),
        fallback_url: descriptor
          .local
          .first_path()
          .unwrap_or_default()
          .to_string(),
      }));
    }
  }

  ScriptResolution {
    records,
    requires_style: descriptor.include_style,
  }
}

/// Resolve a style descriptor into zero or more tag records.
///
/// Styles have no placement axis and never produce fallback records.
pub fn resolve_style(descriptor: &ResourceDescriptor, offline: bool, build: &str) -> Vec<AssetTag> {
  let using_cdn = descriptor.use_cdn && !offline;
  tag_records(descriptor, using_cdn, build)
}

/// Selected source paths for a descriptor under the given CDN preference.
pub(crate) fn selected_sources(descriptor: &ResourceDescriptor, using_cdn: bool) -> &Sources {
  if using_cdn {
    &descriptor.cdn
  } else {
    &descriptor.local
  }
}

/// One tag record per non-empty selected path.
///
/// Descriptor attributes attach only to CDN-sourced records; local paths
/// carry the cache-busting suffix instead.
fn tag_records(descriptor: &ResourceDescriptor, using_cdn: bool, build: &str) -> Vec<AssetTag> {
  let mut records = Vec::new();
  for path in selected_sources(descriptor, using_cdn).as_slice() {
    if path.is_empty() {
      continue;
    }
    let (src, attributes) = if using_cdn {
      (path.clone(), descriptor.attributes.clone())
    } else {
      (format!("{path}{build}"), AttributeMap::new())
    };
    records.push(AssetTag { src, attributes });
  }
  records
}

//! Manifest data model and JSON loading.
//!
//! A manifest maps resource names to descriptors and carries the handful of
//! registry-wide switches (offline mode, cache-busting version, seed lists).
//! It is read-only once loaded and can be shared freely across concurrent
//! renders; descriptor shape violations surface here as parse errors rather
//! than at each resolution.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

/// Conventional manifest file name picked up by [`Manifest::discover`].
pub const DEFAULT_MANIFEST_FILE: &str = "assets.json";

/// Placement axis for scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
  /// Page top, inside `<head>`.
  Header,
  /// Page end, just before `</body>`.
  #[default]
  Footer,
}

/// One source path or an ordered list of paths.
///
/// A named resource may expand to multiple files; the single-path form is
/// the common case in authored manifests.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Sources {
  /// A single path.
  One(String),
  /// An ordered list of paths.
  Many(Vec<String>),
}

impl Default for Sources {
  fn default() -> Self {
    Sources::Many(Vec::new())
  }
}

impl Sources {
  /// View the contained paths as a slice, in declaration order.
  pub fn as_slice(&self) -> &[String] {
    match self {
      Sources::One(path) => std::slice::from_ref(path),
      Sources::Many(paths) => paths,
    }
  }

  /// First non-empty path, if any.
  pub fn first_path(&self) -> Option<&str> {
    self
      .as_slice()
      .iter()
      .map(String::as_str)
      .find(|path| !path.is_empty())
  }
}

/// Attribute value attached to a descriptor or rendered tag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
  /// Boolean attribute: `true` renders the bare name, `false` renders nothing.
  Flag(bool),
  /// String list, space-joined under the `class` key.
  List(Vec<String>),
  /// Plain scalar value.
  Text(String),
}

impl From<&str> for AttributeValue {
  fn from(value: &str) -> Self {
    AttributeValue::Text(value.to_string())
  }
}

impl From<String> for AttributeValue {
  fn from(value: String) -> Self {
    AttributeValue::Text(value)
  }
}

impl From<bool> for AttributeValue {
  fn from(value: bool) -> Self {
    AttributeValue::Flag(value)
  }
}

/// Insertion-ordered map of HTML attribute name to value.
pub type AttributeMap = IndexMap<String, AttributeValue>;

/// Per-resource metadata looked up by name in the manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceDescriptor {
  /// Local source path(s).
  pub local: Sources,
  /// Optional CDN alternative path(s).
  pub cdn: Sources,
  /// Prefer the CDN source. Effective only while the manifest is not offline.
  pub use_cdn: bool,
  /// Placement for scripts. Ignored for styles, which all resolve together.
  pub location: Location,
  /// Attributes attached to the tag when the CDN source is selected.
  ///
  /// Never attached when the resolved source is local, so CDN-only metadata
  /// such as `integrity` or `crossorigin` cannot leak onto local tags.
  pub attributes: AttributeMap,
  /// Also require a style of the same name when this script resolves.
  pub include_style: bool,
  /// Global symbol guarding the CDN copy of a header-placed script.
  ///
  /// When the CDN source resolves empty, the resolver emits a fallback
  /// record that loads the local copy if this symbol is absent in the
  /// browser.
  pub fallback_global: Option<String>,
}

/// Named descriptor tables, one per tag kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceTables {
  /// Script descriptors by name.
  pub scripts: IndexMap<String, ResourceDescriptor>,
  /// Style descriptors by name.
  pub styles: IndexMap<String, ResourceDescriptor>,
}

/// Static configuration mapping resource names to descriptors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Manifest {
  /// Force every resolution to local sources regardless of `useCdn` flags.
  pub offline: bool,
  /// Append the cache-busting suffix to local manifest-resolved paths.
  pub enable_version: bool,
  /// Version string used to build the cache-busting suffix.
  pub version: String,
  /// Script names requested for every render.
  pub scripts: Vec<String>,
  /// Style names requested for every render.
  pub styles: Vec<String>,
  /// Descriptor tables.
  pub resources: ResourceTables,
}

/// Errors that can occur while loading a manifest file.
#[derive(Debug)]
pub enum ManifestError {
  /// Failed to read the manifest from disk.
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    source: std::io::Error,
  },
  /// Failed to parse the JSON manifest.
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    source: serde_json::Error,
  },
}

impl std::fmt::Display for ManifestError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io { path, source } => {
        write!(f, "failed to read {}: {}", path.display(), source)
      }
      Self::Parse { path, source } => {
        write!(f, "failed to parse {}: {}", path.display(), source)
      }
    }
  }
}

impl std::error::Error for ManifestError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io { source, .. } => Some(source),
      Self::Parse { source, .. } => Some(source),
    }
  }
}

impl Manifest {
  /// Parse a manifest from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(json)
  }

  /// Read a manifest from a specific JSON file.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|err| ManifestError::Io {
      path: path.to_path_buf(),
      source: err,
    })?;

    Self::from_json(&contents).map_err(|err| ManifestError::Parse {
      path: path.to_path_buf(),
      source: err,
    })
  }

  /// Attempt to load the conventional manifest file from a directory.
  ///
  /// When the file does not exist or fails to parse we fall back to an
  /// empty manifest so downstream callers can continue operating.
  pub fn discover(dir: &Path) -> Self {
    Self::from_path(dir.join(DEFAULT_MANIFEST_FILE)).unwrap_or_default()
  }

  /// Look up a script descriptor by name.
  pub fn script(&self, name: &str) -> Option<&ResourceDescriptor> {
    self.resources.scripts.get(name)
  }

  /// Look up a style descriptor by name.
  pub fn style(&self, name: &str) -> Option<&ResourceDescriptor> {
    self.resources.styles.get(name)
  }

  /// Cache-busting query suffix appended to local manifest-resolved paths.
  ///
  /// Empty when versioning is disabled or no version string is configured.
  pub fn build_version(&self) -> String {
    if self.enable_version && !self.version.is_empty() {
      format!("?v={}", self.version)
    } else {
      String::new()
    }
  }
}

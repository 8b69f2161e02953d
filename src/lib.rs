#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod html;
pub mod manifest;
pub mod models;
pub mod registry;
pub mod render;
pub mod resolver;

pub use manifest::{
  AttributeMap, AttributeValue, Location, Manifest, ManifestError, ResourceDescriptor, Sources,
};
pub use models::{AssetTag, CdnFallback, HeaderBundle, ScriptRecord};
pub use registry::Registry;

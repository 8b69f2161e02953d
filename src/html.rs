//! Tag-building primitives shared by the render layer.
//!
//! These helpers serialize attribute maps with the quirks templates rely
//! on: boolean attributes render bare, `class` lists space-join, empty
//! values disappear, and positional (numeric) keys pass their value through
//! verbatim. Scalar values are escaped for double-quoted attribute
//! positions.

use crate::manifest::{AttributeMap, AttributeValue};

/// Generate a `<script>` tag for a JavaScript source.
///
/// An empty `url` produces empty markup so callers never emit broken tags.
pub fn script_tag(url: &str, attributes: &AttributeMap) -> String {
  if url.is_empty() {
    return String::new();
  }

  let mut merged = attributes.clone();
  merged.insert("src".to_string(), AttributeValue::Text(url.to_string()));
  format!("<script{}></script>", serialize_attributes(&merged))
}

/// Generate a `<link>` tag for a stylesheet.
///
/// The defaults `media="all" type="text/css" rel="stylesheet"` merge under
/// the caller's attributes, so callers win on conflict.
pub fn style_tag(url: &str, attributes: &AttributeMap) -> String {
  if url.is_empty() {
    return String::new();
  }

  let mut merged = AttributeMap::new();
  merged.insert("media".to_string(), AttributeValue::Text("all".to_string()));
  merged.insert(
    "type".to_string(),
    AttributeValue::Text("text/css".to_string()),
  );
  merged.insert(
    "rel".to_string(),
    AttributeValue::Text("stylesheet".to_string()),
  );
  for (key, value) in attributes {
    merged.insert(key.clone(), value.clone());
  }
  merged.insert("href".to_string(), AttributeValue::Text(url.to_string()));

  format!("<link{}>", serialize_attributes(&merged))
}

/// Serialize an attribute map into the text placed after a tag name.
///
/// Returns an empty string or a string with one leading space.
pub fn serialize_attributes(attributes: &AttributeMap) -> String {
  let mut parts = Vec::new();
  for (key, value) in attributes {
    let Some(element) = attribute_element(key, value) else {
      continue;
    };
    if element.is_empty() {
      continue;
    }
    parts.push(element);
  }

  if parts.is_empty() {
    String::new()
  } else {
    format!(" {}", parts.join(" "))
  }
}

fn attribute_element(key: &str, value: &AttributeValue) -> Option<String> {
  // Positional keys carry finished attribute text in the value.
  if key.parse::<usize>().is_ok() {
    return match value {
      AttributeValue::Text(text) => Some(text.clone()),
      AttributeValue::Flag(_) | AttributeValue::List(_) => None,
    };
  }

  match value {
    AttributeValue::Flag(true) => Some(key.to_string()),
    AttributeValue::Flag(false) => None,
    AttributeValue::List(values) if key == "class" => {
      Some(format!("class=\"{}\"", values.join(" ")))
    }
    AttributeValue::List(values) => {
      Some(format!("{key}=\"{}\"", escape_attribute(&values.join(" "))))
    }
    AttributeValue::Text(text) if text.is_empty() => None,
    AttributeValue::Text(text) => Some(format!("{key}=\"{}\"", escape_attribute(text))),
  }
}

/// Escape a value for embedding inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> String {
  let mut escaped = String::with_capacity(value.len());
  for ch in value.chars() {
    match ch {
      '&' => escaped.push_str("&amp;"),
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '"' => escaped.push_str("&quot;"),
      '\'' => escaped.push_str("&#039;"),
      _ => escaped.push(ch),
    }
  }
  escaped
}

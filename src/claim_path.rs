// Copyright 2020-2023 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use crate::Error;
use crate::Result;

/// A parsed claim-path spec: `"name"`, `"a.b.c"`, or `"a[i]"`.
///
/// An array index precludes dot-nesting after `]`: `"a[i].b"` is not a valid path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPath {
  /// The full list of dot-separated components, e.g. `["a", "b", "c"]` for `"a.b.c"`.
  components: Vec<String>,
  /// The array index, present only for `"name[i]"` forms.
  index: Option<usize>,
}

impl ClaimPath {
  /// Parses a claim-path spec.
  ///
  /// ## Error
  /// [`Error::InvalidPath`] if any component is empty, if there are leading/trailing
  /// dots, or if content follows a `[i]` array index.
  pub fn parse(spec: &str) -> Result<Self> {
    if spec.is_empty() {
      return Err(Error::InvalidPath("path must not be empty".to_string()));
    }

    if let Some(bracket_pos) = spec.find('[') {
      let (head, rest) = spec.split_at(bracket_pos);
      let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
        return Err(Error::InvalidPath(format!("malformed array index in path: {spec}")));
      };
      // Reject anything after the closing bracket other than the bracket itself,
      // and reject dot-nesting inside the bracketed component.
      if rest.matches(']').count() != 1 || !rest.ends_with(']') {
        return Err(Error::InvalidPath(format!(
          "nested-in-array paths are not supported: {spec}"
        )));
      }
      let index: usize = inner
        .parse()
        .map_err(|_| Error::InvalidPath(format!("array index must be a non-negative integer: {spec}")))?;
      let components = split_dotted(head)?;
      return Ok(Self { components, index: Some(index) });
    }

    let components = split_dotted(spec)?;
    Ok(Self { components, index: None })
  }

  /// The base (first) component name.
  pub fn base_name(&self) -> &str {
    &self.components[0]
  }

  /// The array index, if this path targets an array element.
  pub fn index(&self) -> Option<usize> {
    self.index
  }

  /// The nested tail components after the base name, e.g. `["b", "c"]` for `"a.b.c"`.
  pub fn nested_tail(&self) -> &[String] {
    &self.components[1..]
  }

  /// Whether this path has nested components beyond the base name.
  pub fn is_nested(&self) -> bool {
    self.components.len() > 1
  }

  /// Whether this path targets an array element.
  pub fn is_array_element(&self) -> bool {
    self.index.is_some()
  }

  /// All dot-separated components, in order.
  pub fn components(&self) -> &[String] {
    &self.components
  }
}

fn split_dotted(spec: &str) -> Result<Vec<String>> {
  if spec.starts_with('.') || spec.ends_with('.') || spec.is_empty() {
    return Err(Error::InvalidPath(format!("invalid path: {spec}")));
  }
  let components: Vec<String> = spec.split('.').map(ToOwned::to_owned).collect();
  if components.iter().any(String::is_empty) {
    return Err(Error::InvalidPath(format!("path components must be non-empty: {spec}")));
  }
  Ok(components)
}

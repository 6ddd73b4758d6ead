//! Minimal tag scanner: enough HTML to find elements by class and slice out
//! their inner markup. Not a conforming parser; a `>` inside an attribute
//! value ends the tag early.

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
  "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
  "param", "source", "track", "wbr",
];

/// One start or end tag.
#[derive(Debug)]
pub(crate) struct Tag<'a> {
  /// Lowercased tag name.
  pub name:         String,
  pub closing:      bool,
  pub self_closing: bool,
  /// Everything between the name and the closing `>`.
  pub attrs:        &'a str,
  /// Byte offset of the `<`.
  pub start:        usize,
  /// Byte offset just past the `>`.
  pub end:          usize,
}

impl Tag<'_> {
  fn is_void(&self) -> bool { VOID_ELEMENTS.contains(&self.name.as_str()) }

  pub fn has_class(&self, class: &str) -> bool {
    attr_value(self.attrs, "class")
      .is_some_and(|v| v.split_whitespace().any(|c| c == class))
  }
}

/// The next tag at or after `from`, skipping comments, doctypes and stray
/// `<` characters.
pub(crate) fn next_tag(html: &str, from: usize) -> Option<Tag<'_>> {
  let mut pos = from;
  loop {
    let lt = html.get(pos..)?.find('<')? + pos;
    let rest = &html[lt..];

    if rest.starts_with("<!--") {
      pos = lt + rest.find("-->")? + 3;
      continue;
    }

    let gt = lt + rest.find('>')?;
    let inner = &html[lt + 1..gt];
    let (closing, body) = match inner.strip_prefix('/') {
      Some(b) => (true, b),
      None => (false, inner),
    };

    let name_len = body
      .find(|c: char| c.is_whitespace() || c == '/')
      .unwrap_or(body.len());
    let name = &body[..name_len];
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
      pos = lt + 1;
      continue;
    }

    let attrs = &body[name_len..];
    return Some(Tag {
      name: name.to_ascii_lowercase(),
      closing,
      self_closing: attrs.trim_end().ends_with('/'),
      attrs,
      start: lt,
      end: gt + 1,
    });
  }
}

/// Value of attribute `name` (case-insensitive); `""` for a bare attribute.
pub(crate) fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
  let mut rest = attrs;
  loop {
    rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
    if rest.is_empty() {
      return None;
    }

    let key_end = rest
      .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
      .unwrap_or(rest.len());
    let key = &rest[..key_end];
    rest = rest[key_end..].trim_start();

    let value = match rest.strip_prefix('=') {
      Some(after_eq) => {
        let after_eq = after_eq.trim_start();
        match after_eq.chars().next() {
          Some(q @ ('"' | '\'')) => {
            let body = &after_eq[1..];
            let close = body.find(q).unwrap_or(body.len());
            rest = body.get(close + 1..).unwrap_or("");
            &body[..close]
          }
          _ => {
            let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
            rest = &after_eq[end..];
            &after_eq[..end]
          }
        }
      }
      None => "",
    };

    if key.eq_ignore_ascii_case(name) {
      return Some(value);
    }
  }
}

/// Byte range of the inner markup of the element opened by `open`, and the
/// offset just past its end tag. Unterminated elements run to end of input.
fn element_bounds(html: &str, open: &Tag<'_>) -> (usize, usize, usize) {
  if open.self_closing || open.is_void() {
    return (open.end, open.end, open.end);
  }

  let mut depth = 1usize;
  let mut pos = open.end;
  while let Some(tag) = next_tag(html, pos) {
    pos = tag.end;
    if tag.name != open.name {
      continue;
    }
    if tag.closing {
      depth -= 1;
      if depth == 0 {
        return (open.end, tag.start, tag.end);
      }
    } else if !tag.self_closing {
      depth += 1;
    }
  }
  (open.end, html.len(), html.len())
}

/// Inner markup of every element carrying `class`. Matches nested inside an
/// earlier match are not reported separately.
pub(crate) fn find_all_by_class<'a>(html: &'a str, class: &str) -> Vec<&'a str> {
  let mut found = Vec::new();
  let mut pos = 0;
  while let Some(tag) = next_tag(html, pos) {
    pos = tag.end;
    if tag.closing || !tag.has_class(class) {
      continue;
    }
    let (inner_start, inner_end, outer_end) = element_bounds(html, &tag);
    found.push(&html[inner_start..inner_end]);
    pos = outer_end;
  }
  found
}

pub(crate) fn find_first_by_class<'a>(html: &'a str, class: &str) -> Option<&'a str> {
  let mut pos = 0;
  while let Some(tag) = next_tag(html, pos) {
    pos = tag.end;
    if !tag.closing && tag.has_class(class) {
      let (inner_start, inner_end, _) = element_bounds(html, &tag);
      return Some(&html[inner_start..inner_end]);
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_quoted_and_bare_attributes() {
    let attrs = r#" id=main class="a  b" data-x='y z' hidden"#;
    assert_eq!(attr_value(attrs, "class"), Some("a  b"));
    assert_eq!(attr_value(attrs, "ID"), Some("main"));
    assert_eq!(attr_value(attrs, "data-x"), Some("y z"));
    assert_eq!(attr_value(attrs, "hidden"), Some(""));
    assert_eq!(attr_value(attrs, "title"), None);
  }

  #[test]
  fn class_match_is_by_token() {
    let tag = next_tag(r#"<div class="views-row-odd views-row">"#, 0).unwrap();
    assert!(tag.has_class("views-row"));
    assert!(!tag.has_class("views"));
  }

  #[test]
  fn nested_same_name_elements_are_balanced() {
    let html = r#"<div class="x"><div>inner</div>tail</div><div class="x">two</div>"#;
    assert_eq!(find_all_by_class(html, "x"), ["<div>inner</div>tail", "two"]);
  }

  #[test]
  fn comments_and_doctype_are_skipped() {
    let html = r#"<!DOCTYPE html><!-- <div class="x">no</div> --><p class="x">yes</p>"#;
    assert_eq!(find_first_by_class(html, "x"), Some("yes"));
  }

  #[test]
  fn unterminated_element_runs_to_end() {
    assert_eq!(find_first_by_class(r#"<span class="x">open"#, "x"), Some("open"));
  }

  #[test]
  fn void_elements_do_not_open_scopes() {
    let html = r#"<br class="x"><span class="y">after</span>"#;
    assert_eq!(find_first_by_class(html, "x"), Some(""));
    assert_eq!(find_first_by_class(html, "y"), Some("after"));
  }
}

//! Markup to plain text.

use crate::scan::next_tag;

/// Tags that start a new line of text when opened or closed.
const BLOCK_TAGS: &[&str] = &["p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "table"];

/// Visible text of an HTML fragment.
///
/// Block boundaries and `<br>` become line breaks, entities are decoded,
/// runs of whitespace within a line collapse to one space, and blank lines
/// are dropped. Lines are joined with `\n`.
pub fn text_content(fragment: &str) -> String {
  let mut raw = String::with_capacity(fragment.len());
  let mut pos = 0;
  while let Some(tag) = next_tag(fragment, pos) {
    raw.push_str(&fragment[pos..tag.start]);
    let name = tag.name.as_str();
    let breaks = name == "br"
      || BLOCK_TAGS.contains(&name)
      || (tag.closing && name == "tr");
    if breaks {
      raw.push('\n');
    } else if tag.closing && name == "td" {
      raw.push(' ');
    }
    pos = tag.end;
  }
  raw.push_str(&fragment[pos..]);

  decode_entities(&raw)
    .lines()
    .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
    .filter(|line| !line.is_empty())
    .collect::<Vec<_>>()
    .join("\n")
}

fn named_entity(name: &str) -> Option<char> {
  Some(match name {
    "amp" => '&',
    "lt" => '<',
    "gt" => '>',
    "quot" => '"',
    "apos" => '\'',
    "nbsp" => ' ',
    "ndash" => '\u{2013}',
    "mdash" => '\u{2014}',
    _ => return None,
  })
}

fn numeric_entity(body: &str) -> Option<char> {
  let code = match body.strip_prefix(['x', 'X']) {
    Some(hex) => u32::from_str_radix(hex, 16).ok()?,
    None => body.parse().ok()?,
  };
  char::from_u32(code)
}

/// Decode character references. Unknown or malformed references pass
/// through unchanged.
fn decode_entities(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  let mut rest = s;
  while let Some(amp) = rest.find('&') {
    out.push_str(&rest[..amp]);
    let after = &rest[amp + 1..];
    let decoded = after.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
      let body = &after[..semi];
      let ch = match body.strip_prefix('#') {
        Some(num) => numeric_entity(num),
        None => named_entity(body),
      }?;
      Some((ch, semi))
    });
    match decoded {
      Some((ch, semi)) => {
        out.push(ch);
        rest = &after[semi + 1..];
      }
      None => {
        out.push('&');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_inline_markup() {
    assert_eq!(text_content("<span><b>PSU</b>24UP0001</span>"), "PSU24UP0001");
  }

  #[test]
  fn block_boundaries_become_lines() {
    let html = "<div>THEFT</div>\n  <div>  DISORDERLY   CONDUCT </div>";
    assert_eq!(text_content(html), "THEFT\nDISORDERLY CONDUCT");
  }

  #[test]
  fn br_splits_lines() {
    assert_eq!(text_content("one<br>two<br/>three"), "one\ntwo\nthree");
  }

  #[test]
  fn decodes_entities() {
    assert_eq!(
      text_content("Fish &amp; Game&nbsp;Lot &#39;A&#x27; &lt;3"),
      "Fish & Game Lot 'A' <3"
    );
  }

  #[test]
  fn leaves_unknown_references_alone() {
    assert_eq!(decode_entities("AT&T &bogus; &#xZZ;"), "AT&T &bogus; &#xZZ;");
  }

  #[test]
  fn empty_fragment_is_empty() {
    assert_eq!(text_content("  <div> </div> "), "");
  }
}

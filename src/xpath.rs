use super::*;

/// Parsed form of the one expression family the XPath query tier emits:
///
/// ```text
/// .//*[contains(concat('L', @attr, 'R'), 'needle') or ...]
/// ```
///
/// Each predicate tests whether the attribute value, padded with the two
/// concat literals, contains the needle as a substring. With single-space
/// pads and a space-wrapped needle this is the classic whole-token class
/// match. A missing attribute evaluates as the empty string, matching
/// `@attr` semantics inside `concat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XPathQuery {
    pub(crate) predicates: Vec<PaddedContains>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PaddedContains {
    pub(crate) attr: String,
    pub(crate) pad_left: String,
    pub(crate) pad_right: String,
    pub(crate) needle: String,
}

impl PaddedContains {
    fn matches(&self, element: &Element) -> bool {
        let value = element
            .attrs
            .get(&self.attr)
            .map(String::as_str)
            .unwrap_or("");
        let haystack = format!("{}{}{}", self.pad_left, value, self.pad_right);
        haystack.contains(&self.needle)
    }
}

impl XPathQuery {
    pub(crate) fn matches(&self, element: &Element) -> bool {
        self.predicates
            .iter()
            .any(|predicate| predicate.matches(element))
    }
}

pub(crate) fn parse_xpath_query(expr: &str) -> Result<XPathQuery> {
    let src = expr.trim();
    let bytes = src.as_bytes();
    let mut i = 0usize;

    expect_literal(src, bytes, &mut i, ".//*")?;
    expect_byte(src, bytes, &mut i, b'[')?;

    let mut predicates = Vec::new();
    loop {
        predicates.push(parse_contains(src, bytes, &mut i)?);
        skip_ws(bytes, &mut i);
        if consume_keyword(bytes, &mut i, "or") {
            continue;
        }
        break;
    }

    expect_byte(src, bytes, &mut i, b']')?;
    skip_ws(bytes, &mut i);
    if i != bytes.len() {
        return Err(Error::XPathParse(format!(
            "trailing input after predicate list: {src}"
        )));
    }

    Ok(XPathQuery { predicates })
}

fn parse_contains(src: &str, bytes: &[u8], i: &mut usize) -> Result<PaddedContains> {
    skip_ws(bytes, i);
    expect_literal(src, bytes, i, "contains")?;
    expect_byte(src, bytes, i, b'(')?;
    expect_literal(src, bytes, i, "concat")?;
    expect_byte(src, bytes, i, b'(')?;

    let pad_left = parse_string_literal(src, bytes, i)?;
    expect_byte(src, bytes, i, b',')?;
    expect_byte(src, bytes, i, b'@')?;

    let attr_start = *i;
    while *i < bytes.len() && is_xpath_name_char(bytes[*i]) {
        *i += 1;
    }
    if attr_start == *i {
        return Err(Error::XPathParse(format!("missing attribute name: {src}")));
    }
    let attr = src
        .get(attr_start..*i)
        .ok_or_else(|| Error::XPathParse(format!("invalid attribute name: {src}")))?
        .to_string();

    expect_byte(src, bytes, i, b',')?;
    let pad_right = parse_string_literal(src, bytes, i)?;
    expect_byte(src, bytes, i, b')')?;
    expect_byte(src, bytes, i, b',')?;
    let needle = parse_string_literal(src, bytes, i)?;
    expect_byte(src, bytes, i, b')')?;

    Ok(PaddedContains {
        attr,
        pad_left,
        pad_right,
        needle,
    })
}

fn parse_string_literal(src: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    skip_ws(bytes, i);
    let quote = match bytes.get(*i) {
        Some(b'\'') => b'\'',
        Some(b'"') => b'"',
        _ => {
            return Err(Error::XPathParse(format!("expected string literal: {src}")));
        }
    };
    *i += 1;
    let start = *i;
    while *i < bytes.len() && bytes[*i] != quote {
        *i += 1;
    }
    if *i >= bytes.len() {
        return Err(Error::XPathParse(format!("unclosed string literal: {src}")));
    }
    let value = src
        .get(start..*i)
        .ok_or_else(|| Error::XPathParse(format!("invalid string literal: {src}")))?
        .to_string();
    *i += 1;
    Ok(value)
}

fn expect_literal(src: &str, bytes: &[u8], i: &mut usize, literal: &str) -> Result<()> {
    skip_ws(bytes, i);
    let needle = literal.as_bytes();
    if *i + needle.len() <= bytes.len() && &bytes[*i..*i + needle.len()] == needle {
        *i += needle.len();
        Ok(())
    } else {
        Err(Error::XPathParse(format!("expected '{literal}': {src}")))
    }
}

fn expect_byte(src: &str, bytes: &[u8], i: &mut usize, expected: u8) -> Result<()> {
    skip_ws(bytes, i);
    if bytes.get(*i) == Some(&expected) {
        *i += 1;
        Ok(())
    } else {
        Err(Error::XPathParse(format!(
            "expected '{}': {src}",
            expected as char
        )))
    }
}

fn consume_keyword(bytes: &[u8], i: &mut usize, keyword: &str) -> bool {
    let needle = keyword.as_bytes();
    if *i + needle.len() > bytes.len() || &bytes[*i..*i + needle.len()] != needle {
        return false;
    }
    // Keywords must not run into an identifier tail.
    if bytes
        .get(*i + needle.len())
        .is_some_and(|b| b.is_ascii_alphanumeric())
    {
        return false;
    }
    *i += needle.len();
    true
}

fn is_xpath_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

impl Dom {
    /// Host primitive behind the XPath query tier. Evaluates the
    /// padded-`contains` expression family (see [`XPathQuery`]) against the
    /// descendants of `root` in document order. Anything outside that family
    /// is an [`Error::XPathParse`], which callers propagate unchanged.
    pub fn evaluate_xpath(&self, root: NodeId, expr: &str) -> Result<Vec<NodeId>> {
        let query = parse_xpath_query(expr)?;
        let matched = self
            .descendant_elements(root)
            .into_iter()
            .filter(|candidate| {
                self.element(*candidate)
                    .is_some_and(|element| query.matches(element))
            })
            .collect();
        Ok(matched)
    }
}

use std::borrow::Cow;
use std::fmt;

use log::debug;

use super::*;

/// Which optional host primitives the environment exposes. Established once
/// and handed to [`QueryEngine::new`]; the engine never probes ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub native_query: bool,
    pub xpath_eval: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self {
            native_query: true,
            xpath_eval: true,
        }
    }

    pub fn xpath_only() -> Self {
        Self {
            native_query: false,
            xpath_eval: true,
        }
    }

    pub fn manual_only() -> Self {
        Self {
            native_query: false,
            xpath_eval: false,
        }
    }

    /// Fixed priority: native query, else XPath evaluation, else manual walk.
    pub fn tier(self) -> QueryTier {
        if self.native_query {
            QueryTier::Native
        } else if self.xpath_eval {
            QueryTier::XPath
        } else {
            QueryTier::Manual
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTier {
    Native,
    XPath,
    Manual,
}

trait DescendantFinder {
    fn elements_by_class(&self, dom: &Dom, root: NodeId, class_name: &str) -> Result<Vec<NodeId>>;

    fn elements_by_attribute(
        &self,
        dom: &Dom,
        root: NodeId,
        attr_name: &str,
        value_tokens: &[&str],
    ) -> Result<Vec<NodeId>>;
}

/// Delegates to the host's direct primitives: `elements_by_class` for class
/// lookups and a constructed selector for attribute lookups. Attribute
/// matching uses the whole-token `[a~="v"]` form so this tier agrees with the
/// other two.
struct NativeFinder;

impl DescendantFinder for NativeFinder {
    fn elements_by_class(&self, dom: &Dom, root: NodeId, class_name: &str) -> Result<Vec<NodeId>> {
        Ok(dom.elements_by_class(root, class_name))
    }

    fn elements_by_attribute(
        &self,
        dom: &Dom,
        root: NodeId,
        attr_name: &str,
        value_tokens: &[&str],
    ) -> Result<Vec<NodeId>> {
        let selector = value_tokens
            .iter()
            .map(|value| format!("[{attr_name}~=\"{value}\"]"))
            .collect::<Vec<_>>()
            .join(", ");
        dom.query_selector_all_from(root, &selector)
    }
}

/// Builds the padded-`contains` expression and hands it to the host's XPath
/// evaluator. Tokens that cannot appear inside a single-quoted XPath literal
/// surface as the evaluator's parse error.
struct XPathFinder;

impl DescendantFinder for XPathFinder {
    fn elements_by_class(&self, dom: &Dom, root: NodeId, class_name: &str) -> Result<Vec<NodeId>> {
        let expr = format!(".//*[contains(concat(' ', @class, ' '), ' {class_name} ')]");
        dom.evaluate_xpath(root, &expr)
    }

    fn elements_by_attribute(
        &self,
        dom: &Dom,
        root: NodeId,
        attr_name: &str,
        value_tokens: &[&str],
    ) -> Result<Vec<NodeId>> {
        let predicates = value_tokens
            .iter()
            .map(|value| format!("contains(concat(' ', @{attr_name}, ' '), ' {value} ')"))
            .collect::<Vec<_>>()
            .join(" or ");
        dom.evaluate_xpath(root, &format!(".//*[{predicates}]"))
    }
}

/// Walks the tag-wildcard enumeration and tests each element with a
/// whole-token regex. Query tokens are regex-escaped before compilation, so
/// matching-grammar metacharacters are matched literally.
struct ManualFinder;

impl DescendantFinder for ManualFinder {
    fn elements_by_class(&self, dom: &Dom, root: NodeId, class_name: &str) -> Result<Vec<NodeId>> {
        let matcher = whole_token_matcher(class_name)?;
        let mut matched = Vec::new();
        for candidate in dom.descendant_elements(root) {
            let Some(value) = dom.attr(candidate, "class") else {
                continue;
            };
            if matcher
                .is_match(value)
                .map_err(|err| Error::Regex(err.to_string()))?
            {
                matched.push(candidate);
            }
        }
        Ok(matched)
    }

    fn elements_by_attribute(
        &self,
        dom: &Dom,
        root: NodeId,
        attr_name: &str,
        value_tokens: &[&str],
    ) -> Result<Vec<NodeId>> {
        let mut matchers = Vec::with_capacity(value_tokens.len());
        for token in value_tokens {
            matchers.push(whole_token_matcher(token)?);
        }

        let mut matched = Vec::new();
        for candidate in dom.descendant_elements(root) {
            let Some(value) = dom.attr(candidate, attr_name) else {
                continue;
            };
            let mut found = false;
            for matcher in &matchers {
                if matcher
                    .is_match(value)
                    .map_err(|err| Error::Regex(err.to_string()))?
                {
                    found = true;
                    break;
                }
            }
            if found {
                matched.push(candidate);
            }
        }
        Ok(matched)
    }
}

fn whole_token_matcher(token: &str) -> Result<fancy_regex::Regex> {
    let pattern = format!("(^|\\s){}(\\s|$)", regex_escape(token));
    fancy_regex::Regex::new(&pattern).map_err(|err| Error::Regex(err.to_string()))
}

pub(crate) fn regex_escape(value: &str) -> Cow<'_, str> {
    let mut out = String::with_capacity(value.len());
    let mut changed = false;

    for ch in value.chars() {
        if is_regex_meta(ch) {
            out.push('\\');
            changed = true;
        }
        out.push(ch);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(value)
    }
}

fn is_regex_meta(ch: char) -> bool {
    matches!(
        ch,
        '\\' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '^' | '$' | '/'
    )
}

/// Descendant query front end. The tier is chosen once at construction from
/// the supplied [`Capabilities`] and never re-probed.
pub struct QueryEngine {
    tier: QueryTier,
    finder: Box<dyn DescendantFinder>,
}

impl QueryEngine {
    pub fn new(capabilities: Capabilities) -> Self {
        let tier = capabilities.tier();
        debug!("query engine dispatching through {tier:?} tier");
        let finder: Box<dyn DescendantFinder> = match tier {
            QueryTier::Native => Box::new(NativeFinder),
            QueryTier::XPath => Box::new(XPathFinder),
            QueryTier::Manual => Box::new(ManualFinder),
        };
        Self { tier, finder }
    }

    pub fn tier(&self) -> QueryTier {
        self.tier
    }

    /// Descendants of `root` carrying `class_name` as a whole token, in
    /// document order, `root` excluded. An empty or blank class name matches
    /// nothing.
    pub fn elements_by_class(
        &self,
        dom: &Dom,
        root: NodeId,
        class_name: &str,
    ) -> Result<Vec<NodeId>> {
        if class_name.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.finder.elements_by_class(dom, root, class_name)
    }

    /// Descendants of `root` whose `attr_name` attribute contains any of the
    /// whitespace-separated tokens in `attr_values` as a whole token, in
    /// document order, `root` excluded. An empty token list matches nothing.
    pub fn elements_by_attribute(
        &self,
        dom: &Dom,
        root: NodeId,
        attr_name: &str,
        attr_values: &str,
    ) -> Result<Vec<NodeId>> {
        let tokens = attr_values.split_whitespace().collect::<Vec<_>>();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        self.finder
            .elements_by_attribute(dom, root, attr_name, &tokens)
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("tier", &self.tier)
            .finish()
    }
}

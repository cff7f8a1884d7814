//! CSS and XPath subsets understood by the mock session
//!
//! CSS: type/universal selectors, `#id`, `.class`, attribute selectors with
//! `=`, `~=`, `^=`, `$=`, `*=`, joined by descendant or `>` combinators.
//! XPath: `/` and `//` steps with name tests, `..`, and predicates over
//! attributes, text, class tokens and positions.

use super::dom::{MockDom, MockNode, NodeId};
use crate::{Error, Result};

// ============================================================================
// CSS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Includes(String),
    Prefix(String),
    Suffix(String),
    Substring(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
}

impl Compound {
    fn matches(&self, node: &MockNode) -> bool {
        if let Some(tag) = &self.tag {
            if !tag.eq_ignore_ascii_case(&node.tag) {
                return false;
            }
        }
        if !self.ids.iter().all(|id| node.attribute("id") == Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|(name, op)| {
            let Some(value) = node.attribute(name) else {
                return false;
            };
            match op {
                AttrOp::Exists => true,
                AttrOp::Equals(v) => value == v,
                AttrOp::Includes(v) => value.split_whitespace().any(|w| w == v),
                AttrOp::Prefix(v) => value.starts_with(v.as_str()),
                AttrOp::Suffix(v) => value.ends_with(v.as_str()),
                AttrOp::Substring(v) => value.contains(v.as_str()),
            }
        })
    }
}

#[derive(Debug)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    // combinators[i] joins compounds[i] and compounds[i + 1]
    combinators: Vec<Combinator>,
}

impl ComplexSelector {
    fn parse(selector: &str) -> Result<Self> {
        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut pending = None;

        for token in tokenize_css(selector)? {
            if token == ">" {
                if compounds.is_empty() || pending.is_some() {
                    return Err(invalid_css(selector));
                }
                pending = Some(Combinator::Child);
                continue;
            }
            let compound = parse_compound(&token).ok_or_else(|| invalid_css(selector))?;
            if !compounds.is_empty() {
                combinators.push(pending.take().unwrap_or(Combinator::Descendant));
            }
            compounds.push(compound);
        }

        if compounds.is_empty() || pending.is_some() {
            return Err(invalid_css(selector));
        }
        Ok(Self { compounds, combinators })
    }

    fn matches(&self, dom: &MockDom, id: NodeId) -> bool {
        self.matches_from(dom, id, self.compounds.len() - 1)
    }

    fn matches_from(&self, dom: &MockDom, id: NodeId, index: usize) -> bool {
        let Some(node) = dom.node(id) else {
            return false;
        };
        if !self.compounds[index].matches(node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => dom
                .parent(id)
                .map(|p| self.matches_from(dom, p, index - 1))
                .unwrap_or(false),
            Combinator::Descendant => dom
                .ancestors(id)
                .into_iter()
                .any(|a| self.matches_from(dom, a, index - 1)),
        }
    }
}

fn invalid_css(selector: &str) -> Error {
    Error::invalid_locator(format!("unsupported css selector for mock session: {}", selector))
}

fn tokenize_css(selector: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in selector.chars() {
        if let Some(q) = quote {
            current.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' if depth > 0 => {
                quote = Some(c);
                current.push(c);
            }
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| invalid_css(selector))?;
                current.push(c);
            }
            '>' if depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".to_string());
            }
            c if c.is_whitespace() && depth == 0 => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(invalid_css(selector));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(token: &str) -> Option<Compound> {
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;
    let mut compound = Compound::default();

    if chars.first() == Some(&'*') {
        i = 1;
    } else {
        let start = i;
        while i < chars.len() && is_ident_char(chars[i]) {
            i += 1;
        }
        if i > start {
            compound.tag = Some(chars[start..i].iter().collect());
        }
    }

    while i < chars.len() {
        match chars[i] {
            '#' | '.' => {
                let marker = chars[i];
                i += 1;
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                if i == start {
                    return None;
                }
                let ident: String = chars[start..i].iter().collect();
                if marker == '#' {
                    compound.ids.push(ident);
                } else {
                    compound.classes.push(ident);
                }
            }
            '[' => {
                let end = find_closing_bracket(&chars, i)?;
                let inner: String = chars[i + 1..end].iter().collect();
                compound.attrs.push(parse_attribute(&inner)?);
                i = end + 1;
            }
            _ => return None,
        }
    }
    Some(compound)
}

fn find_closing_bracket(chars: &[char], open: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, c) in chars[open + 1..].iter().enumerate() {
        match (quote, *c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(*c),
            (None, ']') => return Some(open + 1 + offset),
            _ => {}
        }
    }
    None
}

fn parse_attribute(inner: &str) -> Option<(String, AttrOp)> {
    let ops: [(&str, fn(String) -> AttrOp); 5] = [
        ("~=", AttrOp::Includes),
        ("^=", AttrOp::Prefix),
        ("$=", AttrOp::Suffix),
        ("*=", AttrOp::Substring),
        ("=", AttrOp::Equals),
    ];
    for (symbol, build) in ops {
        if let Some(pos) = inner.find(symbol) {
            let name = inner[..pos].trim();
            let value = unquote(inner[pos + symbol.len()..].trim());
            if name.is_empty() {
                return None;
            }
            return Some((name.to_string(), build(value)));
        }
    }
    let name = inner.trim();
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return None;
    }
    Some((name.to_string(), AttrOp::Exists))
}

fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Elements under `scope` (or the whole document) matching a CSS selector
pub fn select_css(dom: &MockDom, scope: Option<NodeId>, selector: &str) -> Result<Vec<NodeId>> {
    let complex = ComplexSelector::parse(selector)?;
    let candidates = match scope {
        Some(s) => dom.descendants(s),
        None => dom.document_order(),
    };
    Ok(candidates
        .into_iter()
        .filter(|id| complex.matches(dom, *id))
        .collect())
}

// ============================================================================
// XPath
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Text,
    StringValue,
    Attribute(String),
    ClassTokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    HasAttribute(String),
    Equals(Operand, String),
    Contains(Operand, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    name: String,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Document,
    Node(NodeId),
}

fn invalid_xpath(expr: &str) -> Error {
    Error::invalid_locator(format!("unsupported xpath for mock session: {}", expr))
}

fn parse_xpath(expr: &str) -> Result<(bool, Vec<Step>)> {
    let chars: Vec<char> = expr.trim().chars().collect();
    let mut i = 0;
    let relative = chars.first() == Some(&'.') && chars.get(1) != Some(&'.');
    if relative {
        i = 1;
    }

    let mut steps = Vec::new();
    while i < chars.len() {
        if chars[i] != '/' {
            return Err(invalid_xpath(expr));
        }
        let axis = if chars.get(i + 1) == Some(&'/') {
            i += 2;
            Axis::Descendant
        } else {
            i += 1;
            Axis::Child
        };

        let start = i;
        while i < chars.len() && (is_ident_char(chars[i]) || chars[i] == '*' || chars[i] == '.') {
            i += 1;
        }
        let name: String = chars[start..i].iter().collect();
        if name.is_empty() {
            return Err(invalid_xpath(expr));
        }
        let axis = if name == ".." {
            if axis != Axis::Child {
                return Err(invalid_xpath(expr));
            }
            Axis::Parent
        } else {
            axis
        };

        let mut predicates = Vec::new();
        while chars.get(i) == Some(&'[') {
            let end = find_closing_bracket(&chars, i).ok_or_else(|| invalid_xpath(expr))?;
            let inner: String = chars[i + 1..end].iter().collect();
            predicates.push(parse_predicate(&inner).ok_or_else(|| invalid_xpath(expr))?);
            i = end + 1;
        }

        steps.push(Step { axis, name, predicates });
    }

    if steps.is_empty() && !relative {
        return Err(invalid_xpath(expr));
    }
    Ok((relative, steps))
}

fn parse_operand(raw: &str) -> Option<Operand> {
    let raw = raw.trim();
    match raw {
        "text()" => Some(Operand::Text),
        "normalize-space()" | "normalize-space(.)" | "." | "string()" => Some(Operand::StringValue),
        _ if raw.starts_with('@') && raw[1..].chars().all(is_ident_char) => {
            Some(Operand::Attribute(raw[1..].to_string()))
        }
        _ if raw.starts_with("concat(") && raw.contains("normalize-space(@class)") => {
            Some(Operand::ClassTokens)
        }
        _ => None,
    }
}

fn split_top_level_comma(raw: &str) -> Option<(&str, &str)> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut last = None;
    for (idx, c) in raw.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, ',') if depth == 0 => last = Some(idx),
            _ => {}
        }
    }
    last.map(|idx| (&raw[..idx], &raw[idx + 1..]))
}

fn parse_predicate(inner: &str) -> Option<Predicate> {
    let inner = inner.trim();
    if let Ok(position) = inner.parse::<usize>() {
        return (position > 0).then_some(Predicate::Position(position));
    }
    if let Some(args) = inner.strip_prefix("contains(").and_then(|s| s.strip_suffix(')')) {
        let (lhs, rhs) = split_top_level_comma(args)?;
        return Some(Predicate::Contains(parse_operand(lhs)?, unquote(rhs)));
    }
    if let Some(pos) = inner.rfind('=') {
        let (lhs, rhs) = (&inner[..pos], &inner[pos + 1..]);
        return Some(Predicate::Equals(parse_operand(lhs)?, unquote(rhs)));
    }
    match parse_operand(inner)? {
        Operand::Attribute(name) => Some(Predicate::HasAttribute(name)),
        _ => None,
    }
}

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn operand_value(dom: &MockDom, id: NodeId, operand: &Operand) -> Option<String> {
    let node = dom.node(id)?;
    match operand {
        Operand::Text => Some(node.text.clone()),
        Operand::StringValue => Some(normalize_space(&dom.string_value(id))),
        Operand::Attribute(name) => node.attribute(name).map(str::to_string),
        Operand::ClassTokens => Some(format!(
            " {} ",
            normalize_space(node.attribute("class").unwrap_or(""))
        )),
    }
}

fn step_candidates(dom: &MockDom, context: Context, axis: Axis) -> Vec<NodeId> {
    match (context, axis) {
        (Context::Document, Axis::Child) => vec![dom.root()],
        (Context::Document, Axis::Descendant) => dom.document_order(),
        (Context::Document, Axis::Parent) => Vec::new(),
        (Context::Node(n), Axis::Child) => dom.children(n).to_vec(),
        (Context::Node(n), Axis::Descendant) => dom.descendants(n),
        (Context::Node(n), Axis::Parent) => dom.parent(n).into_iter().collect(),
    }
}

fn apply_step(dom: &MockDom, context: Context, step: &Step) -> Vec<NodeId> {
    let mut matched: Vec<NodeId> = step_candidates(dom, context, step.axis)
        .into_iter()
        .filter(|id| {
            step.axis == Axis::Parent
                || step.name == "*"
                || dom
                    .node(*id)
                    .map(|n| n.tag.eq_ignore_ascii_case(&step.name))
                    .unwrap_or(false)
        })
        .collect();

    for predicate in &step.predicates {
        matched = match predicate {
            Predicate::Position(p) => matched.get(p - 1).copied().into_iter().collect(),
            Predicate::HasAttribute(name) => matched
                .into_iter()
                .filter(|id| dom.node(*id).and_then(|n| n.attribute(name)).is_some())
                .collect(),
            Predicate::Equals(operand, value) => matched
                .into_iter()
                .filter(|id| operand_value(dom, *id, operand).as_deref() == Some(value.as_str()))
                .collect(),
            Predicate::Contains(operand, value) => matched
                .into_iter()
                .filter(|id| {
                    operand_value(dom, *id, operand)
                        .map(|v| v.contains(value.as_str()))
                        .unwrap_or(false)
                })
                .collect(),
        };
    }
    matched
}

/// Elements matching an XPath. Absolute expressions search the whole
/// document even when a scope is given; `.`-prefixed ones start at `scope`.
pub fn select_xpath(dom: &MockDom, scope: Option<NodeId>, expr: &str) -> Result<Vec<NodeId>> {
    let (relative, steps) = parse_xpath(expr)?;
    let start = match (relative, scope) {
        (true, Some(s)) => Context::Node(s),
        _ => Context::Document,
    };

    let mut contexts = vec![start];
    for step in &steps {
        let mut next = Vec::new();
        for context in &contexts {
            for id in apply_step(dom, *context, step) {
                if !next.contains(&Context::Node(id)) {
                    next.push(Context::Node(id));
                }
            }
        }
        contexts = next;
    }

    let found: Vec<NodeId> = contexts
        .into_iter()
        .filter_map(|c| match c {
            Context::Node(id) => Some(id),
            Context::Document => None,
        })
        .collect();
    let order = dom.document_order();
    let mut sorted = found;
    sorted.sort_by_key(|id| order.iter().position(|o| o == id).unwrap_or(usize::MAX));
    Ok(sorted)
}

//! Page-side scripts for the CDP adapter
//!
//! Found elements are kept in a page-global registry keyed by handle id.
//! Every script returns a [`ScriptEnvelope`](super::types::ScriptEnvelope):
//! `{stale: true}` when a referenced element is missing or detached,
//! `{invalid: msg}` when the query engine rejected a selector, otherwise
//! `{value: ...}`. An element keeps one id for as long as it stays attached;
//! detached entries are pruned on the next find.

/// Element body: rendered text
pub const TEXT: &str = "return el.innerText;";

/// Element body: lower-case tag name
pub const TAG_NAME: &str = "return el.tagName.toLowerCase();";

/// Element body: bounding rectangle
pub const RECT: &str =
    "const r = el.getBoundingClientRect(); return { x: r.x, y: r.y, width: r.width, height: r.height };";

/// Element body: rendered with a visible box
pub const IS_DISPLAYED: &str = r#"const s = window.getComputedStyle(el);
if (s.display === "none" || s.visibility === "hidden") return false;
const r = el.getBoundingClientRect();
return r.width > 0 && r.height > 0;"#;

/// Element body: bring into view and report where a pointer event would land
pub const POINTER_TARGET: &str = r#"el.scrollIntoView({ block: "center", inline: "center" });
const r = el.getBoundingClientRect();
const x = r.x + r.width / 2;
const y = r.y + r.height / 2;
const top = document.elementFromPoint(x, y);
return { x, y, displayed: r.width > 0 && r.height > 0, hit: !!top && (top === el || el.contains(top)) };"#;

/// Element body: take keyboard focus
pub const FOCUS: &str = "el.focus(); return null;";

pub const CURRENT_URL: &str = "window.location.href";

const REGISTRY: &str = "const reg = (window.__pomElements = window.__pomElements || {});";

/// Reverse index from element to its registered id
const REGISTERED_IDS: &str = "const ids = (window.__pomIds = window.__pomIds || new WeakMap());";

/// Render `value` as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// A query in one of the page's two selector dialects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    fn statement(&self) -> String {
        match self {
            Query::Css(selector) => format!("found = Array.from(root.querySelectorAll({}));", js_string(selector)),
            Query::XPath(expr) => format!(
                "const r = document.evaluate({}, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);\n    \
                 for (let i = 0; i < r.snapshotLength; i++) found.push(r.snapshotItem(i));",
                js_string(expr)
            ),
        }
    }
}

/// Run `query` inside `scope` (or the document); the envelope value is the
/// ids of the matches in document order.
///
/// Matches already registered keep their id, new ones are registered as
/// `{prefix}-{i}`. Entries whose element left the document are dropped first.
pub fn find(scope: Option<&str>, query: &Query, prefix: &str) -> String {
    let scope = scope.map(js_string).unwrap_or_else(|| "null".to_string());
    format!(
        r#"(() => {{
  {registry}
  {ids}
  let root = document;
  const scope = {scope};
  if (scope !== null) {{
    root = reg[scope];
    if (!root || !root.isConnected) return {{ stale: true }};
  }}
  let found = [];
  try {{
    {statement}
  }} catch (e) {{
    return {{ invalid: String(e) }};
  }}
  for (const key of Object.keys(reg)) {{
    if (!reg[key].isConnected) delete reg[key];
  }}
  const matched = found.map((el, i) => {{
    let id = ids.get(el);
    if (id === undefined || reg[id] !== el) {{
      id = {prefix} + "-" + i;
      ids.set(el, id);
      reg[id] = el;
    }}
    return id;
  }});
  return {{ value: matched }};
}})()"#,
        registry = REGISTRY,
        ids = REGISTERED_IDS,
        scope = scope,
        statement = query.statement(),
        prefix = js_string(prefix),
    )
}

/// Run `body` with `el` bound to the registered element `id`
pub fn on_element(id: &str, body: &str) -> String {
    format!(
        r#"(() => {{
  {registry}
  const el = reg[{id}];
  if (!el || !el.isConnected) return {{ stale: true }};
  return {{ value: (() => {{ {body} }})() }};
}})()"#,
        registry = REGISTRY,
        id = js_string(id),
        body = body,
    )
}

/// Element body: attribute value, preferring the live property for `value`
pub fn attribute(name: &str) -> String {
    let name = js_string(name);
    format!(
        "if ({name} === \"value\" && \"value\" in el) return String(el.value);\nreturn el.getAttribute({name});",
        name = name
    )
}

/// Element body: computed style property
pub fn css_value(property: &str) -> String {
    format!(
        "return window.getComputedStyle(el).getPropertyValue({});",
        js_string(property)
    )
}

/// An argument for [`call`]: a registered element id or a JSON value
#[derive(Debug, Clone)]
pub enum CallArg<'a> {
    Element(&'a str),
    Value(&'a serde_json::Value),
}

/// Run a WebDriver-style script body with `arguments` bound to `args`
pub fn call(script: &str, args: &[CallArg<'_>]) -> String {
    let element_ids: Vec<String> = args
        .iter()
        .filter_map(|a| match a {
            CallArg::Element(id) => Some(js_string(id)),
            CallArg::Value(_) => None,
        })
        .collect();
    let rendered: Vec<String> = args
        .iter()
        .map(|a| match a {
            CallArg::Element(id) => format!("reg[{}]", js_string(id)),
            CallArg::Value(v) => v.to_string(),
        })
        .collect();
    format!(
        r#"(() => {{
  {registry}
  for (const id of [{ids}]) {{
    const el = reg[id];
    if (!el || !el.isConnected) return {{ stale: true }};
  }}
  const args = [{args}];
  return {{ value: (function() {{ {script} }}).apply(null, args) }};
}})()"#,
        registry = REGISTRY,
        ids = element_ids.join(", "),
        args = rendered.join(", "),
        script = script,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(js_string("line\nbreak"), "\"line\\nbreak\"");
    }

    #[test]
    fn test_find_script_shape() {
        let css = find(None, &Query::Css("div.x".into()), "p1");
        assert!(css.contains("const scope = null;"));
        assert!(css.contains("root.querySelectorAll(\"div.x\")"));
        assert!(css.contains("id = \"p1\" + \"-\" + i;"));
        assert!(css.contains("let id = ids.get(el);"));
        assert!(css.contains("if (!reg[key].isConnected) delete reg[key];"));

        let xpath = find(Some("p0-0"), &Query::XPath(".//a".into()), "p2");
        assert!(xpath.contains("const scope = \"p0-0\";"));
        assert!(xpath.contains("document.evaluate(\".//a\", root"));
    }

    #[test]
    fn test_call_binds_arguments() {
        let n = serde_json::json!(3);
        let script = call("return arguments[1];", &[CallArg::Element("p-0"), CallArg::Value(&n)]);
        assert!(script.contains("for (const id of [\"p-0\"])"));
        assert!(script.contains("const args = [reg[\"p-0\"], 3];"));
    }
}

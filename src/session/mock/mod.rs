//! Mock session implementation for testing
//!
//! [`MockSession`] keeps an in-memory DOM and answers every
//! [`AutomationSession`] call from it. Tests drive the asynchronous side of
//! a reactive UI by scheduling mutations, attaching mutations to clicks and
//! injecting staleness or intercepted clicks.

pub mod dom;
pub mod selector;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

pub use dom::{MockDom, MockNode, NodeId};

use super::keys;
use super::traits::{AutomationSession, ElementHandle, EvaluationResult, Rect, ScriptArg};
use crate::locator::{Locator, Strategy};
use crate::Error;

const HANDLE_PREFIX: &str = "mock-node-";

/// A change to the mock DOM, applied immediately or later
#[derive(Debug, Clone)]
pub enum MockMutation {
    Append { parent: Option<NodeId>, node: MockNode },
    Remove(NodeId),
    SetText(NodeId, String),
    SetAttribute(NodeId, String, String),
    SetDisplayed(NodeId, bool),
    /// Replace the subtree with a fresh copy, invalidating old handles
    Rerender(NodeId),
}

#[derive(Debug)]
struct MockState {
    dom: MockDom,
    scheduled: Vec<(Instant, MockMutation)>,
    click_hooks: HashMap<NodeId, Vec<(Duration, MockMutation)>>,
    blur_hooks: HashMap<NodeId, Vec<MockMutation>>,
    blocked_clicks: HashMap<NodeId, usize>,
    stale_reads: usize,
    focused: Option<NodeId>,
    url: String,
    ready_state: String,
    viewport: (f64, f64),
    find_calls: usize,
    clicks: Vec<NodeId>,
    offset_clicks: Vec<(NodeId, f64, f64)>,
    sent_keys: Vec<(NodeId, String)>,
    scripts: Vec<String>,
}

impl MockState {
    fn deliver_click(&mut self, id: NodeId) {
        if let Some(previous) = self.focused.filter(|f| *f != id) {
            self.blur(previous);
        }
        self.focused = Some(id);
        self.clicks.push(id);
        let now = Instant::now();
        let hooks = self.click_hooks.get(&id).cloned().unwrap_or_default();
        for (delay, mutation) in hooks {
            if delay.is_zero() {
                self.apply(mutation);
            } else {
                self.scheduled.push((now + delay, mutation));
            }
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if self.scheduled.iter().all(|(due, _)| *due > now) {
            return;
        }
        self.scheduled.sort_by_key(|(due, _)| *due);
        let split = self.scheduled.partition_point(|(due, _)| *due <= now);
        let due: Vec<_> = self.scheduled.drain(..split).collect();
        for (_, mutation) in due {
            self.apply(mutation);
        }
    }

    fn apply(&mut self, mutation: MockMutation) -> Option<NodeId> {
        match mutation {
            MockMutation::Append { parent, node } => Some(self.dom.append(parent, node)),
            MockMutation::Remove(id) => {
                self.dom.remove(id);
                None
            }
            MockMutation::SetText(id, text) => {
                if let Some(node) = self.dom.node_mut(id) {
                    node.text = text;
                }
                Some(id)
            }
            MockMutation::SetAttribute(id, name, value) => {
                if let Some(node) = self.dom.node_mut(id) {
                    node.attributes.insert(name, value);
                }
                Some(id)
            }
            MockMutation::SetDisplayed(id, displayed) => {
                if let Some(node) = self.dom.node_mut(id) {
                    node.displayed = displayed;
                }
                Some(id)
            }
            MockMutation::Rerender(id) => self.dom.rerender(id),
        }
    }

    /// Resolve a handle for an element-level operation
    fn live(&mut self, element: &ElementHandle) -> Result<NodeId, Error> {
        self.tick();
        let id = self.existing(element)?;
        if self.stale_reads > 0 {
            self.stale_reads -= 1;
            self.dom.rerender(id);
            return Err(Error::stale(format!("{} was re-rendered", element)));
        }
        Ok(id)
    }

    fn existing(&self, element: &ElementHandle) -> Result<NodeId, Error> {
        MockSession::node_id(element)
            .filter(|id| self.dom.contains(*id))
            .ok_or_else(|| Error::stale(format!("{} is no longer attached to the DOM", element)))
    }

    fn find(&self, scope: Option<NodeId>, locator: &Locator) -> Result<Vec<NodeId>, Error> {
        let selector = locator.selector();
        if locator.strategy() == Strategy::Css {
            return selector::select_css(&self.dom, scope, selector);
        }
        if locator.strategy() == Strategy::XPath {
            return selector::select_xpath(&self.dom, scope, selector);
        }

        let candidates = match scope {
            Some(s) => self.dom.descendants(s),
            None => self.dom.document_order(),
        };
        let link_text = |id: NodeId| {
            self.dom
                .rendered_text(id)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        };
        Ok(candidates
            .into_iter()
            .filter(|id| {
                let Some(node) = self.dom.node(*id) else {
                    return false;
                };
                match locator.strategy() {
                    Strategy::Id => node.attribute("id") == Some(selector),
                    Strategy::Name => node.attribute("name") == Some(selector),
                    Strategy::ClassName => node.has_class(selector),
                    Strategy::TagName => node.tag.eq_ignore_ascii_case(selector),
                    Strategy::LinkText => node.tag == "a" && link_text(*id) == selector,
                    Strategy::PartialLinkText => node.tag == "a" && link_text(*id).contains(selector),
                    Strategy::Css | Strategy::XPath => false,
                }
            })
            .collect())
    }

    fn commit_numeric(&mut self, id: NodeId) {
        if let Some(node) = self.dom.node_mut(id) {
            if node.numeric {
                let raw = node.attribute("value").unwrap_or("").to_string();
                node.attributes.insert("value".to_string(), format_numeric(&raw));
            }
        }
    }

    fn blur(&mut self, id: NodeId) {
        self.commit_numeric(id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        let hooks = self.blur_hooks.get(&id).cloned().unwrap_or_default();
        for mutation in hooks {
            self.apply(mutation);
        }
    }
}

/// Display a committed numeric entry: empty settles to "0" and the integer
/// part is grouped with thousands separators.
fn format_numeric(raw: &str) -> String {
    let plain: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if plain.is_empty() {
        return "0".to_string();
    }
    if plain.parse::<f64>().is_err() {
        return raw.to_string();
    }
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// In-memory [`AutomationSession`]
#[derive(Debug)]
pub struct MockSession {
    state: Mutex<MockState>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Create a session over an empty `<body>`
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                dom: MockDom::new(),
                scheduled: Vec::new(),
                click_hooks: HashMap::new(),
                blur_hooks: HashMap::new(),
                blocked_clicks: HashMap::new(),
                stale_reads: 0,
                focused: None,
                url: "about:blank".to_string(),
                ready_state: "complete".to_string(),
                viewport: (1280.0, 720.0),
                find_calls: 0,
                clicks: Vec::new(),
                offset_clicks: Vec::new(),
                sent_keys: Vec::new(),
                scripts: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle the session hands out for a node
    pub fn handle(id: NodeId) -> ElementHandle {
        ElementHandle::new(format!("{}{}", HANDLE_PREFIX, id))
    }

    /// Node behind a handle issued by this session
    pub fn node_id(element: &ElementHandle) -> Option<NodeId> {
        element.id().strip_prefix(HANDLE_PREFIX)?.parse().ok()
    }

    /// Append a node now (under the body when `parent` is `None`)
    pub fn append(&self, parent: Option<NodeId>, node: MockNode) -> NodeId {
        self.state().dom.append(parent, node)
    }

    /// Apply a mutation now, returning the affected node when it still exists
    pub fn apply(&self, mutation: MockMutation) -> Option<NodeId> {
        self.state().apply(mutation)
    }

    /// Apply a mutation once `delay` has passed
    pub fn schedule(&self, delay: Duration, mutation: MockMutation) {
        self.state().scheduled.push((Instant::now() + delay, mutation));
    }

    /// Apply a mutation `delay` after every click on `node`. Hooks belong to
    /// the node id, so a re-render drops them.
    pub fn on_click(&self, node: NodeId, delay: Duration, mutation: MockMutation) {
        self.state()
            .click_hooks
            .entry(node)
            .or_default()
            .push((delay, mutation));
    }

    /// Apply a mutation every time `node` loses focus
    pub fn on_blur(&self, node: NodeId, mutation: MockMutation) {
        self.state().blur_hooks.entry(node).or_default().push(mutation);
    }

    /// The next `count` element operations re-render their node and fail stale
    pub fn stale_next(&self, count: usize) {
        self.state().stale_reads = count;
    }

    /// The next `count` clicks on `node` are intercepted
    pub fn block_clicks(&self, node: NodeId, count: usize) {
        self.state().blocked_clicks.insert(node, count);
    }

    pub fn set_ready_state(&self, ready_state: impl Into<String>) {
        self.state().ready_state = ready_state.into();
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state().url = url.into();
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        self.state().viewport = (width, height);
    }

    /// Inspect the DOM after applying due mutations
    pub fn with_dom<R>(&self, f: impl FnOnce(&MockDom) -> R) -> R {
        let mut state = self.state();
        state.tick();
        f(&state.dom)
    }

    /// Current `value` attribute of a node
    pub fn value(&self, node: NodeId) -> Option<String> {
        self.with_dom(|dom| dom.node(node).and_then(|n| n.attribute("value").map(str::to_string)))
    }

    /// Number of `find_elements` calls so far
    pub fn find_calls(&self) -> usize {
        self.state().find_calls
    }

    /// Nodes that received a click, in order
    pub fn clicks(&self) -> Vec<NodeId> {
        self.state().clicks.clone()
    }

    /// Clicks delivered at an offset from the top-left corner
    pub fn offset_clicks(&self) -> Vec<(NodeId, f64, f64)> {
        self.state().offset_clicks.clone()
    }

    /// Every `send_keys` call with its raw input
    pub fn sent_keys(&self) -> Vec<(NodeId, String)> {
        self.state().sent_keys.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state().scripts.clone()
    }

    /// Node holding keyboard focus
    pub fn focused(&self) -> Option<NodeId> {
        self.state().focused
    }

    fn pointer_target(&self, element: &ElementHandle) -> Result<NodeId, Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        if !state.dom.is_displayed(id) {
            return Err(Error::not_interactable(format!("{} is not displayed", element)));
        }
        Ok(id)
    }
}

#[async_trait]
impl AutomationSession for MockSession {
    async fn find_elements(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, crate::Error> {
        let mut state = self.state();
        state.tick();
        state.find_calls += 1;
        let scope = scope.map(|s| state.existing(s)).transpose()?;
        Ok(state
            .find(scope, locator)?
            .into_iter()
            .map(Self::handle)
            .collect())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, crate::Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        Ok(state.dom.rendered_text(id))
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>, crate::Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        Ok(state
            .dom
            .node(id)
            .and_then(|n| n.attribute(name))
            .map(str::to_string))
    }

    async fn css_value(&self, element: &ElementHandle, property: &str) -> Result<String, crate::Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        let Some(node) = state.dom.node(id) else {
            return Ok(String::new());
        };
        if let Some(value) = node.css.get(property) {
            return Ok(value.clone());
        }
        Ok(match property {
            "width" => format!("{}px", node.rect.width),
            "height" => format!("{}px", node.rect.height),
            _ => String::new(),
        })
    }

    async fn tag_name(&self, element: &ElementHandle) -> Result<String, crate::Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        Ok(state.dom.node(id).map(|n| n.tag.clone()).unwrap_or_default())
    }

    async fn rect(&self, element: &ElementHandle) -> Result<Rect, crate::Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        Ok(state.dom.node(id).map(|n| n.rect).unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, crate::Error> {
        let mut state = self.state();
        let id = state.live(element)?;
        Ok(state.dom.is_displayed(id))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), crate::Error> {
        let id = self.pointer_target(element)?;
        let mut state = self.state();
        if let Some(remaining) = state.blocked_clicks.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::not_interactable(format!(
                    "{} would not receive the click: another element is on top",
                    element
                )));
            }
        }
        state.deliver_click(id);
        Ok(())
    }

    async fn click_at_offset(&self, element: &ElementHandle, dx: f64, dy: f64) -> Result<(), crate::Error> {
        let id = self.pointer_target(element)?;
        let mut state = self.state();
        let rect = state.dom.node(id).map(|n| n.rect).unwrap_or_default();
        if dx < 0.0 || dy < 0.0 || dx > rect.width || dy > rect.height {
            return Err(Error::not_interactable(format!(
                "offset ({}, {}) is outside {}",
                dx, dy, element
            )));
        }
        state.offset_clicks.push((id, dx, dy));
        state.deliver_click(id);
        Ok(())
    }

    async fn double_click(&self, element: &ElementHandle) -> Result<(), crate::Error> {
        self.click(element).await?;
        self.click(element).await
    }

    async fn context_click(&self, element: &ElementHandle) -> Result<(), crate::Error> {
        self.pointer_target(element).map(|_| ())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), crate::Error> {
        self.pointer_target(element).map(|_| ())
    }

    async fn send_keys(&self, element: &ElementHandle, input: &str) -> Result<(), crate::Error> {
        let id = self.pointer_target(element)?;
        let mut state = self.state();
        state.focused = Some(id);
        state.sent_keys.push((id, input.to_string()));

        for c in input.chars() {
            match c {
                keys::BACKSPACE => {
                    if let Some(node) = state.dom.node_mut(id) {
                        let value = node.attributes.entry("value".to_string()).or_default();
                        value.pop();
                    }
                }
                keys::ENTER => state.commit_numeric(id),
                keys::TAB => state.blur(id),
                c if keys::is_special(c) || c.is_control() => {}
                c => {
                    if let Some(node) = state.dom.node_mut(id) {
                        node.attributes.entry("value".to_string()).or_default().push(c);
                    }
                }
            }
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<EvaluationResult, crate::Error> {
        let mut state = self.state();
        state.tick();
        state.scripts.push(script.to_string());

        let target = match args.first() {
            Some(ScriptArg::Element(handle)) => Some(state.live(handle)?),
            _ => None,
        };

        if script.contains(".blur()") {
            if let Some(id) = target {
                state.blur(id);
            }
            return Ok(EvaluationResult::Null);
        }
        if script.contains("scrollIntoView") {
            return Ok(EvaluationResult::Null);
        }
        if script.contains("innerWidth") {
            let (width, height) = state.viewport;
            return Ok(EvaluationResult::Object(serde_json::json!([width, height])));
        }
        if script.contains("readyState") {
            return Ok(EvaluationResult::String(state.ready_state.clone()));
        }
        Ok(EvaluationResult::Null)
    }

    async fn current_url(&self) -> Result<Option<String>, crate::Error> {
        Ok(Some(self.state().url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(""), "0");
        assert_eq!(format_numeric("1000"), "1,000");
        assert_eq!(format_numeric("1,234567"), "1,234,567");
        assert_eq!(format_numeric("-1234.50"), "-1,234.50");
        assert_eq!(format_numeric("12"), "12");
        assert_eq!(format_numeric("abc"), "abc");
    }

    #[tokio::test]
    async fn test_find_by_strategies() {
        let session = MockSession::new();
        let menu = session.append(None, MockNode::new("nav").id("menu").class("top"));
        session.append(Some(menu), MockNode::new("a").text("Home"));
        session.append(Some(menu), MockNode::new("input").attr("name", "q"));

        let by_id = session.find_elements(None, &Locator::id("menu")).await.unwrap();
        assert_eq!(by_id, vec![MockSession::handle(menu)]);
        assert_eq!(session.find_elements(None, &Locator::class_name("top")).await.unwrap().len(), 1);
        assert_eq!(session.find_elements(None, &Locator::name("q")).await.unwrap().len(), 1);
        assert_eq!(session.find_elements(None, &Locator::link_text("Home")).await.unwrap().len(), 1);
        assert_eq!(session.find_elements(None, &Locator::partial_link_text("Ho")).await.unwrap().len(), 1);
        assert_eq!(
            session.find_elements(Some(&by_id[0]), &Locator::tag("a")).await.unwrap().len(),
            1
        );
        assert_eq!(session.find_calls(), 6);
    }

    #[tokio::test]
    async fn test_detached_handle_is_stale() {
        let session = MockSession::new();
        let div = session.append(None, MockNode::new("div").text("x"));
        let handle = MockSession::handle(div);
        session.apply(MockMutation::Rerender(div));

        let err = session.text(&handle).await.unwrap_err();
        assert!(err.is_stale());
        let err = session.find_elements(Some(&handle), &Locator::tag("span")).await.unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn test_injected_staleness_rerenders() {
        let session = MockSession::new();
        session.append(None, MockNode::new("p").text("hello"));
        session.stale_next(1);

        let first = session.find_elements(None, &Locator::tag("p")).await.unwrap();
        assert!(session.text(&first[0]).await.unwrap_err().is_stale());

        let second = session.find_elements(None, &Locator::tag("p")).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(session.text(&second[0]).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_send_keys_edits_value() {
        let session = MockSession::new();
        let input = session.append(None, MockNode::new("input").value("old"));
        let handle = MockSession::handle(input);

        let typed = format!("{}{}{}new\u{1b}!", keys::clear_sequence("old"), keys::ESCAPE, '\n');
        session.send_keys(&handle, &typed).await.unwrap();

        assert_eq!(session.value(input).as_deref(), Some("new!"));
        assert_eq!(session.focused(), Some(input));
    }

    #[tokio::test]
    async fn test_numeric_field_formats_on_blur() {
        let session = MockSession::new();
        let input = session.append(None, MockNode::new("input").numeric().value(""));
        let handle = MockSession::handle(input);

        session.send_keys(&handle, "1000").await.unwrap();
        assert_eq!(session.value(input).as_deref(), Some("1000"));

        session
            .execute_script("arguments[0].blur();", &[ScriptArg::Element(handle)])
            .await
            .unwrap();
        assert_eq!(session.value(input).as_deref(), Some("1,000"));
        assert_eq!(session.focused(), None);
    }

    #[tokio::test]
    async fn test_blocked_click_then_hook() {
        let session = MockSession::new();
        let button = session.append(None, MockNode::new("button"));
        session.block_clicks(button, 1);
        session.on_click(
            button,
            Duration::ZERO,
            MockMutation::Append {
                parent: None,
                node: MockNode::new("div").id("done"),
            },
        );
        let handle = MockSession::handle(button);

        assert!(matches!(session.click(&handle).await, Err(Error::NotInteractable(_))));
        session.click(&handle).await.unwrap();
        assert_eq!(session.find_elements(None, &Locator::id("done")).await.unwrap().len(), 1);
        assert_eq!(session.clicks(), vec![button]);
    }

    #[tokio::test]
    async fn test_offset_click_reaches_covered_element() {
        let session = MockSession::new();
        let field = session.append(None, MockNode::new("input"));
        session.block_clicks(field, 5);
        let handle = MockSession::handle(field);

        assert!(session.click(&handle).await.is_err());
        session.click_at_offset(&handle, 5.0, 5.0).await.unwrap();
        assert_eq!(session.focused(), Some(field));
        assert_eq!(session.offset_clicks(), vec![(field, 5.0, 5.0)]);

        let err = session.click_at_offset(&handle, 500.0, 5.0).await.unwrap_err();
        assert!(matches!(err, Error::NotInteractable(_)));
    }

    #[tokio::test]
    async fn test_scheduled_mutation_applies_after_delay() {
        let session = MockSession::new();
        session.schedule(
            Duration::from_millis(30),
            MockMutation::Append {
                parent: None,
                node: MockNode::new("span").class("late"),
            },
        );
        assert!(session.find_elements(None, &Locator::css("span.late")).await.unwrap().is_empty());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(session.find_elements(None, &Locator::css("span.late")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_hidden_element_is_not_interactable() {
        let session = MockSession::new();
        let input = session.append(None, MockNode::new("input").hidden());
        let err = session.send_keys(&MockSession::handle(input), "x").await.unwrap_err();
        assert!(matches!(err, Error::NotInteractable(_)));
    }
}

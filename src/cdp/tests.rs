//! CDP adapter tests
//!
//! Run the adapter against a scripted client and check both what it sends
//! and how it reads the replies.

use serde_json::json;
use std::sync::Arc;

use super::mock::ScriptedCdpClient;
use super::session::CdpSession;
use crate::component::ComponentPiece;
use crate::locator::Locator;
use crate::session::{keys, AutomationSession, ElementHandle, EvaluationResult, Rect, ScriptArg};
use crate::Error;

/// Test helper: adapter plus the client behind it
fn create_test_session() -> (Arc<ScriptedCdpClient>, CdpSession) {
    let client = Arc::new(ScriptedCdpClient::new());
    let session = CdpSession::new(client.clone());
    (client, session)
}

fn target(hit: bool) -> serde_json::Value {
    json!({ "x": 50.0, "y": 20.0, "displayed": true, "hit": hit })
}

#[tokio::test]
async fn test_find_elements_returns_registered_ids() {
    let (client, session) = create_test_session();
    client.script_value(json!(["known-3", "fresh-1"]));

    let found = session
        .find_elements(None, &Locator::id("app"))
        .await
        .expect("Failed to find elements");

    assert_eq!(found, vec![ElementHandle::new("known-3"), ElementHandle::new("fresh-1")]);
    let script = &client.evaluated()[0];
    assert!(script.contains("querySelectorAll(\"[id=\\\"app\\\"]\")"));
    assert!(script.contains("window.__pomIds"));
}

#[tokio::test]
async fn test_each_find_uses_a_fresh_prefix_for_new_matches() {
    let (client, session) = create_test_session();
    client.script_value(json!([])).script_value(json!([]));

    session.find_elements(None, &Locator::css("tr")).await.unwrap();
    session.find_elements(None, &Locator::css("tr")).await.unwrap();

    let prefix = |script: &str| {
        let start = script.find("id = \"").map(|i| i + 6)?;
        script[start..].split('"').next().map(str::to_string)
    };
    let scripts = client.evaluated();
    let (first, second) = (prefix(&scripts[0]), prefix(&scripts[1]));
    assert!(first.is_some());
    assert_ne!(first, second);
    assert!(scripts[0].contains("delete reg[key]"));
}

#[tokio::test]
async fn test_scoped_xpath_is_made_relative() {
    let (client, session) = create_test_session();
    client.script_value(json!([]));
    let scope = ElementHandle::new("abc-0");

    let found = session
        .find_elements(Some(&scope), &Locator::link_text("Home"))
        .await
        .expect("Failed to find elements");

    assert!(found.is_empty());
    let script = &client.evaluated()[0];
    assert!(script.contains("const scope = \"abc-0\";"));
    assert!(script.contains("document.evaluate(\".//a[normalize-space()=\\\"Home\\\"]\""));
}

#[tokio::test]
async fn test_envelope_errors() {
    let (client, session) = create_test_session();
    let element = ElementHandle::new("gone-0");

    client.script_stale();
    assert!(session.text(&element).await.unwrap_err().is_stale());

    client.evaluate_to(json!({ "invalid": "SyntaxError: ':bogus' is not a valid selector" }));
    let err = session.find_elements(None, &Locator::css(":bogus")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidLocator(_)));

    client.script_exception("TypeError: el is null");
    let err = session.tag_name(&element).await.unwrap_err();
    assert!(matches!(err, Error::ScriptExecutionFailed(ref m) if m.contains("TypeError")));

    client.fail("Runtime.evaluate", "Target closed");
    let err = session.current_url().await.unwrap_err();
    assert!(matches!(err, Error::Session(_)));
}

#[tokio::test]
async fn test_element_reads() {
    let (client, session) = create_test_session();
    let element = ElementHandle::new("p-0");

    client
        .script_value(json!("Hello"))
        .script_value(json!(null))
        .script_value(json!({ "x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0 }))
        .script_value(json!(true));

    assert_eq!(session.text(&element).await.unwrap(), "Hello");
    assert_eq!(session.attribute(&element, "title").await.unwrap(), None);
    assert_eq!(session.rect(&element).await.unwrap(), Rect::new(1.0, 2.0, 30.0, 40.0));
    assert!(session.is_displayed(&element).await.unwrap());
    assert_eq!(client.pending(), 0);
}

#[tokio::test]
async fn test_click_dispatches_mouse_events_at_center() {
    let (client, session) = create_test_session();
    client.script_value(target(true));

    session
        .click(&ElementHandle::new("p-0"))
        .await
        .expect("Failed to click");

    let events = client.calls_to("Input.dispatchMouseEvent");
    let kinds: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(kinds, ["mouseMoved", "mousePressed", "mouseReleased"]);
    assert_eq!(events[1]["x"], 50.0);
    assert_eq!(events[1]["button"], "left");
    assert_eq!(events[1]["clickCount"], 1);
}

#[tokio::test]
async fn test_intercepted_click_is_not_interactable() {
    let (client, session) = create_test_session();
    client.script_value(target(false));

    let err = session.click(&ElementHandle::new("p-0")).await.unwrap_err();
    assert!(matches!(err, Error::NotInteractable(_)));
    assert!(client.calls_to("Input.dispatchMouseEvent").is_empty());
}

#[tokio::test]
async fn test_offset_click_lands_inside_the_rect() {
    let (client, session) = create_test_session();
    client.script_value(json!({ "x": 100.0, "y": 40.0, "width": 200.0, "height": 30.0 }));

    session
        .click_at_offset(&ElementHandle::new("p-0"), 5.0, 5.0)
        .await
        .expect("Failed to click at offset");

    let events = client.calls_to("Input.dispatchMouseEvent");
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e["x"] == 105.0 && e["y"] == 45.0));
    assert!(!client.evaluated()[0].contains("elementFromPoint"));
}

#[tokio::test]
async fn test_send_keys_mixes_text_and_key_events() {
    let (client, session) = create_test_session();
    client.script_value(json!(null));

    let input = format!("{}{}ab", keys::ARROW_RIGHT, keys::BACKSPACE);
    session
        .send_keys(&ElementHandle::new("p-0"), &input)
        .await
        .expect("Failed to send keys");

    assert!(client.evaluated()[0].contains("el.focus()"));
    let key_events = client.calls_to("Input.dispatchKeyEvent");
    let keys_pressed: Vec<(&str, &str)> = key_events
        .iter()
        .filter_map(|e| Some((e["type"].as_str()?, e["key"].as_str()?)))
        .collect();
    assert_eq!(
        keys_pressed,
        [
            ("keyDown", "ArrowRight"),
            ("keyUp", "ArrowRight"),
            ("keyDown", "Backspace"),
            ("keyUp", "Backspace"),
        ]
    );
    assert_eq!(client.calls_to("Input.insertText"), vec![json!({ "text": "ab" })]);
}

#[tokio::test]
async fn test_execute_script_binds_element_arguments() {
    let (client, session) = create_test_session();
    client.script_value(json!([1280, 720]));

    let result = session
        .execute_script(
            "return [window.innerWidth, window.innerHeight];",
            &[ScriptArg::Element(ElementHandle::new("p-3")), ScriptArg::Value(json!("x"))],
        )
        .await
        .expect("Failed to execute script");

    assert_eq!(result, EvaluationResult::Object(json!([1280, 720])));
    assert!(client.evaluated()[0].contains("const args = [reg[\"p-3\"], \"x\"];"));
}

#[tokio::test]
async fn test_current_url() {
    let (client, session) = create_test_session();
    client.evaluate_to(json!("http://localhost:8088/data/perspective/client/demo"));
    assert_eq!(
        session.current_url().await.unwrap().as_deref(),
        Some("http://localhost:8088/data/perspective/client/demo")
    );
}

#[tokio::test]
async fn test_piece_over_cdp_retries_stale_read() {
    let (client, session) = create_test_session();
    client
        .script_value(json!(["a-0"]))
        .script_stale()
        .script_value(json!(["b-0"]))
        .script_value(json!("Dashboard"));

    let title = ComponentPiece::new(Locator::css("h1.title"), Arc::new(session));
    assert_eq!(title.get_text().await.unwrap(), "Dashboard");
    assert_eq!(client.evaluated().len(), 4);
}

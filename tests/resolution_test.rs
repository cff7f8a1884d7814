//! Resolution tests
//!
//! Locator composition, poller timing and re-resolution against the
//! in-memory session.

mod common;

use common::{piece, setup_app, setup_session, POLL};
use perspective_pom::locator::Locator;
use perspective_pom::session::{AutomationSession, MockMutation, MockNode};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_missing_element_times_out_within_one_interval() {
    let session = setup_session();
    let timeout = Duration::from_millis(200);
    let missing = piece(&session, Locator::css("div.never"), timeout);

    let start = Instant::now();
    let err = missing.find(None).await.expect_err("element should not be found");
    let elapsed = start.elapsed();

    assert!(err.is_not_found());
    assert!(elapsed >= timeout, "gave up early after {:?}", elapsed);
    assert!(
        elapsed < timeout + POLL + Duration::from_millis(100),
        "overshot by {:?}",
        elapsed - timeout
    );
    assert!(err.to_string().contains("css=div.never"));
}

#[tokio::test]
async fn test_zero_timeout_makes_exactly_one_attempt() {
    let session = setup_session();
    let missing = piece(&session, Locator::css("div.never"), Duration::from_secs(5));

    let start = Instant::now();
    assert!(!missing.is_present(Some(Duration::ZERO)).await.unwrap());
    assert!(start.elapsed() < POLL);
    assert_eq!(session.find_calls(), 1);
}

#[tokio::test]
async fn test_child_resolves_inside_parent_only() {
    let session = setup_session();
    let app = setup_app(&session);
    session.append(None, MockNode::new("button").class("submit").text("Outside"));
    session.append(Some(app), MockNode::new("button").class("submit").text("Inside"));

    let root = piece(&session, Locator::css("div#app"), Duration::from_millis(200));
    let submit = root.child(Locator::css("button.submit")).build();

    assert_eq!(submit.chain().to_string(), "css=div#app > css=button.submit");
    assert_eq!(submit.get_text().await.unwrap(), "Inside");
}

#[tokio::test]
async fn test_mixed_strategy_chain_resolves_step_by_step() {
    let session = setup_session();
    let app = setup_app(&session);
    let nav = session.append(Some(app), MockNode::new("nav").class("menu"));
    session.append(None, MockNode::new("a").text("Home").attr("href", "/outside"));
    session.append(Some(nav), MockNode::new("a").text("Home").attr("href", "/inside"));

    let menu = piece(&session, Locator::css("nav.menu"), Duration::from_millis(200));
    let home = menu.child(Locator::link_text("Home")).build();

    assert_eq!(home.get_attribute("href").await.unwrap().as_deref(), Some("/inside"));
}

#[tokio::test]
async fn test_set_locator_leaves_existing_children_alone() {
    let session = setup_session();
    let app = setup_app(&session);
    let left = session.append(Some(app), MockNode::new("section").id("left"));
    let right = session.append(Some(app), MockNode::new("section").id("right"));
    session.append(Some(left), MockNode::new("h2").text("Left"));
    session.append(Some(right), MockNode::new("h2").text("Right"));

    let mut panel = piece(&session, Locator::id("left"), Duration::from_millis(200));
    let heading = panel.child(Locator::tag("h2")).build();

    panel.set_locator(Locator::id("right"));

    assert_eq!(panel.child(Locator::tag("h2")).build().get_text().await.unwrap(), "Right");
    assert_eq!(heading.get_text().await.unwrap(), "Left");
    assert_eq!(heading.parent_chain().to_string(), "id=left");
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let session = setup_session();
    let app = setup_app(&session);
    session.append(Some(app), MockNode::new("span").class("status").text("Ready"));

    let status = piece(&session, Locator::css("span.status"), Duration::from_millis(200));
    let first = status.find(None).await.unwrap();
    let second = status.find(None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(status.get_text().await.unwrap(), status.get_text().await.unwrap());
}

#[tokio::test]
async fn test_rerendered_element_is_found_again() {
    let session = setup_session();
    let app = setup_app(&session);
    let label = session.append(Some(app), MockNode::new("span").class("label").text("v1"));

    let label_piece = piece(&session, Locator::css("span.label"), Duration::from_millis(200));
    let stale = label_piece.find(None).await.unwrap();

    let fresh = session
        .apply(MockMutation::Rerender(label))
        .expect("Failed to re-render label");
    session.apply(MockMutation::SetText(fresh, "v2".into()));

    assert!(session.text(&stale).await.unwrap_err().is_stale());
    assert_eq!(label_piece.get_text().await.unwrap(), "v2");
}

#[tokio::test]
async fn test_late_element_found_before_timeout() {
    let session = setup_session();
    let app = setup_app(&session);
    session.schedule(
        Duration::from_millis(60),
        MockMutation::Append {
            parent: Some(app),
            node: MockNode::new("table").class("results"),
        },
    );

    let results = piece(&session, Locator::css("table.results"), Duration::from_secs(2));
    let start = Instant::now();
    results.find(None).await.expect("Failed to find late element");
    assert!(start.elapsed() >= Duration::from_millis(60));
    assert!(start.elapsed() < Duration::from_secs(1));
}

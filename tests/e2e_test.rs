//! End-to-end page object flow
//!
//! A small login page modelled with widgets and pieces, driven through the
//! in-memory session the way a UI test would drive a browser.

mod common;

use common::{setup_session, short_waits};
use perspective_pom::component::{ComponentPiece, PieceFamily};
use perspective_pom::config::WaitConfig;
use perspective_pom::locator::Locator;
use perspective_pom::session::{AutomationSession, MockMutation, MockNode, MockSession, NodeId};
use perspective_pom::wait::{SessionReady, TextCondition, TextMatches};
use perspective_pom::widgets::{Button, TextInput};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Page object for the demo login view
struct LoginPage {
    root: ComponentPiece,
    user: TextInput,
    submit: Button,
    status: ComponentPiece,
}

impl LoginPage {
    fn new(session: Arc<dyn AutomationSession>, config: &WaitConfig) -> Self {
        let root = ComponentPiece::builder(Locator::css("div#app"), session)
            .config(config)
            .description("Application root")
            .build();
        let user = TextInput::from_piece(root.child(Locator::name("user")).build());
        let submit = Button::from_piece(
            root.child(Locator::css("button.submit"))
                .description("Submit button")
                .build(),
        );
        let status = root.child(Locator::css("span.status")).build();
        Self {
            root,
            user,
            submit,
            status,
        }
    }
}

fn build_login_dom(session: &MockSession) -> (NodeId, NodeId) {
    let app = session.append(None, MockNode::new("div").id("app"));
    session.append(Some(app), MockNode::new("input").attr("name", "user").value(""));
    let button = session.append(Some(app), MockNode::new("button").class("submit").text("Log in"));
    session.append(Some(app), MockNode::new("span").class("status").text("Idle"));
    (app, button)
}

#[tokio::test]
async fn test_click_settles_and_results_appear() {
    let session = setup_session();
    session.set_url("http://localhost:8088/data/perspective/client/demo");
    let (app, button) = build_login_dom(&session);

    // clicking starts a slow request; results render 100ms later
    session.on_click(
        button,
        Duration::from_millis(100),
        MockMutation::Append {
            parent: Some(app),
            node: MockNode::new("table").class("results").text("3 rows"),
        },
    );

    let config = short_waits(Duration::from_secs(1));
    let page = LoginPage::new(session.clone(), &config);

    let url = page
        .root
        .wait_until(&SessionReady, None)
        .await
        .expect("Session never became ready");
    assert!(url.ends_with("/client/demo"));

    page.user.set_text("admin").await.expect("Failed to type user name");

    let start = Instant::now();
    page.submit
        .click_and_settle(Duration::from_millis(500))
        .await
        .expect("Failed to click submit");
    assert!(start.elapsed() >= Duration::from_millis(500));

    let results = page.root.child(Locator::css("table.results")).build();
    assert_eq!(results.get_text().await.unwrap(), "3 rows");
}

#[tokio::test]
async fn test_status_text_wait() {
    let session = setup_session();
    let (app, button) = build_login_dom(&session);
    let status = session
        .with_dom(|dom| dom.children(app).last().copied())
        .expect("status span missing");
    session.on_click(button, Duration::from_millis(80), MockMutation::SetText(status, "Welcome, admin".into()));

    let config = short_waits(Duration::from_secs(1));
    let page = LoginPage::new(session.clone(), &config);
    page.submit.click().await.unwrap();

    let text = page
        .status
        .wait_on_text_condition(Some("Welcome"), TextCondition::Contains, None)
        .await
        .unwrap();
    assert_eq!(text, "Welcome, admin");

    let welcomed = TextMatches::contains(Locator::css("div#app span.status"), "admin");
    let element = page.root.wait_until(&welcomed, None).await.unwrap();
    assert_eq!(session.text(&element).await.unwrap(), "Welcome, admin");
}

#[tokio::test]
async fn test_rows_as_piece_family() {
    let session = setup_session();
    let table = session.append(None, MockNode::new("table").id("orders"));
    for (i, name) in ["pump", "valve", "tank"].iter().enumerate() {
        let row = session.append(Some(table), MockNode::new("tr").attr("data-row-index", i.to_string()));
        session.append(Some(row), MockNode::new("td").class("name").text(*name));
    }

    let config = short_waits(Duration::from_millis(300));
    let orders = ComponentPiece::builder(Locator::id("orders"), session.clone())
        .config(&config)
        .build();
    let names = PieceFamily::under(&orders, |row: &usize| {
        Locator::css(format!("tr[data-row-index=\"{}\"] td.name", row))
    });

    assert_eq!(names.get(&2).get_text().await.unwrap(), "tank");
    assert_eq!(names.get(&0).get_text().await.unwrap(), "pump");
    assert!(!names.get(&7).is_present(Some(Duration::ZERO)).await.unwrap());
    assert_eq!(names.len(), 3);
}

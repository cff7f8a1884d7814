//! [`AutomationSession`] over a CDP page target

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

use super::input::{self, Keystroke};
use super::scripts::{self, CallArg, Query};
use super::traits::CdpClient;
use super::types::*;
use crate::locator::Locator;
use crate::session::{AutomationSession, ElementHandle, EvaluationResult, Rect, ScriptArg};
use crate::Error;

/// Drives a page through `Runtime.evaluate` and the `Input` domain.
///
/// Element handles are ids into a page-global registry, so a handle goes
/// stale exactly when its node is detached from the document.
#[derive(Debug, Clone)]
pub struct CdpSession {
    client: Arc<dyn CdpClient>,
}

impl CdpSession {
    pub fn new(client: Arc<dyn CdpClient>) -> Self {
        Self { client }
    }

    /// Underlying protocol client
    pub fn client(&self) -> &Arc<dyn CdpClient> {
        &self.client
    }

    /// Evaluate an expression and return its JSON value
    async fn evaluate(&self, expression: String) -> Result<Value, Error> {
        trace!(%expression, "Runtime.evaluate");
        let params = serde_json::to_value(EvaluateParams::by_value(expression))?;
        let raw = self.client.call_method("Runtime.evaluate", params).await?;
        let response: EvaluateResponse = serde_json::from_value(raw)?;
        if let Some(details) = response.exception_details {
            return Err(Error::script_execution_failed(details.message()));
        }
        Ok(response.result.value.unwrap_or(Value::Null))
    }

    /// Evaluate a registry script and unwrap its envelope
    async fn run(&self, script: String) -> Result<Value, Error> {
        let envelope: ScriptEnvelope = serde_json::from_value(self.evaluate(script).await?)?;
        if envelope.stale {
            return Err(Error::stale("element is no longer attached to the document"));
        }
        if let Some(message) = envelope.invalid {
            return Err(Error::invalid_locator(message));
        }
        Ok(envelope.value)
    }

    async fn on_element<T: DeserializeOwned>(&self, element: &ElementHandle, body: &str) -> Result<T, Error> {
        let value = self.run(scripts::on_element(element.id(), body)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Scroll the element into view and check it would receive a pointer event
    async fn pointer_target(&self, element: &ElementHandle) -> Result<PointerTarget, Error> {
        let target: PointerTarget = self.on_element(element, scripts::POINTER_TARGET).await?;
        if !target.displayed {
            return Err(Error::not_interactable(format!("{} has no rendered box", element)));
        }
        if !target.hit {
            return Err(Error::not_interactable(format!(
                "{} would not receive the click: another element is on top at ({}, {})",
                element, target.x, target.y
            )));
        }
        Ok(target)
    }

    async fn mouse(&self, params: MouseEventParams) -> Result<(), Error> {
        self.client
            .call_method("Input.dispatchMouseEvent", serde_json::to_value(params)?)
            .await
            .map(|_| ())
    }

    async fn press(&self, target: PointerTarget, button: &'static str, click_count: u32) -> Result<(), Error> {
        for kind in ["mousePressed", "mouseReleased"] {
            self.mouse(MouseEventParams {
                r#type: kind,
                x: target.x,
                y: target.y,
                button: Some(button),
                click_count: Some(click_count),
            })
            .await?;
        }
        Ok(())
    }

    async fn move_to(&self, target: PointerTarget) -> Result<(), Error> {
        self.mouse(MouseEventParams {
            r#type: "mouseMoved",
            x: target.x,
            y: target.y,
            button: None,
            click_count: None,
        })
        .await
    }

    async fn key(&self, key: input::KeyDefinition) -> Result<(), Error> {
        for kind in ["keyDown", "keyUp"] {
            let params = KeyEventParams {
                r#type: kind,
                key: key.key,
                code: key.code,
                windows_virtual_key_code: key.virtual_key_code,
            };
            self.client
                .call_method("Input.dispatchKeyEvent", serde_json::to_value(params)?)
                .await?;
        }
        Ok(())
    }

    fn query_for(scope: Option<&ElementHandle>, locator: &Locator) -> Result<Query, Error> {
        if let Some(css) = locator.css_fragment() {
            return Ok(Query::Css(css));
        }
        match locator.xpath_fragment() {
            Some(xpath) if scope.is_some() && xpath.starts_with('/') => Ok(Query::XPath(format!(".{}", xpath))),
            Some(xpath) => Ok(Query::XPath(xpath)),
            None => Err(Error::invalid_locator(format!("{} has no page query", locator))),
        }
    }
}

fn to_evaluation_result(value: Value) -> EvaluationResult {
    match value {
        Value::Null => EvaluationResult::Null,
        Value::Bool(b) => EvaluationResult::Bool(b),
        Value::Number(n) => n.as_f64().map(EvaluationResult::Number).unwrap_or(EvaluationResult::Null),
        Value::String(s) => EvaluationResult::String(s),
        other => EvaluationResult::Object(other),
    }
}

#[async_trait]
impl AutomationSession for CdpSession {
    async fn find_elements(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> Result<Vec<ElementHandle>, Error> {
        let query = Self::query_for(scope, locator)?;
        let prefix = Uuid::new_v4().simple().to_string();
        let script = scripts::find(scope.map(ElementHandle::id), &query, &prefix);
        let ids: Vec<String> = serde_json::from_value(self.run(script).await?)?;
        debug!(%locator, count = ids.len(), "find_elements");
        Ok(ids.into_iter().map(ElementHandle::new).collect())
    }

    async fn text(&self, element: &ElementHandle) -> Result<String, Error> {
        let text: Option<String> = self.on_element(element, scripts::TEXT).await?;
        Ok(text.unwrap_or_default())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> Result<Option<String>, Error> {
        self.on_element(element, &scripts::attribute(name)).await
    }

    async fn css_value(&self, element: &ElementHandle, property: &str) -> Result<String, Error> {
        self.on_element(element, &scripts::css_value(property)).await
    }

    async fn tag_name(&self, element: &ElementHandle) -> Result<String, Error> {
        self.on_element(element, scripts::TAG_NAME).await
    }

    async fn rect(&self, element: &ElementHandle) -> Result<Rect, Error> {
        let rect: ClientRect = self.on_element(element, scripts::RECT).await?;
        Ok(rect.into())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, Error> {
        self.on_element(element, scripts::IS_DISPLAYED).await
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), Error> {
        let target = self.pointer_target(element).await?;
        self.move_to(target).await?;
        self.press(target, "left", 1).await
    }

    async fn click_at_offset(&self, element: &ElementHandle, dx: f64, dy: f64) -> Result<(), Error> {
        let rect = self.rect(element).await?;
        if dx < 0.0 || dy < 0.0 || dx > rect.width || dy > rect.height {
            return Err(Error::not_interactable(format!(
                "offset ({}, {}) is outside {}",
                dx, dy, element
            )));
        }
        let target = PointerTarget {
            x: rect.x + dx,
            y: rect.y + dy,
            displayed: true,
            hit: true,
        };
        self.move_to(target).await?;
        self.press(target, "left", 1).await
    }

    async fn double_click(&self, element: &ElementHandle) -> Result<(), Error> {
        let target = self.pointer_target(element).await?;
        self.move_to(target).await?;
        self.press(target, "left", 1).await?;
        self.press(target, "left", 2).await
    }

    async fn context_click(&self, element: &ElementHandle) -> Result<(), Error> {
        let target = self.pointer_target(element).await?;
        self.move_to(target).await?;
        self.press(target, "right", 1).await
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), Error> {
        let target = self.pointer_target(element).await?;
        self.move_to(target).await
    }

    async fn send_keys(&self, element: &ElementHandle, keys: &str) -> Result<(), Error> {
        let _: Value = self.on_element(element, scripts::FOCUS).await?;
        for step in input::plan(keys) {
            match step {
                Keystroke::Text(text) => {
                    let params = serde_json::to_value(InsertTextParams { text })?;
                    self.client.call_method("Input.insertText", params).await?;
                }
                Keystroke::Key(key) => self.key(key).await?,
            }
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: &[ScriptArg]) -> Result<EvaluationResult, Error> {
        let args: Vec<CallArg<'_>> = args
            .iter()
            .map(|a| match a {
                ScriptArg::Element(el) => CallArg::Element(el.id()),
                ScriptArg::Value(v) => CallArg::Value(v),
            })
            .collect();
        let value = self.run(scripts::call(script, &args)).await?;
        Ok(to_evaluation_result(value))
    }

    async fn current_url(&self) -> Result<Option<String>, Error> {
        let value = self.evaluate(scripts::CURRENT_URL.to_string()).await?;
        Ok(value.as_str().map(str::to_string))
    }
}

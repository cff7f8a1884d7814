//! Mutating interactions: clicks, typing, scrolling
//!
//! Every mutating call ends with the piece's settle wait (or a per-call
//! one), and `set_text` verifies its own effect before returning.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::piece::{ComponentPiece, TextSource};
use super::resolver;
use super::scripts;
use crate::locator::Locator;
use crate::session::{keys, ScriptArg};
use crate::wait::{normalize_input_text, Comparison, Poller, SettleWait, TextCondition};
use crate::{Error, Result};

/// Where `set_text` clicks a field whose center is covered
pub const INTERCEPTED_CLICK_OFFSET: (f64, f64) = (5.0, 5.0);

/// Options for [`ComponentPiece::click_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClickOptions {
    /// How long to wait for the element and for it to accept the click
    pub timeout: Option<Duration>,
    /// Overrides the piece's settle wait
    pub settle: Option<SettleWait>,
    /// Offset from the top-left corner to click when the center is covered
    pub fallback_offset: Option<(f64, f64)>,
}

impl ClickOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time for resolving the element and getting the click accepted
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Settle wait after the click lands
    pub fn settle(mut self, settle: impl Into<SettleWait>) -> Self {
        self.settle = Some(settle.into());
        self
    }

    /// Click at `(dx, dy)` from the top-left corner whenever a center click
    /// is intercepted
    pub fn fallback_offset(mut self, dx: f64, dy: f64) -> Self {
        self.fallback_offset = Some((dx, dy));
        self
    }
}

/// Options for [`ComponentPiece::set_text`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTextOptions {
    /// Blur the field after typing so commit-on-blur fields apply the value
    pub release_focus: bool,
    /// Overrides the piece's settle wait; also extends the verification window
    pub settle: Option<SettleWait>,
    /// How the field's value is compared with what was typed
    pub comparison: Comparison,
    /// What the field shows once emptied
    pub empty_value: Option<String>,
}

impl Default for SetTextOptions {
    fn default() -> Self {
        Self {
            release_focus: true,
            settle: None,
            comparison: Comparison::Text(TextCondition::Equals),
            empty_value: None,
        }
    }
}

impl SetTextOptions {
    /// Whether to blur the field after typing
    pub fn release_focus(mut self, release: bool) -> Self {
        self.release_focus = release;
        self
    }

    /// Settle wait after typing; also widens the verification window
    pub fn settle(mut self, settle: impl Into<SettleWait>) -> Self {
        self.settle = Some(settle.into());
        self
    }

    /// Comparison used to verify the field's value
    pub fn comparison(mut self, comparison: impl Into<Comparison>) -> Self {
        self.comparison = comparison.into();
        self
    }

    /// Value the field shows once emptied, e.g. `"0"` for numeric fields
    pub fn empty_value(mut self, value: impl Into<String>) -> Self {
        self.empty_value = Some(value.into());
        self
    }
}

impl ComponentPiece {
    fn settle_or_default(&self, settle: Option<SettleWait>) -> SettleWait {
        settle.unwrap_or(self.settle)
    }

    /// Click with the piece's default wait and settle
    pub async fn click(&self) -> Result<()> {
        self.click_with(ClickOptions::default()).await
    }

    /// Resolve the element, then keep clicking until it accepts the click
    /// (elements can be attached before they are interactable), then settle.
    ///
    /// The timeout covers both steps: clicking polls only for whatever the
    /// resolution left over.
    #[instrument(skip(self, options), fields(chain = %self.chain()))]
    pub async fn click_with(&self, options: ClickOptions) -> Result<()> {
        let policy = self.policy.overridden(options.timeout, None);
        let start = Instant::now();
        self.find_with_policy(policy).await?;
        let remaining = policy.timeout().saturating_sub(start.elapsed());

        let session = self.session.as_ref();
        let chain = self.chain();
        let fallback = options.fallback_offset;
        let outcome = Poller::new(policy.with_timeout(remaining))
            .poll(move || async move {
                let Some(element) = resolver::query(session, chain).await?.into_iter().next() else {
                    return Ok(None);
                };
                let clicked = match (session.click(&element).await, fallback) {
                    (Err(Error::NotInteractable(reason)), Some((dx, dy))) => {
                        debug!(%reason, dx, dy, "Center click intercepted, clicking at offset");
                        session.click_at_offset(&element, dx, dy).await
                    }
                    (result, _) => result,
                };
                match clicked {
                    Ok(()) => Ok(Some(())),
                    Err(Error::NotInteractable(reason)) => {
                        debug!(%reason, "Element not ready for click");
                        Ok(None)
                    }
                    Err(e) if e.is_stale() => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;

        outcome.ok_or_else(|t| {
            Error::not_interactable(format!(
                "{} never accepted a click within {:?} ({} attempts)",
                chain, t.elapsed, t.attempts
            ))
        })?;
        self.settle_or_default(options.settle).observe().await;
        Ok(())
    }

    /// Click at `(dx, dy)` from the element's top-left corner, then settle
    #[instrument(skip(self, settle), fields(chain = %self.chain()))]
    pub async fn click_with_offset(&self, dx: f64, dy: f64, settle: Option<SettleWait>) -> Result<()> {
        let session = self.session.as_ref();
        self.retry_on_stale("click_with_offset", move |el| async move {
            session.click_at_offset(&el, dx, dy).await
        })
        .await?;
        self.settle_or_default(settle).observe().await;
        Ok(())
    }

    /// Double click, then settle
    #[instrument(skip(self, settle), fields(chain = %self.chain()))]
    pub async fn double_click(&self, settle: Option<SettleWait>) -> Result<()> {
        let session = self.session.as_ref();
        self.retry_on_stale("double_click", move |el| async move { session.double_click(&el).await })
            .await?;
        self.settle_or_default(settle).observe().await;
        Ok(())
    }

    /// Context click, then settle
    #[instrument(skip(self, settle), fields(chain = %self.chain()))]
    pub async fn right_click(&self, settle: Option<SettleWait>) -> Result<()> {
        let session = self.session.as_ref();
        self.retry_on_stale("right_click", move |el| async move { session.context_click(&el).await })
            .await?;
        self.settle_or_default(settle).observe().await;
        Ok(())
    }

    /// Move the pointer over the element
    pub async fn hover(&self) -> Result<()> {
        let session = self.session.as_ref();
        self.retry_on_stale("hover", move |el| async move { session.hover(&el).await })
            .await
    }

    /// Scroll vertically so the element is in view
    pub async fn scroll_to_element(&self, align_to_top: bool) -> Result<()> {
        let session = self.session.as_ref();
        let script = scripts::scroll_into_view(align_to_top);
        let script = script.as_str();
        self.retry_on_stale("scroll_to_element", move |el| async move {
            session
                .execute_script(script, &[ScriptArg::Element(el)])
                .await
                .map(|_| ())
        })
        .await
    }

    /// Fire a blur on the element
    pub async fn release_focus(&self) -> Result<()> {
        let session = self.session.as_ref();
        self.retry_on_stale("release_focus", move |el| async move {
            session
                .execute_script(scripts::BLUR_SCRIPT, &[ScriptArg::Element(el)])
                .await
                .map(|_| ())
        })
        .await
    }

    /// The element keystrokes go to: this piece when it is an `<input>` or
    /// `<textarea>`, otherwise the first `<input>` inside it
    pub async fn input_field(&self) -> Result<ComponentPiece> {
        let tag = self.tag_name().await?;
        if tag.eq_ignore_ascii_case("input") || tag.eq_ignore_ascii_case("textarea") {
            return Ok(self.clone());
        }
        Ok(self
            .child(Locator::tag("input"))
            .description("internal <input>")
            .build())
    }

    /// Replace the field's value with `text` and verify it took effect.
    ///
    /// Control characters and special keys are typed but not expected in
    /// the result. Existing content is cleared with one keystroke pair per
    /// character currently shown. A field whose center is covered is clicked
    /// at [`INTERCEPTED_CLICK_OFFSET`] instead. Fails with `Postcondition`
    /// when the field never shows the expected value.
    #[instrument(skip(self, text, options), fields(chain = %self.chain()))]
    pub async fn set_text(&self, text: &str, options: SetTextOptions) -> Result<()> {
        let normalized = normalize_input_text(text);
        let expected = if normalized.is_empty() {
            options.empty_value.clone().unwrap_or_default()
        } else {
            normalized
        };
        let typed = if text.is_empty() {
            format!(" {}", keys::BACKSPACE)
        } else {
            text.to_string()
        };
        let settle = self.settle_or_default(options.settle);
        let value = TextSource::value();

        let field = self.input_field().await?;
        field
            .wait_on_source(
                &value,
                Some(""),
                TextCondition::DoesNotEqual.into(),
                Some(self.text_prefill_wait),
            )
            .await?;
        let current = field.read_source(&value).await?;
        let keystrokes = format!("{}{}", keys::clear_sequence(&current), typed);

        self.scroll_to_element(true).await?;
        let (dx, dy) = INTERCEPTED_CLICK_OFFSET;
        field
            .click_with(
                ClickOptions::default()
                    .settle(SettleWait::none())
                    .fallback_offset(dx, dy),
            )
            .await?;
        let session = self.session.as_ref();
        let keystrokes = keystrokes.as_str();
        field
            .retry_on_stale("set_text", move |el| async move { session.send_keys(&el, keystrokes).await })
            .await?;
        if options.release_focus {
            field.release_focus().await?;
        }

        let window = settle.duration() + self.text_verify_grace;
        let observed = field
            .wait_on_source(&value, Some(&expected), options.comparison, Some(window))
            .await?;
        if !options.comparison.matches(&observed, &expected) {
            warn!(%expected, %observed, "Field did not take the typed value");
            return Err(Error::postcondition(self.chain().to_string(), expected, observed));
        }

        settle.observe().await;
        Ok(())
    }
}

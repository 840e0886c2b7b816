use super::Assertions;
use crate::driver::selectors::{
    self, DIFF_VIEWER, METRIC_CPA, METRIC_CTR, METRIC_ROAS, PATCH_CARD, UPLOADED_FILES,
};
use crate::error::{HarnessError, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

const TEXT_POLL_INTERVAL: Duration = Duration::from_millis(250);

impl Assertions<'_> {
    /// `selector` becomes visible within `timeout`, or the UI timeout.
    pub async fn assert_visible(&self, selector: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.ui_timeout);
        self.ui
            .wait_for_visible(selector, timeout)
            .await
            .map_err(|e| HarnessError::assertion(format!("{selector} not visible: {e}")))?;
        info!(selector, "Element visible");
        Ok(())
    }

    /// The text of `selector` contains `expected` within the UI timeout.
    pub async fn assert_contains_text(&self, selector: &str, expected: &str) -> Result<String> {
        let started = Instant::now();
        let mut last_seen = None;
        loop {
            if let Ok(text) = self.ui.text_of(selector).await {
                if text.contains(expected) {
                    info!(selector, expected, "Element contains text");
                    return Ok(text);
                }
                last_seen = Some(text);
            }
            if started.elapsed() >= self.ui_timeout {
                break;
            }
            tokio::time::sleep(TEXT_POLL_INTERVAL.min(self.ui_timeout)).await;
        }

        Err(HarnessError::assertion(match last_seen {
            Some(text) => format!("{selector} text {text:?} does not contain {expected:?}"),
            None => format!("{selector} never rendered text containing {expected:?}"),
        }))
    }

    /// The card for `patch_id`, or any patch card.
    pub async fn assert_patch_card_visible(&self, patch_id: Option<&str>) -> Result<()> {
        match patch_id {
            Some(id) => self.assert_visible(&selectors::patch_card(id), None).await,
            None => self.assert_visible(PATCH_CARD, None).await,
        }
    }

    pub async fn assert_diff_viewer_visible(&self) -> Result<()> {
        self.assert_visible(DIFF_VIEWER, None).await
    }

    /// CTR, CPA and ROAS cards all render.
    pub async fn assert_metric_cards_visible(&self) -> Result<()> {
        for card in [METRIC_CTR, METRIC_CPA, METRIC_ROAS] {
            self.assert_visible(card, None).await?;
        }
        Ok(())
    }

    pub async fn assert_file_uploaded(&self, file_name: &str) -> Result<()> {
        self.assert_contains_text(UPLOADED_FILES, file_name)
            .await
            .map(|_| ())
    }
}

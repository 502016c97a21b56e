//! Page rendering abstraction
//!
//! A renderer opens a session (a browser tab, or just an HTTP client), loads
//! a URL, waits for the page to settle and hands back the final DOM as HTML.
//! Sessions must be released on every path, including failures.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::RendererConfig;
use crate::utils::error::RenderError;

/// Timing knobs for one render
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Budget for navigation plus network quiescence
    pub navigation_timeout: Duration,

    /// How long the network must stay quiet before the page counts as loaded
    pub network_idle: Duration,

    /// Selector awaited after navigation; a miss is not an error
    pub wait_selector: Option<String>,

    pub selector_timeout: Duration,

    /// Extra delay for client-side rendering after the selector wait
    pub settle_delay: Duration,

    pub poll_interval: Duration,

    pub user_agent: String,
}

impl RenderOptions {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            network_idle: Duration::from_millis(config.network_idle_ms),
            wait_selector: config.wait_selector.clone(),
            selector_timeout: Duration::from_secs(config.selector_timeout_secs),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&RendererConfig::default())
    }
}

/// Source of render sessions
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Open a fresh session
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// A single rendering context
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to `url` and return the settled DOM
    async fn render(&mut self, url: &str, options: &RenderOptions) -> Result<String, RenderError>;

    /// Release the session
    async fn close(self: Box<Self>) -> Result<(), RenderError>;
}

/// Render one page, always closing the session afterwards
///
/// A close failure is logged and never masks the render outcome.
pub async fn render_page(
    renderer: &dyn PageRenderer,
    url: &str,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    let mut session = renderer.open().await?;
    let result = session.render(url, options).await;

    if let Err(e) = session.close().await {
        tracing::warn!(renderer = renderer.name(), error = %e, "Failed to close render session");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingRenderer {
        closes: Arc<AtomicUsize>,
        fail: bool,
        fail_close: bool,
    }

    struct CountingSession {
        closes: Arc<AtomicUsize>,
        fail: bool,
        fail_close: bool,
    }

    #[async_trait]
    impl PageRenderer for CountingRenderer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
            Ok(Box::new(CountingSession {
                closes: Arc::clone(&self.closes),
                fail: self.fail,
                fail_close: self.fail_close,
            }))
        }
    }

    #[async_trait]
    impl RenderSession for CountingSession {
        async fn render(
            &mut self,
            url: &str,
            options: &RenderOptions,
        ) -> Result<String, RenderError> {
            if self.fail {
                return Err(RenderError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_secs: options.navigation_timeout.as_secs(),
                });
            }
            Ok("<html></html>".to_string())
        }

        async fn close(self: Box<Self>) -> Result<(), RenderError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(RenderError::MalformedResponse("close failed".to_string()));
            }
            Ok(())
        }
    }

    fn renderer(fail: bool, fail_close: bool) -> (CountingRenderer, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        (
            CountingRenderer {
                closes: Arc::clone(&closes),
                fail,
                fail_close,
            },
            closes,
        )
    }

    #[tokio::test]
    async fn test_session_closed_after_success() {
        let (r, closes) = renderer(false, false);
        let html = render_page(&r, "http://x", &RenderOptions::default()).await.unwrap();
        assert_eq!(html, "<html></html>");
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_closed_after_failure() {
        let (r, closes) = renderer(true, false);
        let err = render_page(&r, "http://x", &RenderOptions::default()).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_does_not_mask_result() {
        let (r, closes) = renderer(false, true);
        let html = render_page(&r, "http://x", &RenderOptions::default()).await;
        assert!(html.is_ok());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_options_from_default_config() {
        let options = RenderOptions::default();
        assert_eq!(options.navigation_timeout, Duration::from_secs(30));
        assert_eq!(options.selector_timeout, Duration::from_secs(15));
        assert_eq!(options.settle_delay, Duration::from_secs(2));
        assert_eq!(
            options.wait_selector.as_deref(),
            Some("div.draw-game-header__card")
        );
    }
}

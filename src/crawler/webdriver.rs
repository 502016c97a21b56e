//! Headless browser rendering over the W3C WebDriver protocol
//!
//! Talks to any WebDriver endpoint (chromedriver, geckodriver, a Selenium
//! grid) with plain HTTP. One render is:
//!
//! 1. `POST /session` with headless capabilities and the configured user agent
//! 2. `POST /session/{id}/url`, bounded by the navigation timeout
//! 3. Poll the page until `readyState` is complete and the resource count has
//!    stopped changing for the idle window
//! 4. Poll for the wait selector (a miss only logs a warning)
//! 5. Sleep the settle delay, then read `GET /session/{id}/source`
//! 6. `DELETE /session/{id}`

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

use super::render::{PageRenderer, RenderOptions, RenderSession};
use crate::config::RendererConfig;
use crate::utils::error::RenderError;

/// Reports document readiness and how many resources have been fetched so far
const NETWORK_STATE_SCRIPT: &str = "return { \
    readyState: document.readyState, \
    resources: (window.performance && performance.getEntriesByType) \
        ? performance.getEntriesByType('resource').length : 0 \
};";

/// Slack on top of the navigation budget for the HTTP call carrying it
const TRANSPORT_GRACE: Duration = Duration::from_secs(5);

/// Browser renderer driven through a WebDriver endpoint
pub struct WebDriverRenderer {
    client: Client,
    endpoint: String,
    capabilities: Value,
}

impl WebDriverRenderer {
    /// Create a renderer for the driver at `config.webdriver_url`
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Http` if the HTTP client cannot be created
    pub fn new(config: &RendererConfig) -> Result<Self, RenderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.webdriver_url.trim_end_matches('/').to_string(),
            capabilities: build_capabilities(config),
        })
    }

    /// Driver endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Build `alwaysMatch` capabilities for the configured browser
pub fn build_capabilities(config: &RendererConfig) -> Value {
    let browser = config.browser.to_ascii_lowercase();
    let binary = config
        .browser_binary
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned());

    let mut caps = json!({
        "browserName": browser,
        "pageLoadStrategy": "normal",
        "timeouts": {
            "pageLoad": config.navigation_timeout_secs * 1000,
            "script": 10_000,
        },
    });

    if browser == "firefox" {
        let mut args = Vec::new();
        if config.headless {
            args.push("-headless".to_string());
        }
        let mut options = json!({
            "args": args,
            "prefs": { "general.useragent.override": config.user_agent },
        });
        if let Some(binary) = binary {
            options["binary"] = json!(binary);
        }
        caps["moz:firefoxOptions"] = options;
    } else {
        let mut args = vec![
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--window-size=1366,900".to_string(),
            format!("--user-agent={}", config.user_agent),
        ];
        if config.headless {
            args.insert(0, "--headless=new".to_string());
        }
        let mut options = json!({ "args": args });
        if let Some(binary) = binary {
            options["binary"] = json!(binary);
        }
        caps["goog:chromeOptions"] = options;
    }

    caps
}

/// Split a WebDriver reply into its `value`, turning error objects into errors
fn unwrap_value(status: reqwest::StatusCode, payload: Value) -> Result<Value, RenderError> {
    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    let error = value.get("error").and_then(Value::as_str);
    if !status.is_success() || error.is_some() {
        return Err(RenderError::WebDriver {
            error: error.unwrap_or("unknown error").to_string(),
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(value)
}

#[async_trait]
impl PageRenderer for WebDriverRenderer {
    fn name(&self) -> &str {
        "webdriver"
    }

    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let body = json!({ "capabilities": { "alwaysMatch": self.capabilities } });

        let response = self
            .client
            .post(format!("{}/session", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::SessionStart(e.to_string()))?;

        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RenderError::SessionStart(format!("unreadable reply: {e}")))?;

        let value = unwrap_value(status, payload).map_err(|e| match e {
            RenderError::WebDriver { error, message } => {
                RenderError::SessionStart(format!("{error}: {message}"))
            }
            other => other,
        })?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::SessionStart("reply carried no sessionId".to_string()))?
            .to_string();

        tracing::debug!(
            session = %session_id,
            endpoint = %self.endpoint,
            "WebDriver session opened"
        );

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/session/{}", self.endpoint, session_id),
            closed: false,
        }))
    }
}

/// An open browser session
pub struct WebDriverSession {
    client: Client,
    session_url: String,
    closed: bool,
}

impl WebDriverSession {
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<Value, RenderError> {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.session_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RenderError::MalformedResponse(e.to_string()))?;

        unwrap_value(status, payload)
    }

    async fn navigate(
        &self,
        url: &str,
        options: &RenderOptions,
        deadline: Instant,
    ) -> Result<(), RenderError> {
        let budget = deadline.saturating_duration_since(Instant::now()) + TRANSPORT_GRACE;

        match self
            .command(Method::POST, "/url", Some(json!({ "url": url })), Some(budget))
            .await
        {
            Ok(_) => Ok(()),
            Err(RenderError::Http(e)) if e.is_timeout() => Err(timeout_error(url, options)),
            Err(RenderError::WebDriver { error, .. }) if error == "timeout" => {
                Err(timeout_error(url, options))
            }
            Err(e) => Err(e),
        }
    }

    /// Wait until the document is complete and no new resources appear for
    /// the idle window
    async fn wait_for_network_idle(
        &self,
        url: &str,
        options: &RenderOptions,
        deadline: Instant,
    ) -> Result<(), RenderError> {
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();

        loop {
            let state = self
                .command(
                    Method::POST,
                    "/execute/sync",
                    Some(json!({ "script": NETWORK_STATE_SCRIPT, "args": [] })),
                    None,
                )
                .await?;

            let complete = state.get("readyState").and_then(Value::as_str) == Some("complete");
            let count = state.get("resources").and_then(Value::as_u64).unwrap_or(0);
            let now = Instant::now();

            if !complete || last_count != Some(count) {
                last_count = Some(count);
                quiet_since = now;
            } else if now.duration_since(quiet_since) >= options.network_idle {
                return Ok(());
            }

            if now >= deadline {
                return Err(timeout_error(url, options));
            }

            tokio::time::sleep(options.poll_interval).await;
        }
    }

    /// Poll for `selector`; returns whether it showed up in time
    async fn wait_for_selector(
        &self,
        selector: &str,
        options: &RenderOptions,
    ) -> Result<bool, RenderError> {
        let deadline = Instant::now() + options.selector_timeout;

        loop {
            let found = self
                .command(
                    Method::POST,
                    "/elements",
                    Some(json!({ "using": "css selector", "value": selector })),
                    None,
                )
                .await?;

            if found.as_array().is_some_and(|elements| !elements.is_empty()) {
                return Ok(true);
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }

            tokio::time::sleep(options.poll_interval).await;
        }
    }
}

fn timeout_error(url: &str, options: &RenderOptions) -> RenderError {
    RenderError::NavigationTimeout {
        url: url.to_string(),
        timeout_secs: options.navigation_timeout.as_secs(),
    }
}

#[async_trait]
impl RenderSession for WebDriverSession {
    async fn render(&mut self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
        let deadline = Instant::now() + options.navigation_timeout;

        self.navigate(url, options, deadline).await?;
        self.wait_for_network_idle(url, options, deadline).await?;

        if let Some(selector) = options.wait_selector.as_deref() {
            if !self.wait_for_selector(selector, options).await? {
                tracing::warn!(
                    url,
                    selector,
                    timeout_secs = options.selector_timeout.as_secs(),
                    "Selector did not appear, snapshotting anyway"
                );
            }
        }

        if !options.settle_delay.is_zero() {
            tokio::time::sleep(options.settle_delay).await;
        }

        let source = self.command(Method::GET, "/source", None, None).await?;
        source
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                RenderError::MalformedResponse("page source was not a string".to_string())
            })
    }

    async fn close(mut self: Box<Self>) -> Result<(), RenderError> {
        self.closed = true;
        self.command(Method::DELETE, "", None, None).await?;
        tracing::debug!(session = %self.session_url, "WebDriver session closed");
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        // Dropped without close (e.g. the task was cancelled); release the browser anyway
        let client = self.client.clone();
        let url = self.session_url.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = client.delete(&url).send().await {
                    tracing::warn!(
                        session = %url,
                        error = %e,
                        "Failed to release abandoned session"
                    );
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_chrome_capabilities() {
        let config = RendererConfig::default();
        let caps = build_capabilities(&config);

        assert_eq!(caps["browserName"], "chrome");
        assert_eq!(caps["timeouts"]["pageLoad"], 30_000);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args
            .iter()
            .any(|a| a.as_str().unwrap().starts_with("--user-agent=Mozilla/5.0")));
        assert!(caps["goog:chromeOptions"].get("binary").is_none());
    }

    #[test]
    fn test_headful_chrome_with_binary() {
        let config = RendererConfig {
            headless: false,
            browser_binary: Some(PathBuf::from("/opt/chrome/chrome")),
            ..Default::default()
        };
        let caps = build_capabilities(&config);

        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
        assert_eq!(caps["goog:chromeOptions"]["binary"], "/opt/chrome/chrome");
    }

    #[test]
    fn test_firefox_capabilities() {
        let config = RendererConfig {
            browser: "Firefox".to_string(),
            ..Default::default()
        };
        let caps = build_capabilities(&config);

        assert_eq!(caps["browserName"], "firefox");
        assert_eq!(caps["moz:firefoxOptions"]["args"][0], "-headless");
        assert!(caps["moz:firefoxOptions"]["prefs"]["general.useragent.override"].is_string());
    }

    #[test]
    fn test_unwrap_value_error_object() {
        let payload = json!({ "value": { "error": "timeout", "message": "page load" } });
        let err = unwrap_value(reqwest::StatusCode::INTERNAL_SERVER_ERROR, payload).unwrap_err();
        match err {
            RenderError::WebDriver { error, message } => {
                assert_eq!(error, "timeout");
                assert_eq!(message, "page load");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwrap_value_success() {
        let payload = json!({ "value": null });
        let value = unwrap_value(reqwest::StatusCode::OK, payload).unwrap();
        assert!(value.is_null());
    }
}

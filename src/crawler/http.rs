//! Plain HTTP renderer
//!
//! Fetches the server-sent HTML without running scripts. Useful for pages
//! that ship their results in the initial markup, for saved fixtures served
//! over HTTP, and when no WebDriver endpoint is available.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;

use super::render::{PageRenderer, RenderOptions, RenderSession};
use crate::utils::error::RenderError;

/// Renderer backed by a single reqwest client
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// # Errors
    ///
    /// Returns `RenderError::Http` if the HTTP client cannot be created
    pub fn new() -> Result<Self, RenderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .gzip(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    fn name(&self) -> &str {
        "http"
    }

    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
        }))
    }
}

struct HttpSession {
    client: Client,
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn render(&mut self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &options.user_agent)
            .timeout(options.navigation_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderError::NavigationTimeout {
                        url: url.to_string(),
                        timeout_secs: options.navigation_timeout.as_secs(),
                    }
                } else {
                    RenderError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::ServerError(status.as_u16()));
        }

        Ok(response.text().await?)
    }

    async fn close(self: Box<Self>) -> Result<(), RenderError> {
        Ok(())
    }
}

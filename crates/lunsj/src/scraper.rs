use std::future::Future;

use reqwest::Client;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Received empty response from {0}")]
    EmptyBody(String),
    #[error("Response from {url} is not valid UTF-8: {source}")]
    InvalidEncoding {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Downloads a menu page. Implemented by [`WebScraper`]; tests swap in their own.
pub trait Fetch {
    fn fetch_html(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for WebScraper {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()
            .inspect_err(|e| log::error!("HTTP status error: {e}"))?
            .bytes()
            .await
            .inspect_err(|e| log::error!("Body error: {e:?}"))?;

        let html = String::from_utf8(bytes.to_vec()).map_err(|source| {
            FetchError::InvalidEncoding {
                url: url.to_string(),
                source,
            }
        })?;
        if html.trim().is_empty() {
            return Err(FetchError::EmptyBody(url.to_string()));
        }
        Ok(html)
    }
}

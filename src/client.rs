use std::time::Duration;

use async_trait::async_trait;
use error_chain::bail;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::*;

/// The one capability the resolvers need from the network: GET a url and
/// parse the body as JSON.
#[async_trait]
pub trait LcdFetch: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;
}

pub struct RestClient {
    http: reqwest::Client,
}

impl RestClient {
    pub fn new() -> Result<RestClient> {
        // Public LCDs can be slow; 20s bounds the worst case without
        // giving up on a healthy but busy node.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(RestClient { http })
    }
}

#[async_trait]
impl LcdFetch for RestClient {
    async fn get_json(&self, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .chain_err(|| format!("GET {} failed", url))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("GET {} returned HTTP {}", url, status);
        }
        resp.json::<Value>()
            .await
            .chain_err(|| format!("failed to decode JSON from {}", url))
    }
}

/// `base` and `path` joined with exactly one slash between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// A cursor-paginated response: a batch of items plus an opaque
/// continuation key.
pub trait Page {
    type Item;

    fn next_key(&self) -> Option<String>;
    fn into_items(self) -> Vec<Self::Item>;
}

/// Fetch every page of `path` under `base_url`, following `pagination.key`
/// cursors until a response comes back without one. Any failed request
/// fails the whole fetch; partial results are never returned.
pub async fn fetch_all<P>(
    fetch: &dyn LcdFetch,
    base_url: &str,
    path: &str,
    page_size: u32,
) -> Result<Vec<P::Item>>
where
    P: Page + DeserializeOwned,
{
    let resource = join_url(base_url, path);
    let mut items = Vec::new();
    let mut next_key: Option<String> = None;

    loop {
        let mut url = format!("{}?pagination.limit={}", resource, page_size);
        if let Some(key) = &next_key {
            // cursors are base64 and can carry + / =
            url.push_str(&format!("&pagination.key={}", urlencoding::encode(key)));
        }
        let page: P = serde_json::from_value(fetch.get_json(&url).await?)?;
        next_key = page.next_key().filter(|k| !k.is_empty());
        items.extend(page.into_items());
        if next_key.is_none() {
            break;
        }
    }
    Ok(items)
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use error_chain::bail;
    use serde_json::Value;

    use super::LcdFetch;
    use crate::errors::*;

    /// In-memory stand-in keyed by exact url; anything unregistered fails
    /// the way an unreachable endpoint would.
    pub struct MockLcd {
        responses: HashMap<String, Value>,
        requests: Mutex<Vec<String>>,
    }

    impl MockLcd {
        pub fn new() -> MockLcd {
            MockLcd {
                responses: HashMap::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn on(mut self, url: &str, body: Value) -> MockLcd {
            self.responses.insert(url.to_string(), body);
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LcdFetch for MockLcd {
        async fn get_json(&self, url: &str) -> Result<Value> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some(body) => Ok(body.clone()),
                None => bail!("GET {} returned HTTP 404 Not Found", url),
            }
        }
    }
}

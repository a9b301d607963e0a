use reqwest::{Client, ClientBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::{DashError, Result};
use crate::state::RankingWindow;

pub const BROKER_RANKING_PATH: &str = "data/broker_ranking.json";
pub const BROKER_TRADES_PATH: &str = "data/broker_trades_latest.json";
pub const TARGET_BROKERS_PATH: &str = "data/target_broker_trades.json";

pub fn timeseries_path(code: &str) -> String {
    format!("data/timeseries/{code}.json")
}

pub fn ranking_path(window: RankingWindow) -> String {
    format!("data/top_three_inst_change_{}_up.json", window.days())
}

/// Plain GET against the static JSON tree. No retry, no cache, no timeout:
/// the caller decides what a failure looks like on screen.
#[derive(Clone, Debug)]
pub struct DataFetcher {
    client: Client,
    base: Url,
}

impl DataFetcher {
    pub fn new(base_url: &str) -> Result<DataFetcher> {
        Ok(DataFetcher {
            client: build_http_client()?,
            base: parse_base_url(base_url)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| DashError::InvalidUrl(format!("{path}: {err}")))
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "fetching");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        decode_response(status, &body)
    }
}

/// Status check first, then JSON decoding of the full body.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T> {
    if !(200..300).contains(&status) {
        return Err(DashError::Fetch { status });
    }
    Ok(serde_json::from_slice(body)?)
}

fn parse_base_url(value: &str) -> Result<Url> {
    let trimmed = value.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).map_err(|err| DashError::InvalidUrl(format!("{trimmed}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DashError::InvalidUrl(format!(
            "{trimmed}: unsupported scheme `{other}`"
        ))),
    }
}

fn build_http_client() -> Result<Client> {
    Ok(ClientBuilder::new()
        .user_agent(concat!("inst-ratio-dash/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::dispatch::{LoadOutcome, LoadRequest};
use crate::fetcher::{
    BROKER_RANKING_PATH, BROKER_TRADES_PATH, DataFetcher, TARGET_BROKERS_PATH, ranking_path,
    timeseries_path,
};

/// One fetch per request, awaited in full. Requests are not coordinated:
/// whichever response arrives last is what ends up on screen.
pub async fn run_load(fetcher: &DataFetcher, request: LoadRequest) -> LoadOutcome {
    match request {
        LoadRequest::Stock { code, toggles } => {
            let result = fetcher.fetch_json(&timeseries_path(&code)).await;
            LoadOutcome::Stock {
                code,
                toggles,
                result,
            }
        }
        LoadRequest::Ranking { window } => LoadOutcome::Ranking {
            window,
            result: fetcher.fetch_json(&ranking_path(window)).await,
        },
        LoadRequest::BrokerRanking => {
            LoadOutcome::BrokerRanking(fetcher.fetch_json(BROKER_RANKING_PATH).await)
        }
        LoadRequest::BrokerTrades => {
            LoadOutcome::BrokerTrades(fetcher.fetch_json(BROKER_TRADES_PATH).await)
        }
        LoadRequest::TargetBrokers => {
            LoadOutcome::TargetBrokers(fetcher.fetch_json(TARGET_BROKERS_PATH).await)
        }
    }
}

pub fn spawn_load(
    fetcher: DataFetcher,
    request: LoadRequest,
    tx: mpsc::UnboundedSender<Command>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(?request, "load started");
        let outcome = run_load(&fetcher, request).await;
        match outcome.failure() {
            Some((kind, message)) => {
                tracing::warn!(panel = outcome.panel(), kind, %message, "load failed")
            }
            None => tracing::info!(panel = outcome.panel(), "load finished"),
        }
        let _ = tx.send(Command::Loaded(outcome));
    })
}

mod broker;
mod chart;
mod command;
mod config;
mod dispatch;
mod error;
mod error_log;
mod fetcher;
mod format;
mod loader;
mod logging;
mod model;
mod ranking;
mod series;
mod state;
mod table;
mod tabs;
mod tui;

use anyhow::anyhow;
use clap::Parser;
use tokio::sync::mpsc;

use crate::command::Command;
use crate::dispatch::Dashboard;
use crate::error_log::ErrorLogStore;
use crate::fetcher::DataFetcher;
use crate::tui::TuiApp;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let param = config::CliParams::parse();
    let _log_guard = logging::init(&param.log_dir)?;
    let fetcher = DataFetcher::new(&param.base_url)?;
    tracing::info!(base = %fetcher.base(), "dashboard starting");

    let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
    let dashboard = Dashboard::new(param.initial_view_state(), param.default_code());
    let error_log = ErrorLogStore::in_dir(&param.log_dir);
    match error_log.load() {
        Ok(entries) => tracing::info!(previous_failures = entries.len(), "error log opened"),
        Err(err) => tracing::warn!(%err, "error log unreadable"),
    }
    let mut app = TuiApp::new(
        dashboard,
        fetcher,
        tx.clone(),
        param.market_codes(),
        error_log,
    );

    let app_result = tokio::select! {
        result = app.run(&mut rx) => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    let _ = tx.send(Command::Exit);
    app.dispose();
    tracing::info!("dashboard stopped");
    app_result.map_err(|err| anyhow!(err.to_string()))?;
    Ok(())
}

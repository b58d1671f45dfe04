use binance_rest::{AggregateRequest, BinanceRestClient, ClientConfig};
use model::AccountType;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How often the clock offset is refreshed while the process runs.
const TIME_SYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Command line: `portfolio [--usd] [--deadline-secs N] [ACCOUNT_TYPE...]`
#[derive(Debug)]
struct Args {
    request: AggregateRequest,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut request = AggregateRequest::default();
    let mut types = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--usd" => request = request.with_usd_valuation(),
            "--deadline-secs" => {
                let secs = args
                    .next()
                    .and_then(|v| v.parse::<u64>().ok())
                    .ok_or("--deadline-secs needs a number of seconds")?;
                request = request.with_deadline(Duration::from_secs(secs));
            }
            other => types.push(other.parse::<AccountType>()?),
        }
    }

    if !types.is_empty() {
        request.account_types = types.into_iter().collect();
    }
    Ok(Args { request })
}

#[tokio::main]
async fn main() -> ExitCode {
    common::init_logging();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            error!(error = %e, "Invalid arguments");
            return ExitCode::FAILURE;
        }
    };

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    info!(
        environment = %config.environment,
        account_types = ?args.request.account_types,
        "Starting portfolio snapshot"
    );

    if config.environment.is_testnet() {
        info!("Using testnet, balances are not real funds");
    }

    let client = match BinanceRestClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!(error = %e, "Failed to build client");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = client.sync_time().await {
        warn!(error = %e, "Initial time sync failed, continuing with local clock");
    }
    let sync_handle = client.spawn_time_sync(TIME_SYNC_INTERVAL);

    let outcome = tokio::select! {
        result = client.portfolio_snapshot(args.request) => Some(result),
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, abandoning snapshot");
            None
        }
    };

    sync_handle.abort();

    let code = match outcome {
        Some(Ok(snapshot)) => {
            print!("{}", snapshot);
            if let Some(total) = snapshot.total_usd_value() {
                println!("Estimated total: {} USD", total.round_dp(2));
            }
            if snapshot.is_complete() {
                ExitCode::SUCCESS
            } else {
                warn!(failed = ?snapshot.failed_types(), "Snapshot is incomplete");
                ExitCode::from(2)
            }
        }
        Some(Err(e)) => {
            error!(error = %e, "Snapshot failed");
            ExitCode::FAILURE
        }
        None => ExitCode::FAILURE,
    };

    let metrics = client.metrics().snapshot();
    info!(status = %metrics.health_status(), "Client health");
    print!("{}", metrics);

    code
}

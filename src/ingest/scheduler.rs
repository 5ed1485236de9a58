use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::writer::ingest_source;
use crate::storage::Database;

/// The poll interval didn't parse. This is the only error the scheduler
/// surfaces, and it surfaces before the loop starts.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid poll interval '{0}': expected a value like \"30s\", \"5m\", or \"1h\"")]
pub struct InvalidInterval(pub String);

/// Parse human-friendly intervals like "90s", "5m", "1h", "2h30m".
///
/// A unit-less number, an unknown unit, or a zero total is rejected.
pub fn parse_interval(input: &str) -> Result<Duration, InvalidInterval> {
    let mut total_secs: u64 = 0;
    let mut num_buf = String::new();
    let mut has_unit = false;

    for ch in input.chars() {
        if ch.is_ascii_digit() {
            num_buf.push(ch);
        } else {
            let n: u64 = num_buf
                .parse()
                .map_err(|_| InvalidInterval(input.to_string()))?;
            num_buf.clear();
            match ch {
                'h' => total_secs += n * 3600,
                'm' => total_secs += n * 60,
                's' => total_secs += n,
                _ => return Err(InvalidInterval(input.to_string())),
            }
            has_unit = true;
        }
    }

    // Trailing digits with no unit
    if !num_buf.is_empty() {
        return Err(InvalidInterval(input.to_string()));
    }

    if has_unit && total_secs > 0 {
        Ok(Duration::from_secs(total_secs))
    } else {
        Err(InvalidInterval(input.to_string()))
    }
}

/// Drive the polling loop: one cycle immediately, then one per elapsed
/// interval, until `shutdown` fires.
///
/// Each tick selects the single least-recently-polled source and runs one
/// fetch→parse→write cycle for it. Every per-cycle failure is logged and
/// contained; nothing that happens inside a cycle can stop the loop. Ticks
/// missed while a cycle overruns the interval are dropped, not queued.
///
/// The shutdown signal is raced against both the tick wait and the
/// in-flight cycle, so even a hanging fetch cannot delay termination.
pub async fn run(
    db: Database,
    client: reqwest::Client,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(interval_secs = interval.as_secs(), "collecting feeds");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                tracing::info!("shutting down");
                return;
            }
        }

        tokio::select! {
            _ = run_cycle(&db, &client) => {}
            _ = shutdown.changed() => {
                tracing::info!("shutting down mid-cycle");
                return;
            }
        }
    }
}

async fn run_cycle(db: &Database, client: &reqwest::Client) {
    let source = match db.next_due_source().await {
        Ok(Some(source)) => source,
        Ok(None) => {
            tracing::info!("no source due for polling");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "couldn't select next source");
            return;
        }
    };

    tracing::info!(source = %source.name, url = %source.url, "polling source");

    if let Err(e) = ingest_source(db, client, &source).await {
        tracing::error!(source = %source.name, error = %e, "poll cycle failed");
    }
}

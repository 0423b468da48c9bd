//! Portfolio Feeds - cached YouTube listings for the portfolio site
//!
//! Loads the "latest" and "most viewed" video feeds through a local TTL cache
//! and manages the cached entries.

use std::process;

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use portfolio_feeds::app::App;
use portfolio_feeds::cli::Cli;
use portfolio_feeds::config::{Action, Config};
use portfolio_feeds::output::{render_cache_report, render_feed, render_metrics};

/// Sends logs to stderr so stdout stays clean for listings and JSON
fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("portfolio_feeds={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (config, action) = match Config::from_cli(&cli) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, "invalid arguments");
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let app = App::new(&config);

    match action {
        Action::ShowVideos {
            feeds,
            refresh,
            json,
        } => {
            let results = app.load_many(&feeds.kinds(), refresh).await;

            if json {
                let payload: serde_json::Map<String, serde_json::Value> = results
                    .iter()
                    .map(|(kind, state)| {
                        let body = serde_json::json!({
                            "data": state.data,
                            "error": state.error,
                        });
                        (kind.cache_key().to_string(), body)
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (kind, state) in &results {
                    println!("{}", render_feed(*kind, state));
                }
            }
        }
        Action::CacheInfo => {
            print!("{}", render_cache_report(&app.cache_report(), app.now_millis()));
        }
        Action::CacheClear { key } if !app.cache_available() => {
            let target = key.as_deref().unwrap_or("all entries");
            println!("Cache is disabled; nothing cleared ({}).", target);
        }
        Action::CacheClear { key } => {
            app.clear_cache(key.as_deref());
            match key {
                Some(key) => println!("Cache for {} cleared successfully!", key),
                None => println!("Cache cleared successfully!"),
            }
        }
    }

    debug!("{}", render_metrics(&app.metrics()));
    Ok(())
}

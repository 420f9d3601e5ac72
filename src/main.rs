use trendwatch::config::MonitorConfig;
use trendwatch::engine::TrendEngine;
use trendwatch::notify::{AlertFormatter, NtfySink};
use trendwatch::provider::BinanceProvider;
use trendwatch::scheduler::run_cycle;

use anyhow::Result;
use log::info;
use std::env;
use tokio::time::{Duration, MissedTickBehavior, interval};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG not set
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    env_logger::init();
    info!("Starting trend alignment monitor");

    // Get config file from command line argument or use default
    let args: Vec<String> = env::args().collect();
    let config_file = if args.len() > 1 {
        &args[1]
    } else {
        "config.json"
    };

    info!("Loading configuration from: {}", config_file);
    let config = MonitorConfig::load_from_file(config_file)?;

    let engine = TrendEngine::new(&config)?;
    let provider = BinanceProvider::new(&config.provider)?;
    let sink = NtfySink::new(&config.notifier)?;
    let formatter = AlertFormatter::from_config(&config);

    info!(
        "Watching {} instruments on {}",
        config.instruments.len(),
        engine
            .resolutions()
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut cycle_interval = interval(Duration::from_secs(config.cycle_interval_secs));
    cycle_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cycle_interval.tick() => {
                run_cycle(&config, &engine, &provider, &sink, &formatter).await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested, stopping monitor");
                break;
            }
        }
    }

    Ok(())
}

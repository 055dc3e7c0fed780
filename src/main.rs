use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use pricewatch::PricewatchError;
use pricewatch::config::fetch_config;
use pricewatch::feed::{Monitor, RandomWalk};
use pricewatch::observer::Observer;
use pricewatch::observers::ConsoleObserver;
use pricewatch::subject::PriceSubject;

/// Update after which the analyst stops watching.
const ANALYST_LEAVES_AFTER: usize = 5;

#[tokio::main]
async fn main() -> Result<(), PricewatchError> {
    // Library logs go to stderr so they do not interleave with observer output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = fetch_config()?;
    let simulation = &config.simulation;

    let subject = Arc::new(PriceSubject::from_config(&config));
    let trader: Arc<dyn Observer> = Arc::new(ConsoleObserver::new("Trader"));
    let analyst: Arc<dyn Observer> = Arc::new(ConsoleObserver::new("Analyst"));
    let alert_bot: Arc<dyn Observer> = Arc::new(ConsoleObserver::new("Alert Bot"));
    subject.register(Arc::clone(&trader));
    subject.register(Arc::clone(&analyst));
    subject.register(Arc::clone(&alert_bot));

    let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default().unsigned_abs();
    let source = RandomWalk::new(simulation.start_price, seed);
    let monitor = Monitor::new(Arc::clone(&subject), source, simulation.symbols.clone());

    println!("Starting market simulation for {}...", simulation.symbols.join(", "));

    for update in 1..=simulation.updates {
        println!("\n--- Update {update} ---");
        monitor.run_for(1).await?;

        if update == ANALYST_LEAVES_AFTER {
            println!("\n[System] The Analyst has stopped watching prices.");
            subject.unregister(&analyst);
        }

        tokio::time::sleep(simulation.interval).await;
    }

    Ok(())
}

//! Accord demo client.
//!
//! Composition root: reads configuration from the environment, loads the
//! bundled plan templates and starting world, starts the runtime and plays a
//! scripted parlour session against it.
//!
//! ```bash
//! RUST_LOG=debug ACCORD_TICK_MS=0 cargo run -p accord-client
//! ```

mod logging;
mod scenario;

use accord_content::{TemplateLoader, WorldLoader};
use accord_runtime::{Runtime, RuntimeConfig, Topic};
use anyhow::Result;

const TEMPLATES: &str = include_str!("../content/templates.ron");
const WORLD: &str = include_str!("../content/world.ron");

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = logging::setup_logging()?;

    let config = RuntimeConfig::from_env()?;
    tracing::info!(?config, "Starting accord client");

    let templates = TemplateLoader::parse(TEMPLATES)?;
    let loaded = WorldLoader::parse(WORLD)?;
    let names = scenario::Names::new(&loaded);

    let runtime = Runtime::builder()
        .config(config)
        .world(loaded.world.clone())
        .build()
        .await?;
    let handle = runtime.handle();

    let printers = vec![
        tokio::spawn(scenario::print_notices(
            handle.subscribe(Topic::Notice),
            names.clone(),
        )),
        tokio::spawn(scenario::log_events(handle.subscribe(Topic::Proposal))),
        tokio::spawn(scenario::log_events(handle.subscribe(Topic::Effect))),
    ];

    scenario::run(&handle, &loaded, &templates).await?;

    drop(handle);
    runtime.shutdown().await?;
    for printer in printers {
        printer.await?;
    }

    tracing::info!("Client shutdown complete");
    Ok(())
}

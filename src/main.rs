use std::sync::Arc;
use std::time::Duration;

mod api;
mod config;
mod error;
mod geometry;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Build the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg));

    logger::log_server_start(&addr, &cfg);
    server::start_signal_handler(Arc::clone(&state))?;

    server::start_server_loop(listener, Arc::clone(&state)).await;

    let grace = Duration::from_secs(cfg.performance.shutdown_grace);
    let remaining = server::wait_for_drain(&state, grace).await;
    logger::log_shutdown_complete(remaining);

    Ok(())
}

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

mod api;
mod assets;
mod config;
mod handler;
mod http;
mod logger;
mod observability;
mod routing;
mod server;

use server::{ServerLoopConfig, ServiceKind};

/// Config file used when no path is given, without extension
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let cfg = config::Config::load_from(&config_path)?;
    cfg.validate()?;
    logger::init(&cfg)?;

    if !cfg.test_domain_is_configured() {
        logger::log_warning(&format!(
            "Local test domain '{}' is not in the domain list; {:?} will get 404s",
            cfg.site.localhost_test_domain, cfg.site.local_aliases
        ));
    }

    // Everything is read into memory before the first request is accepted
    let routes = cfg.domain_routes();
    let assets = assets::AssetCache::build(&routes);
    if assets.is_empty() {
        logger::log_warning("No static files were loaded; static requests will all get 404");
    }

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, routes, assets))
}

async fn async_main(
    cfg: config::Config,
    routes: Vec<routing::DomainRoute>,
    assets: assets::AssetCache,
) -> Result<(), Box<dyn std::error::Error>> {
    let app_addr = cfg.get_socket_addr()?;

    let metrics_handle = if cfg.metrics.enabled {
        let handle = observability::install_recorder()?;
        let upkeep = handle.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(observability::UPKEEP_INTERVAL);
            loop {
                interval.tick().await;
                upkeep.run_upkeep();
            }
        });
        Some(handle)
    } else {
        None
    };
    observability::record_asset_cache(&routes, &assets);

    let app_listener = server::create_reusable_listener(app_addr)?;
    let metrics_listener = if cfg.metrics.enabled {
        let addr = cfg.get_metrics_socket_addr()?;
        Some((addr, server::create_reusable_listener(addr)?))
    } else {
        None
    };

    let state = Arc::new(config::AppState::new(cfg, routes, assets, metrics_handle));
    logger::log_server_start(&app_addr, &state.config);
    logger::log_site_summary(&state.config, &state.assets);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let app_connections = Arc::new(AtomicUsize::new(0));
    let metrics_connections = Arc::new(AtomicUsize::new(0));

    let app_task = tokio::spawn(server::start_server_loop(
        app_listener,
        Arc::clone(&state),
        Arc::clone(&app_connections),
        ServerLoopConfig {
            service: ServiceKind::App,
            shutdown: shutdown_rx.clone(),
        },
    ));

    let metrics_task = metrics_listener.map(|(addr, listener)| {
        logger::log_metrics_start(&addr, &state.config.metrics.path);
        tokio::spawn(server::start_server_loop(
            listener,
            Arc::clone(&state),
            Arc::clone(&metrics_connections),
            ServerLoopConfig {
                service: ServiceKind::Metrics,
                shutdown: shutdown_rx.clone(),
            },
        ))
    });

    let signal = server::signal::wait_for_shutdown().await?;
    logger::log_shutdown_signal(signal);
    shutdown_tx.send_replace(true);

    app_task.await?;
    if let Some(task) = metrics_task {
        task.await?;
    }

    let counters = [app_connections, metrics_connections];
    let active: usize = counters
        .iter()
        .map(|c| c.load(std::sync::atomic::Ordering::SeqCst))
        .sum();
    logger::log_shutdown_started(active);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace_period);
    let remaining = server::drain_connections(&counters, grace).await;
    logger::log_shutdown_complete(remaining);

    Ok(())
}

//! Service binary: configuration, route wiring, listener.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use stub_attribution::adapters::storage::Storage;
use stub_attribution::handlers::{routes, StubHandler};
use stub_attribution::{
    Config, DirectHandler, ErrorReporter, RedirectHandler, ReturnMode, StubFetcher, StubService,
    Validator,
};

/// Path of the version manifest baked into the deployment image.
const VERSION_FILE_PATH: &str = "/app/version.json";

#[derive(serde::Deserialize)]
struct VersionInfo {
    version: Option<String>,
}

/// Release tag from the deployment's version manifest, when present.
fn read_release() -> Option<String> {
    let contents = std::fs::read(VERSION_FILE_PATH).ok()?;
    serde_json::from_slice::<VersionInfo>(&contents).ok()?.version
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            // Logging is not up yet; this is a startup failure either way.
            eprintln!("invalid configuration: {err}");
            std::process::exit(1);
        }
    };

    let default_level = if config.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    if config.debug_mode {
        log::debug!("debug mode is enabled");
    }

    let reporter = ErrorReporter::new(&config.sentry_dsn);
    if reporter.enabled() {
        match read_release() {
            Some(release) => log::info!("error reporting enabled release={release}"),
            None => log::info!("error reporting enabled"),
        }
    }

    let fetcher = StubFetcher::new();
    let handler = match config.return_mode {
        ReturnMode::Redirect => {
            log::info!(
                "starting in redirect mode bucket={} prefix={} cdn={}",
                config.bucket,
                config.key_prefix,
                config.cdn_prefix
            );
            let storage = match Storage::from_config(&config).await {
                Ok(storage) => Arc::new(storage),
                Err(err) => {
                    log::error!("could not create storage backend: {err}");
                    std::process::exit(1);
                }
            };
            StubHandler::Redirect(RedirectHandler::new(
                fetcher,
                storage,
                &config.cdn_prefix,
                &config.key_prefix,
                &config.base_url,
            ))
        }
        ReturnMode::Direct => {
            log::info!("starting in direct mode");
            StubHandler::Direct(DirectHandler::new(fetcher, &config.base_url))
        }
    };

    let validator = Validator::new(&config.hmac_key, config.hmac_timeout);
    let stub_service = Arc::new(StubService::new(
        handler,
        validator,
        reporter,
        &config.base_url,
    ));

    let addr: SocketAddr = match config.addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            log::error!("invalid listen address {}: {err}", config.addr);
            std::process::exit(1);
        }
    };

    let api = routes::routes(
        stub_service,
        config.hmac_key.clone(),
        PathBuf::from(VERSION_FILE_PATH),
    );

    log::info!("listening on {addr}");
    warp::serve(api).run(addr).await;
}

pub mod licensing;

use std::process::ExitCode;

use licensing::config::load_dotenv;
use licensing::{Gate, GateConfig, GateStatus, Resolver};

/// Exit code when the gate decides the site stays offline
const EXIT_OFFLINE: u8 = 3;

/// Exit code for configuration or startup failures
const EXIT_CONFIG: u8 = 2;

pub fn run() -> ExitCode {
    let dotenv = load_dotenv();

    // Respects RUST_LOG (default: info)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match dotenv {
        Ok(Some(path)) => log::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => log::warn!("Ignoring unreadable .env file: {}", e),
    }

    let once = std::env::args().skip(1).any(|arg| arg == "--once");

    let config = match GateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if config.permissive {
        log::info!("Permissive mode: local fallback always shows the site");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    runtime.block_on(async move {
        if once {
            resolve_once(config).await
        } else {
            watch(config).await
        }
    })
}

/// Resolve a single time and report the result
async fn resolve_once(config: GateConfig) -> ExitCode {
    let resolver = match Resolver::from_config(config) {
        Ok(resolver) => resolver,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let resolution = resolver.resolve_detailed().await;
    print_json(&resolution);

    if resolution.decision.is_visible {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_OFFLINE)
    }
}

/// Poll until interrupted, printing every published status
async fn watch(config: GateConfig) -> ExitCode {
    let gate = match Gate::from_config(config) {
        Ok(gate) => gate,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let mut rx = gate.subscribe();
    gate.start();

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let GateStatus::Ready(resolution) = &*rx.borrow_and_update() {
                    print_json(resolution);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, stopping");
                break;
            }
        }
    }

    gate.stop();
    ExitCode::SUCCESS
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize status: {}", e),
    }
}

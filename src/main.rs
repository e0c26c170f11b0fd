pub mod models {
    pub mod sensibo;
}

pub mod client;
pub mod config;
pub mod env_file;
pub mod policy;
pub mod schedule;
pub mod snapshot;
pub mod sync;
pub mod units;

use crate::client::SensiboClient;
use crate::config::Config;
use crate::env_file::LoadedEnvFile;
use crate::policy::Policy;
use crate::schedule::local_now;
use crate::sync::{DeviceService, run_cycle};
use chrono_tz::Tz;
use log::{error, info};
use std::io::Write;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

/// Printed to stdout after every successful cycle; counted by log-based monitoring.
pub const SUCCESS_MARKER: &str = "SENSIBO_SETTING_SUCCESS";

/// One cycle; the marker is written to `out` only when the cycle succeeded.
fn sync_once<S, W>(service: &S, policy: &Policy, tz: Tz, out: &mut W) -> Result<(), String>
where
    S: DeviceService + ?Sized,
    W: Write,
{
    let now = local_now(tz);
    let report = run_cycle(service, policy, &now).map_err(|e| format!("sync failed: {}", e))?;
    info!(
        "Cycle complete for pod {} at {} (active={}, decision={}, pushed smartMode={}, pushed acState={})",
        report.pod_id,
        now.format("%a %H:%M %Z"),
        report.active,
        report.decision,
        report.pushed_smart_mode,
        report.pushed_ac_state
    );
    writeln!(out, "{}", SUCCESS_MARKER)
        .and_then(|_| out.flush())
        .map_err(|e| format!("writing success marker failed: {}", e))
}

pub fn run() -> Result<(), String> {
    let cfg = Config::from_env().map_err(|e| format!("configuration error: {}", e))?;
    info!(
        "Config loaded (base_url={}, pod_id={}, timezone={}, http_timeout={}s, sync_interval={})",
        cfg.base_url,
        cfg.pod_id.as_ref().map(|p| p.0.as_str()).unwrap_or("-"),
        cfg.timezone,
        cfg.http_timeout.as_secs(),
        cfg.sync_interval
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "once".to_string())
    );

    let client = SensiboClient::new(&cfg.base_url, &cfg.api_key, cfg.http_timeout, cfg.pod_id.clone());
    let policy = Policy::default();
    let mut stdout = std::io::stdout();

    // Single cycle, or a steady cadence where every cycle stands alone
    let Some(interval) = cfg.sync_interval else {
        return sync_once(&client, &policy, cfg.timezone, &mut stdout);
    };
    info!("Starting sync loop: interval={}s", interval.as_secs());
    loop {
        let tick_start = Instant::now();
        if let Err(e) = sync_once(&client, &policy, cfg.timezone, &mut stdout) {
            error!("{}; retrying next interval", e);
        }
        if let Some(rest) = interval.checked_sub(tick_start.elapsed()) {
            thread::sleep(rest);
        }
    }
}

fn init_logging(loaded_env: Option<&LoadedEnvFile>) {
    // RUST_LOG may come from the env file, so this runs after it was loaded.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    match loaded_env {
        Some(LoadedEnvFile { path, explicit: true }) => {
            info!("Environment loaded from --env-file {}", path.display())
        }
        Some(LoadedEnvFile { path, explicit: false }) => info!("Environment loaded from {}", path.display()),
        None => {}
    }
    info!(
        "sensibo-scheduler {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
}

fn main() -> ExitCode {
    let loaded_env = match env_file::configure_from_cli(std::env::args().skip(1)) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("fatal: {}", err);
            return ExitCode::FAILURE;
        }
    };
    init_logging(loaded_env.as_ref());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fatal: {}", e);
            ExitCode::FAILURE
        }
    }
}

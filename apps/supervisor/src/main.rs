pub mod config;
pub mod control;
pub mod limiter;
pub mod readings;
pub mod schedule;
pub mod sink;
pub mod web;

use anyhow::{Context, Result};
use chrono::Local;
use flow_correction::FlowTemperatureCorrector;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{SupervisorConfig, DEFAULT_CONFIG_PATH};
use crate::control::Supervisor;
use crate::sink::FileSink;
use crate::web::{create_web_server, ServerState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).compact().init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = SupervisorConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    info!(
        "decrease={} correction={} hysteresis={} work_state={} interval={}s",
        config.correction.decrease(),
        config.correction.correction(),
        config.correction.hysteresis(),
        config.room.work_state,
        config.control.interval_secs
    );

    let server_state = Arc::new(RwLock::new(ServerState {
        work_state: config.room.work_state,
        schedule: config.room.schedule.describe(),
        ..ServerState::default()
    }));

    let web_state = server_state.clone();
    let bind_addr = config.web.bind_addr.clone();
    tokio::spawn(async move {
        if let Err(e) = create_web_server(web_state, &bind_addr).await {
            error!("{:#}", e);
        }
    });

    let mut supervisor = Supervisor::new(
        FlowTemperatureCorrector::new(config.correction),
        config.control.clone(),
        config.room.clone(),
        FileSink::new(config.output.setpoint_path.clone()),
    );

    let mut interval = tokio::time::interval(Duration::from_secs(config.control.interval_secs));
    loop {
        interval.tick().await;
        supervisor.cycle(&server_state, Local::now()).await;
    }
}

mod config;
mod events;
mod link;
mod session;

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use glam::Vec3;

use config::SimConfig;
use link::LinkConditions;
use session::Session;

#[derive(Parser)]
#[command(name = "motion-sim")]
#[command(about = "Headless server/owner/proxy session exercising the teleport handshake")]
struct Args {
    #[arg(short, long, default_value_t = 30)]
    tick_rate: u32,

    #[arg(short = 'n', long, default_value_t = 300)]
    ticks: u32,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, default_value_t = 0.0, help = "Packet loss percentage (0-100), unreliable traffic only")]
    loss_percent: f32,

    #[arg(long, default_value_t = 0, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 0, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,

    #[arg(long, default_value_t = 60, help = "Tick on which the server issues the teleport")]
    teleport_tick: u32,

    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [10.0, 0.0, 5.0])]
    target: Vec<f32>,

    #[arg(long, default_value_t = 90.0)]
    yaw: f32,

    #[arg(long, help = "Resume the previous destination after the warp")]
    keep_moving: bool,

    #[arg(long, default_value_t = 2, help = "Ticks each side spends preparing the warp")]
    prepare_ticks: u32,

    #[arg(long, default_value_t = 3000, help = "Give up waiting for the ack after this many ms")]
    confirm_timeout_ms: u64,
}

impl Args {
    fn into_config(self) -> Result<SimConfig> {
        let [x, y, z] = self.target.as_slice() else {
            bail!("--target takes exactly three values");
        };
        if !(0.0..=100.0).contains(&self.loss_percent) {
            bail!("--loss-percent must be within 0-100, got {}", self.loss_percent);
        }

        Ok(SimConfig {
            tick_rate: self.tick_rate,
            ticks: self.ticks,
            seed: self.seed,
            link: LinkConditions {
                loss_percent: self.loss_percent,
                min_latency_ms: self.min_latency,
                max_latency_ms: self.max_latency.max(self.min_latency),
                jitter_ms: self.jitter,
            },
            teleport_tick: self.teleport_tick,
            teleport_target: Vec3::new(*x, *y, *z),
            teleport_yaw: self.yaw,
            keep_moving: self.keep_moving,
            prepare_ticks: self.prepare_ticks,
            confirm_timeout: Duration::from_millis(self.confirm_timeout_ms),
            ..Default::default()
        })
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    log::info!(
        "Simulating {} ticks at {} Hz, loss {}%, latency {}-{} ms",
        config.ticks,
        config.tick_rate,
        config.link.loss_percent,
        config.link.min_latency_ms,
        config.link.max_latency_ms
    );

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let summary = runtime.block_on(async move {
        let mut session = Session::new(config);
        while !session.finished() {
            session.tick_once().await?;
            for event in session.drain_events() {
                event.log();
            }
        }

        let summary = session.summary();
        session.shutdown().await;
        anyhow::Ok(summary)
    })?;

    summary.log();
    Ok(())
}

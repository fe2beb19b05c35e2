use std::time::Duration;

use glam::Vec3;
use motion_sync::MovementConfig;

use crate::link::LinkConditions;

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub tick_rate: u32,
    pub ticks: u32,
    pub seed: u64,
    pub link: LinkConditions,
    pub teleport_tick: u32,
    pub teleport_target: Vec3,
    pub teleport_yaw: f32,
    pub keep_moving: bool,
    pub prepare_ticks: u32,
    pub confirm_timeout: Duration,
    pub movement: MovementConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            ticks: 300,
            seed: 1,
            link: LinkConditions::default(),
            teleport_tick: 60,
            teleport_target: Vec3::new(10.0, 0.0, 5.0),
            teleport_yaw: 90.0,
            keep_moving: false,
            prepare_ticks: 2,
            confirm_timeout: Duration::from_secs(3),
            movement: MovementConfig::default(),
        }
    }
}

use crate::net::Inbox;
use crate::snapshot::MovementWorld;

const MAX_FRAME_DELTA: f32 = 0.25;

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    tick_rate: u32,
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(MAX_FRAME_DELTA);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    /// Fraction of the way to the next tick; proxies use it to pick the
    /// discrete state between the last two received ticks.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Drives a `MovementWorld` at a fixed rate, running `tick_fn` after every
/// world step (the host's send hook).
pub struct SimulationLoop<F> {
    world: MovementWorld,
    timestep: FixedTimestep,
    tick_fn: F,
}

impl<F> SimulationLoop<F>
where
    F: FnMut(&mut MovementWorld),
{
    pub fn new(world: MovementWorld, tick_rate: u32, tick_fn: F) -> Self {
        Self {
            world,
            timestep: FixedTimestep::new(tick_rate),
            tick_fn,
        }
    }

    pub fn world(&self) -> &MovementWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut MovementWorld {
        &mut self.world
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn update(&mut self, delta: f32, inbox: Option<&Inbox>) -> u32 {
        self.timestep.accumulate(delta);

        let dt = self.timestep.dt();
        let mut ticks_run = 0;
        while self.timestep.consume_tick() {
            self.world.step(inbox, dt);
            (self.tick_fn)(&mut self.world);
            ticks_run += 1;
        }

        if ticks_run > 0 {
            self.world.interpolate_latest(self.timestep.alpha());
        }
        ticks_run
    }

    pub fn interpolation_alpha(&self) -> f32 {
        self.timestep.alpha()
    }
}

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preparation {
    Pending,
    Ready,
    Failed,
}

/// Work that has to finish before an entity may be warped (streaming the
/// destination in, fading the camera). Polled once per tick while pending.
pub trait TeleportPreparer {
    fn prepare(&mut self, position: Vec3, yaw: f32);

    fn poll(&mut self) -> Preparation;

    fn is_preparing(&self) -> bool;
}

/// Resolves a fixed number of polls after `prepare`.
#[derive(Debug, Clone, Default)]
pub struct TickDelayPreparer {
    ticks: u32,
    remaining: Option<u32>,
    fail: bool,
}

impl TickDelayPreparer {
    pub fn new(ticks: u32) -> Self {
        Self {
            ticks,
            remaining: None,
            fail: false,
        }
    }

    pub fn failing(ticks: u32) -> Self {
        Self {
            fail: true,
            ..Self::new(ticks)
        }
    }
}

impl TeleportPreparer for TickDelayPreparer {
    fn prepare(&mut self, _position: Vec3, _yaw: f32) {
        self.remaining = Some(self.ticks);
    }

    fn poll(&mut self) -> Preparation {
        match self.remaining {
            None => Preparation::Ready,
            Some(0) => {
                self.remaining = None;
                if self.fail { Preparation::Failed } else { Preparation::Ready }
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                Preparation::Pending
            }
        }
    }

    fn is_preparing(&self) -> bool {
        self.remaining.is_some()
    }
}

use std::fmt;

use glam::Vec3;

use super::applier::{ForceApplier, ForceMode, ForceSource, ForceSourceType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceUpdateContext {
    pub delta_time: f32,
    pub base_speed: f32,
}

/// Hooks run synchronously around every decay pass, in registration order.
pub trait ForceUpdateListener {
    fn on_pre_update_forces(&mut self, _appliers: &mut [ForceApplier], _context: &ForceUpdateContext) {}

    fn on_post_update_forces(&mut self, _appliers: &[ForceApplier], _context: &ForceUpdateContext) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ForceUpdate {
    /// Summed additive displacement for this pass.
    pub motion: Vec3,
    pub replace: Option<ForceApplier>,
}

impl ForceUpdate {
    pub fn replace_mode(&self) -> Option<ForceMode> {
        self.replace.map(|applier| applier.mode)
    }
}

pub struct ForceComposer {
    appliers: Vec<ForceApplier>,
    listeners: Vec<Box<dyn ForceUpdateListener>>,
    authoritative: bool,
}

impl fmt::Debug for ForceComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceComposer")
            .field("appliers", &self.appliers)
            .field("listeners", &self.listeners.len())
            .field("authoritative", &self.authoritative)
            .finish()
    }
}

impl ForceComposer {
    pub fn new(authoritative: bool) -> Self {
        Self {
            appliers: Vec::new(),
            listeners: Vec::new(),
            authoritative,
        }
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    pub fn add_listener(&mut self, listener: Box<dyn ForceUpdateListener>) {
        self.listeners.push(listener);
    }

    pub fn appliers(&self) -> &[ForceApplier] {
        &self.appliers
    }

    pub fn len(&self) -> usize {
        self.appliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appliers.is_empty()
    }

    pub fn replace_count(&self) -> usize {
        self.appliers
            .iter()
            .filter(|a| a.mode.is_replace_movement())
            .count()
    }

    pub fn apply(
        &mut self,
        mode: ForceMode,
        direction: Vec3,
        source: ForceSource,
        force: f32,
        deceleration: f32,
        duration: f32,
    ) -> bool {
        if !self.authoritative {
            log::warn!("Ignoring {:?} force from {:?} on non-authoritative instance", mode, source);
            return false;
        }

        self.push(ForceApplier::new(mode, direction, source, force, deceleration, duration));
        true
    }

    /// Adds a force produced by the owning side's own input (dash), which does
    /// not go through the authority check.
    pub(crate) fn push(&mut self, applier: ForceApplier) {
        if applier.mode.is_replace_movement() {
            self.remove_replace_movement_forces();
        }
        self.appliers.push(applier);
    }

    pub fn find_by_source(&self, source_type: ForceSourceType, source_id: i32) -> Option<&ForceApplier> {
        self.appliers
            .iter()
            .find(|a| a.source.matches(source_type, source_id))
    }

    pub fn clear_all(&mut self) -> bool {
        if !self.authoritative {
            log::warn!("Ignoring force clear on non-authoritative instance");
            return false;
        }
        self.appliers.clear();
        true
    }

    fn remove_replace_movement_forces(&mut self) {
        self.appliers.retain(|a| !a.mode.is_replace_movement());
    }

    pub fn update_forces(&mut self, delta_time: f32, base_speed: f32) -> ForceUpdate {
        let context = ForceUpdateContext {
            delta_time,
            base_speed,
        };

        for listener in &mut self.listeners {
            listener.on_pre_update_forces(&mut self.appliers, &context);
        }

        let mut motion = Vec3::ZERO;
        for applier in &mut self.appliers {
            let distance = applier.advance(delta_time);
            if !applier.mode.is_replace_movement() {
                motion += applier.direction * distance;
            }
        }
        self.appliers.retain(|a| !a.is_expired());

        for listener in &mut self.listeners {
            listener.on_post_update_forces(&self.appliers, &context);
        }

        let replace = self
            .appliers
            .iter()
            .find(|a| a.mode.is_replace_movement())
            .copied();

        if !self.appliers.is_empty() {
            log::trace!(
                "Force pass: {} active, motion {:?}, replace {:?}",
                self.appliers.len(),
                motion,
                replace.map(|a| a.mode)
            );
        }

        ForceUpdate { motion, replace }
    }
}

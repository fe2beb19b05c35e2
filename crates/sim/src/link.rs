use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use motion_sync::{Channel, EntityId, Inbound, WireMessage};

/// Transport framing around one codec payload.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Envelope {
    pub entity: u32,
    pub tick: u32,
    pub channel: u8,
    pub reliable: bool,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn wrap(entity: EntityId, tick: u32, message: &WireMessage) -> Self {
        Self {
            entity: entity.id(),
            tick,
            channel: message.channel() as u8,
            reliable: message.delivery().is_reliable(),
            payload: message.to_bytes().to_vec(),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, rancor::Error> {
        rkyv::to_bytes::<rancor::Error>(self).map(|aligned| aligned.into_vec())
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, rancor::Error> {
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);
        rkyv::from_bytes::<Self, rancor::Error>(&aligned)
    }

    pub fn open(&self) -> anyhow::Result<Inbound> {
        let channel = Channel::try_from(self.channel)?;
        let message = WireMessage::decode(channel, &self.payload)?;
        Ok(Inbound {
            entity: EntityId(self.entity),
            tick: self.tick,
            message,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkConditions {
    pub loss_percent: f32,
    pub min_latency_ms: u32,
    pub max_latency_ms: u32,
    pub jitter_ms: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinkStats {
    pub sent: u64,
    pub dropped: u64,
    pub delivered: u64,
    pub bytes: u64,
}

/// Seeded hash-chain noise; only has to be reproducible, not good.
#[derive(Debug, Clone)]
struct Noise {
    seed: u64,
    counter: u64,
}

impl Noise {
    fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    fn unit(&mut self) -> f32 {
        let mut hasher = DefaultHasher::new();
        (self.seed, self.counter).hash(&mut hasher);
        self.counter += 1;
        (hasher.finish() >> 40) as f32 / (1u64 << 24) as f32
    }
}

#[derive(Debug)]
struct InFlight {
    release_time: Instant,
    sequence: u64,
    bytes: Vec<u8>,
}

impl PartialEq for InFlight {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for InFlight {}

impl PartialOrd for InFlight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InFlight {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_time
            .cmp(&self.release_time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// One direction of a lossy, delayed connection. Reliable envelopes are
/// delayed like everything else but never dropped.
#[derive(Debug)]
pub struct Link {
    name: &'static str,
    conditions: LinkConditions,
    noise: Noise,
    in_flight: BinaryHeap<InFlight>,
    sequence: u64,
    stats: LinkStats,
}

impl Link {
    pub fn new(name: &'static str, conditions: LinkConditions, seed: u64) -> Self {
        Self {
            name,
            conditions,
            noise: Noise::new(seed),
            in_flight: BinaryHeap::new(),
            sequence: 0,
            stats: LinkStats::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn send(&mut self, envelope: &Envelope, now: Instant) -> Result<bool, rancor::Error> {
        self.stats.sent += 1;
        if !envelope.reliable && self.should_drop() {
            self.stats.dropped += 1;
            return Ok(false);
        }

        let bytes = envelope.serialize()?;
        self.stats.bytes += bytes.len() as u64;
        let release_time = now + self.delay();
        self.in_flight.push(InFlight {
            release_time,
            sequence: self.sequence,
            bytes,
        });
        self.sequence += 1;
        Ok(true)
    }

    pub fn take_ready(&mut self, now: Instant) -> Vec<Vec<u8>> {
        let mut ready = Vec::new();
        while self.in_flight.peek().is_some_and(|p| p.release_time <= now) {
            if let Some(packet) = self.in_flight.pop() {
                ready.push(packet.bytes);
            }
        }
        self.stats.delivered += ready.len() as u64;
        ready
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn should_drop(&mut self) -> bool {
        if self.conditions.loss_percent <= 0.0 {
            return false;
        }
        self.noise.unit() * 100.0 < self.conditions.loss_percent
    }

    fn delay(&mut self) -> Duration {
        let LinkConditions {
            min_latency_ms,
            max_latency_ms,
            jitter_ms,
            ..
        } = self.conditions;
        if max_latency_ms == 0 && jitter_ms == 0 {
            return Duration::ZERO;
        }

        let range = max_latency_ms.saturating_sub(min_latency_ms);
        let latency = min_latency_ms + (self.noise.unit() * range as f32) as u32;
        let jitter = (self.noise.unit() * jitter_ms as f32) as u32;
        Duration::from_millis(u64::from(latency + jitter))
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use motion_sync::TeleportRequest;

    use super::*;

    #[test]
    fn envelope_carries_codec_payload() {
        let message = WireMessage::Request(TeleportRequest::new(Vec3::new(10.0, 0.0, 5.0), 90.0, false));
        let envelope = Envelope::wrap(EntityId(3), 12, &message);
        assert!(envelope.reliable);

        let bytes = envelope.serialize().unwrap();
        let inbound = Envelope::deserialize(&bytes).unwrap().open().unwrap();
        assert_eq!(inbound.entity, EntityId(3));
        assert_eq!(inbound.tick, 12);
        assert_eq!(inbound.message, message);
    }

    #[test]
    fn reliable_envelopes_survive_total_loss() {
        let conditions = LinkConditions {
            loss_percent: 100.0,
            ..Default::default()
        };
        let mut link = Link::new("test", conditions, 7);
        let now = Instant::now();

        let reliable = Envelope::wrap(EntityId(1), 0, &WireMessage::Ack(Default::default()));
        let mut unreliable = reliable.clone();
        unreliable.reliable = false;

        assert!(link.send(&reliable, now).unwrap());
        assert!(!link.send(&unreliable, now).unwrap());
        assert_eq!(link.take_ready(now).len(), 1);
        assert_eq!(link.stats().dropped, 1);
    }

    #[test]
    fn latency_holds_packets_back() {
        let conditions = LinkConditions {
            min_latency_ms: 50,
            max_latency_ms: 50,
            ..Default::default()
        };
        let mut link = Link::new("test", conditions, 1);
        let now = Instant::now();

        let envelope = Envelope::wrap(EntityId(1), 0, &WireMessage::Ack(Default::default()));
        link.send(&envelope, now).unwrap();

        assert!(link.take_ready(now).is_empty());
        assert_eq!(link.take_ready(now + Duration::from_millis(50)).len(), 1);
    }
}

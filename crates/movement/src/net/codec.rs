use bytes::{Buf, BufMut, Bytes, BytesMut};
use glam::Vec3;
use half::f16;

use crate::state::{ExtraMovementState, MotionState, TeleportState};

const MOTION_SNAPSHOT_LEN: usize = 2;
const TELEPORT_REQUEST_LEN: usize = 1 + 3 * 4 + 2;
const TELEPORT_ACK_LEN: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("payload truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
    #[error("unknown extra movement state {0}")]
    UnknownExtraState(u8),
    #[error("unexpected teleport flags {0:#04x}")]
    UnexpectedFlags(u8),
    #[error("unknown channel {0}")]
    UnknownChannel(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Unreliable,
    Reliable,
}

impl Delivery {
    pub fn is_reliable(self) -> bool {
        matches!(self, Self::Reliable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    Motion = 0,
    ServerState = 1,
    ClientState = 2,
}

impl TryFrom<u8> for Channel {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Motion),
            1 => Ok(Self::ServerState),
            2 => Ok(Self::ClientState),
            other => Err(CodecError::UnknownChannel(other)),
        }
    }
}

fn ensure(available: usize, needed: usize) -> Result<(), CodecError> {
    if available < needed {
        return Err(CodecError::Truncated { needed, available });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSnapshot {
    pub motion: MotionState,
    pub extra: ExtraMovementState,
}

impl MotionSnapshot {
    pub const DELIVERY: Delivery = Delivery::Unreliable;

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.motion.bits());
        buf.put_u8(self.extra as u8);
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        ensure(buf.remaining(), MOTION_SNAPSHOT_LEN)?;
        let motion = MotionState::from_bits_truncate(buf.get_u8());
        let extra = ExtraMovementState::try_from(buf.get_u8()).map_err(CodecError::UnknownExtraState)?;
        Ok(Self { motion, extra })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportRequest {
    pub flags: TeleportState,
    pub position: Vec3,
    pub yaw: f32,
}

impl TeleportRequest {
    pub const DELIVERY: Delivery = Delivery::Reliable;
    pub const WIRE_FLAGS: TeleportState =
        TeleportState::REQUESTING.union(TeleportState::STILL_MOVE_AFTER_TELEPORT);

    pub fn new(position: Vec3, yaw: f32, keep_moving: bool) -> Self {
        let mut flags = TeleportState::REQUESTING;
        flags.set(TeleportState::STILL_MOVE_AFTER_TELEPORT, keep_moving);
        Self { flags, position, yaw }
    }

    pub fn keep_moving(&self) -> bool {
        self.flags.has(TeleportState::STILL_MOVE_AFTER_TELEPORT)
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8((self.flags & Self::WIRE_FLAGS).bits());
        buf.put_f32_le(self.position.x);
        buf.put_f32_le(self.position.y);
        buf.put_f32_le(self.position.z);
        buf.put_u16_le(f16::from_f32(self.yaw).to_bits());
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        ensure(buf.remaining(), 1)?;
        let raw = buf.get_u8();
        let flags = TeleportState::from_bits_truncate(raw) & Self::WIRE_FLAGS;
        if !flags.has(TeleportState::REQUESTING) {
            return Err(CodecError::UnexpectedFlags(raw));
        }

        ensure(buf.remaining(), TELEPORT_REQUEST_LEN - 1)?;
        let position = Vec3::new(buf.get_f32_le(), buf.get_f32_le(), buf.get_f32_le());
        let yaw = f16::from_bits(buf.get_u16_le()).to_f32();

        Ok(Self { flags, position, yaw })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleportAck {
    pub flags: TeleportState,
}

impl Default for TeleportAck {
    fn default() -> Self {
        Self {
            flags: TeleportState::RESPONDING,
        }
    }
}

impl TeleportAck {
    pub const DELIVERY: Delivery = Delivery::Reliable;

    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.flags.bits());
    }

    pub fn decode(buf: &mut impl Buf) -> Result<Self, CodecError> {
        ensure(buf.remaining(), TELEPORT_ACK_LEN)?;
        let raw = buf.get_u8();
        let flags = TeleportState::from_bits_truncate(raw);
        if !flags.has(TeleportState::RESPONDING) {
            return Err(CodecError::UnexpectedFlags(raw));
        }
        Ok(Self { flags })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireMessage {
    Motion(MotionSnapshot),
    Request(TeleportRequest),
    Ack(TeleportAck),
}

impl WireMessage {
    pub fn channel(&self) -> Channel {
        match self {
            Self::Motion(_) => Channel::Motion,
            Self::Request(_) => Channel::ServerState,
            Self::Ack(_) => Channel::ClientState,
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            Self::Motion(_) => MotionSnapshot::DELIVERY,
            Self::Request(_) => TeleportRequest::DELIVERY,
            Self::Ack(_) => TeleportAck::DELIVERY,
        }
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        match self {
            Self::Motion(msg) => msg.encode(buf),
            Self::Request(msg) => msg.encode(buf),
            Self::Ack(msg) => msg.encode(buf),
        }
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(TELEPORT_REQUEST_LEN);
        self.encode(&mut buf);
        buf.freeze()
    }

    pub fn decode(channel: Channel, mut payload: &[u8]) -> Result<Self, CodecError> {
        match channel {
            Channel::Motion => MotionSnapshot::decode(&mut payload).map(Self::Motion),
            Channel::ServerState => TeleportRequest::decode(&mut payload).map(Self::Request),
            Channel::ClientState => TeleportAck::decode(&mut payload).map(Self::Ack),
        }
    }
}

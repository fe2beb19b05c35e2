mod codec;
mod inbox;

pub use codec::{Channel, CodecError, Delivery, MotionSnapshot, TeleportAck, TeleportRequest, WireMessage};
pub use inbox::{Inbound, Inbox, InboxSender, inbox};

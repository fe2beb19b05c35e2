use std::sync::mpsc::{self, Receiver, Sender};

use crate::snapshot::EntityId;

use super::codec::WireMessage;

/// A message decoded off the I/O thread, tagged with the sender's tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Inbound {
    pub entity: EntityId,
    pub tick: u32,
    pub message: WireMessage,
}

pub fn inbox() -> (InboxSender, Inbox) {
    let (tx, rx) = mpsc::channel();
    (InboxSender { tx }, Inbox { rx })
}

/// Producer half, owned by the I/O side.
#[derive(Debug)]
pub struct InboxSender {
    tx: Sender<Inbound>,
}

impl InboxSender {
    /// Returns false once the tick side has gone away.
    pub fn send(&self, inbound: Inbound) -> bool {
        self.tx.send(inbound).is_ok()
    }
}

/// Consumer half, drained at the start of every tick.
#[derive(Debug)]
pub struct Inbox {
    rx: Receiver<Inbound>,
}

impl Inbox {
    pub fn drain(&self) -> impl Iterator<Item = Inbound> + '_ {
        self.rx.try_iter()
    }
}

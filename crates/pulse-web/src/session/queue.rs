//! Outbound message queue (§4.5 "Message handling", §5 "Ordering
//! guarantees"): holds messages sent while disconnected, preserving
//! enqueue order, and knows how to filter itself for reconnect replay.

use std::collections::HashSet;

use pulse_core::message::ClientMessage;

#[derive(Default)]
pub struct OutboundQueue {
    messages: Vec<ClientMessage>,
}

impl OutboundQueue {
    pub fn new() -> OutboundQueue {
        OutboundQueue::default()
    }

    pub fn push(&mut self, message: ClientMessage) {
        self.messages.push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// §5 "on reconnect, re-issued `attach`es are sent first ..., followed
    /// by the drained queue with `attach` duplicates and stale `update`s
    /// filtered out" — `reattached` is the set of paths the caller already
    /// re-sent an `attach` for.
    pub fn drain_for_replay(&mut self, reattached: &HashSet<String>) -> Vec<ClientMessage> {
        std::mem::take(&mut self.messages)
            .into_iter()
            .filter(|message| match message {
                ClientMessage::Attach { path, .. } => !reattached.contains(path),
                ClientMessage::Update { .. } => false,
                _ => true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attach(path: &str) -> ClientMessage {
        ClientMessage::Attach { path: path.to_string(), route_info: Default::default() }
    }

    fn update(path: &str) -> ClientMessage {
        ClientMessage::Update { path: path.to_string(), route_info: Default::default() }
    }

    fn callback(path: &str) -> ClientMessage {
        ClientMessage::Callback { path: path.to_string(), callback: "onClick".into(), args: Vec::new() }
    }

    #[test]
    fn preserves_enqueue_order() {
        let mut queue = OutboundQueue::new();
        queue.push(callback("/a"));
        queue.push(callback("/b"));
        let drained = queue.drain_for_replay(&HashSet::new());
        assert_eq!(drained, vec![callback("/a"), callback("/b")]);
    }

    #[test]
    fn drops_already_reattached_attach_and_all_updates() {
        let mut queue = OutboundQueue::new();
        queue.push(attach("/a"));
        queue.push(update("/a"));
        queue.push(callback("/a"));
        queue.push(attach("/b"));

        let mut reattached = HashSet::new();
        reattached.insert("/a".to_string());
        let drained = queue.drain_for_replay(&reattached);

        assert_eq!(drained, vec![callback("/a"), attach("/b")]);
    }

    #[test]
    fn draining_empties_the_queue() {
        let mut queue = OutboundQueue::new();
        queue.push(callback("/a"));
        queue.drain_for_replay(&HashSet::new());
        assert!(queue.is_empty());
    }
}

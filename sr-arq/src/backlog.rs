//! Unbounded FIFO of application messages waiting for window space.

use std::collections::VecDeque;

use crate::packet::Message;

/// Messages handed down by the application but not yet admitted into the
/// send window.  Nothing is ever dropped; the sender drains the front
/// whenever the window slides.
#[derive(Debug, Default)]
pub struct Backlog {
    queue: VecDeque<Message>,
}

impl Backlog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.queue.push_back(message);
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_fifo_order() {
        let mut b = Backlog::new();
        for k in 0..3 {
            b.push(Message::letter(k));
        }
        assert_eq!(b.len(), 3);
        assert_eq!(b.pop(), Some(Message::letter(0)));
        assert_eq!(b.pop(), Some(Message::letter(1)));
        assert_eq!(b.pop(), Some(Message::letter(2)));
        assert_eq!(b.pop(), None);
        assert!(b.is_empty());
    }

    #[test]
    fn clear_discards_everything() {
        let mut b = Backlog::new();
        b.push(Message::letter(0));
        b.clear();
        assert!(b.is_empty());
    }
}

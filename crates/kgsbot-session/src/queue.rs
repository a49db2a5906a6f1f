//! The outgoing message queue.
//!
//! [`MessageQueue`] is a cheap-to-clone handle around one FIFO. The
//! connection drains it at the pacing rate; anyone holding a handle
//! (including a callback) can push into it. Once the session closes the
//! queue is closed too: pending messages are dropped and further pushes
//! fail.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kgsbot_protocol::Message;

use crate::SessionError;

#[derive(Debug, Default)]
struct QueueInner {
    pending: VecDeque<Message>,
    closed: bool,
}

/// A shared FIFO of messages waiting to be sent.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // The lock is never held across an await point, and a panic while
    // holding it cannot leave the deque half-updated.
    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a message at the back.
    ///
    /// # Errors
    /// [`SessionError::SessionClosed`] once the owning session has closed.
    pub fn enqueue(&self, message: Message) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(SessionError::SessionClosed);
        }
        tracing::trace!(message_type = %message.message_type(), "message queued");
        inner.pending.push_back(message);
        Ok(())
    }

    /// Removes the oldest message, or `None` if nothing is pending.
    pub fn dequeue(&self) -> Option<Message> {
        self.lock().pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Closes the queue and returns how many pending messages were dropped.
    pub(crate) fn close(&self) -> usize {
        let mut inner = self.lock();
        inner.closed = true;
        let dropped = inner.pending.len();
        inner.pending.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgsbot_protocol::{LoginMessage, MessageType};

    fn login(name: &str) -> Message {
        Message::login(LoginMessage::new(name, ""))
    }

    #[test]
    fn test_dequeue_empty_is_none() {
        assert!(MessageQueue::new().dequeue().is_none());
    }

    #[test]
    fn test_queue_is_fifo() {
        let queue = MessageQueue::new();
        queue.enqueue(login("a")).unwrap();
        queue.enqueue(login("b")).unwrap();
        queue.enqueue(Message::wake_up()).unwrap();

        assert_eq!(queue.dequeue(), Some(login("a")));
        assert_eq!(queue.dequeue(), Some(login("b")));
        assert_eq!(
            queue.dequeue().map(|m| m.message_type()),
            Some(MessageType::WakeUp)
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clones_share_one_queue() {
        let queue = MessageQueue::new();
        let producer = queue.clone();
        producer.enqueue(login("a")).unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_close_drops_pending_and_rejects_new() {
        let queue = MessageQueue::new();
        queue.enqueue(login("a")).unwrap();
        queue.enqueue(login("b")).unwrap();

        assert_eq!(queue.close(), 2);
        assert!(queue.is_closed());
        assert!(queue.is_empty());
        assert!(matches!(
            queue.enqueue(login("c")),
            Err(SessionError::SessionClosed)
        ));
    }
}

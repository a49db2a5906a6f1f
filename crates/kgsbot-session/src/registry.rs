//! Per-message-type subscriber lists.
//!
//! A message type with at least one callback is "processable": the
//! connection only spends a network round trip on messages somebody will
//! look at the answer to.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use kgsbot_protocol::MessageType;
use kgsbot_transport::HttpResponse;

use crate::SessionError;

/// A subscriber, invoked with the raw response to a sent message.
///
/// Callbacks are compared by pointer identity, so keep a clone of the `Arc`
/// around if you plan to unsubscribe it later.
pub type Callback = Arc<dyn Fn(&HttpResponse) + Send + Sync>;

/// Wraps a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&HttpResponse) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Maps message types to their subscribers, in registration order.
#[derive(Default, Clone)]
pub struct CallbackRegistry {
    callbacks: HashMap<MessageType, Vec<Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber for `message_type`.
    pub fn add(&mut self, message_type: MessageType, callback: Callback) {
        self.callbacks.entry(message_type).or_default().push(callback);
    }

    /// Removes the first registration of `callback` for `message_type`.
    ///
    /// A type whose last subscriber goes away is forgotten entirely, so
    /// add-then-remove leaves the registry as it was.
    ///
    /// # Errors
    /// - [`SessionError::NoSubscribers`] if the type has no subscriber list
    /// - [`SessionError::CallbackNotFound`] if `callback` is not in it
    pub fn remove(
        &mut self,
        message_type: MessageType,
        callback: &Callback,
    ) -> Result<(), SessionError> {
        let list = self
            .callbacks
            .get_mut(&message_type)
            .ok_or(SessionError::NoSubscribers(message_type))?;

        let index = list
            .iter()
            .position(|registered| Arc::ptr_eq(registered, callback))
            .ok_or(SessionError::CallbackNotFound(message_type))?;
        list.remove(index);

        if list.is_empty() {
            self.callbacks.remove(&message_type);
        }
        Ok(())
    }

    /// `true` if at least one callback is registered for the type.
    pub fn is_processable(&self, message_type: MessageType) -> bool {
        self.subscriber_count(message_type) > 0
    }

    pub fn subscriber_count(&self, message_type: MessageType) -> usize {
        self.callbacks.get(&message_type).map_or(0, Vec::len)
    }

    /// The subscribers for a type, in invocation order.
    pub fn subscribers(&self, message_type: MessageType) -> &[Callback] {
        self.callbacks
            .get(&message_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of types with at least one subscriber.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .callbacks
            .iter()
            .map(|(t, list)| (t.as_str(), list.len()))
            .collect();
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Callback {
        callback(|_| {})
    }

    #[test]
    fn test_new_registry_processes_nothing() {
        let registry = CallbackRegistry::new();
        for t in MessageType::ALL {
            assert!(!registry.is_processable(t));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_add_makes_type_processable() {
        let mut registry = CallbackRegistry::new();
        registry.add(MessageType::Login, noop());

        assert!(registry.is_processable(MessageType::Login));
        assert!(!registry.is_processable(MessageType::Hello));
        assert_eq!(registry.subscriber_count(MessageType::Login), 1);
    }

    #[test]
    fn test_subscribers_keep_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        for i in 0..3 {
            let order = Arc::clone(&order);
            registry.add(
                MessageType::Login,
                callback(move |_| order.lock().unwrap().push(i)),
            );
        }

        let resp = HttpResponse::new(200, "");
        for cb in registry.subscribers(MessageType::Login) {
            cb(&resp);
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_add_then_remove_restores_prior_state() {
        let mut registry = CallbackRegistry::new();
        let cb = noop();

        registry.add(MessageType::RoomJoin, Arc::clone(&cb));
        registry.remove(MessageType::RoomJoin, &cb).unwrap();

        assert!(!registry.is_processable(MessageType::RoomJoin));
        assert!(registry.is_empty());
        // Removing again behaves exactly as if it had never been added.
        assert!(matches!(
            registry.remove(MessageType::RoomJoin, &cb),
            Err(SessionError::NoSubscribers(MessageType::RoomJoin))
        ));
    }

    #[test]
    fn test_remove_without_add_is_no_subscribers() {
        let mut registry = CallbackRegistry::new();
        assert!(matches!(
            registry.remove(MessageType::Hello, &noop()),
            Err(SessionError::NoSubscribers(MessageType::Hello))
        ));
    }

    #[test]
    fn test_remove_unknown_callback_is_not_found() {
        let mut registry = CallbackRegistry::new();
        registry.add(MessageType::Hello, noop());

        // A different Arc, even wrapping an identical closure, is a
        // different callback.
        assert!(matches!(
            registry.remove(MessageType::Hello, &noop()),
            Err(SessionError::CallbackNotFound(MessageType::Hello))
        ));
        assert!(registry.is_processable(MessageType::Hello));
    }

    #[test]
    fn test_remove_takes_first_duplicate_only() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = {
            let hits = Arc::clone(&hits);
            callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        let mut registry = CallbackRegistry::new();
        registry.add(MessageType::Login, Arc::clone(&counted));
        registry.add(MessageType::Login, Arc::clone(&counted));

        registry.remove(MessageType::Login, &counted).unwrap();

        assert_eq!(registry.subscriber_count(MessageType::Login), 1);
        for cb in registry.subscribers(MessageType::Login) {
            cb(&HttpResponse::default());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_counts() {
        let mut registry = CallbackRegistry::new();
        registry.add(MessageType::Login, noop());
        let debug = format!("{registry:?}");
        assert!(debug.contains("LOGIN"));
    }
}

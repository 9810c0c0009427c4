use std::sync::{Mutex, PoisonError};

use rst_common::with_tokio::tokio::sync::oneshot;

use super::types::CorrelationError;

/// Single resolution container backed by a oneshot channel
pub struct ResultSlot<T> {
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> ResultSlot<T> {
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (sender, receiver) = oneshot::channel();
        let slot = Self {
            sender: Mutex::new(Some(sender)),
        };

        (slot, receiver)
    }

    /// Resolve the slot, a second call fails with [`CorrelationError::AlreadyResolved`]
    pub fn resolve(&self, value: T) -> Result<(), CorrelationError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CorrelationError::AlreadyResolved)?;

        sender.send(value).map_err(|_| CorrelationError::Closed)
    }

    pub fn is_resolved(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::with_tokio::tokio;

    #[tokio::test]
    async fn test_resolve_once() {
        let (slot, receiver) = ResultSlot::new();
        assert!(!slot.is_resolved());

        slot.resolve("schema:1".to_string()).unwrap();
        assert!(slot.is_resolved());
        assert_eq!(receiver.await.unwrap(), "schema:1");

        let second = slot.resolve("schema:2".to_string());
        assert_eq!(second.unwrap_err(), CorrelationError::AlreadyResolved);
    }

    #[test]
    fn test_resolve_dropped_receiver() {
        let (slot, receiver) = ResultSlot::<u8>::new();
        drop(receiver);

        assert_eq!(slot.resolve(1).unwrap_err(), CorrelationError::Closed);
        assert_eq!(slot.resolve(2).unwrap_err(), CorrelationError::AlreadyResolved);
    }
}

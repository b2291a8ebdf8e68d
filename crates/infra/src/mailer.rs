//! In-process mail queue.

use std::collections::VecDeque;
use std::sync::Mutex;

use billing_invoicing::{Mailer, NotificationDeliveryError, OutgoingMail};

/// Holds queued mail until a delivery worker drains it.
#[derive(Debug)]
pub struct QueuedMailer {
    queue: Mutex<VecDeque<OutgoingMail>>,
    capacity: Option<usize>,
}

impl QueuedMailer {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: None,
        }
    }

    /// Queue that rejects new mail once `capacity` messages are pending.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: Some(capacity),
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<OutgoingMail> {
        match self.queue.lock() {
            Ok(mut q) => q.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for QueuedMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailer for QueuedMailer {
    fn send_notification(&self, mail: OutgoingMail) -> Result<(), NotificationDeliveryError> {
        if mail.recipients.iter().all(|r| r.trim().is_empty()) {
            return Err(NotificationDeliveryError::InvalidRecipient(
                "no recipients".to_string(),
            ));
        }

        let mut queue = self
            .queue
            .lock()
            .map_err(|_| NotificationDeliveryError::Unavailable("mail queue lock poisoned".to_string()))?;
        if self.capacity.is_some_and(|cap| queue.len() >= cap) {
            return Err(NotificationDeliveryError::Unavailable(format!(
                "mail queue full ({} pending)",
                queue.len()
            )));
        }
        tracing::debug!(reference_id = %mail.reference_id, "mail queued");
        queue.push_back(mail);
        Ok(())
    }
}

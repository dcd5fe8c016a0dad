use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::NotifyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound email transport.
pub trait NotificationService: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

impl<N> NotificationService for Arc<N>
where
    N: NotificationService + ?Sized,
{
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        (**self).send(message)
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl NotificationService for LogMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        tracing::info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "email (log transport)"
        );
        Ok(())
    }
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct OutboxMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Result<Vec<EmailMessage>, NotifyError> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .map_err(|_| NotifyError::Unavailable("outbox lock poisoned".to_string()))
    }
}

impl NotificationService for OutboxMailer {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Unavailable("outbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}

use async_trait::async_trait;

/// Outbound push/email/SMS transport, abstracted so the core never depends
/// on a concrete vendor SDK. Mirrors the `Store` capability boundary.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_push(&self, token: &str, title: &str, body: &str);
    async fn send_email(&self, to: &str, subject: &str, body: &str);
    async fn send_sms(&self, to: &str, body: &str);
}

/// Development-mode sender that logs instead of calling a real transport.
/// Used until a real vendor integration is wired in `app.rs`.
pub struct LoggingMessageSender;

#[async_trait]
impl MessageSender for LoggingMessageSender {
    async fn send_push(&self, token: &str, title: &str, body: &str) {
        tracing::info!(token, title, body, "push notification (dev transport)");
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) {
        tracing::info!(to, subject, body, "email (dev transport)");
    }

    async fn send_sms(&self, to: &str, body: &str) {
        tracing::info!(to, body, "sms (dev transport)");
    }
}

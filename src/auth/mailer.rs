use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;

/// Delivers password reset links.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset(
        &self,
        email: &str,
        token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()>;
}

/// Placeholder delivery: nothing is sent, the request is only logged.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_reset(
        &self,
        email: &str,
        _token: &str,
        expires: OffsetDateTime,
    ) -> anyhow::Result<()> {
        debug!(%email, %expires, "password reset mail not sent: no mail transport configured");
        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("mail transport error: {0}")]
pub struct TransportError(pub String);

/// The one contract the dispatcher needs from a mailer.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError>;
}

/// Posts messages to an HTTP mail API (bearer token, JSON payload).
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(cfg: &configs::MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: cfg.api_url.clone(),
            api_token: cfg.api_token.clone(),
            sender: cfg.sender.clone(),
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), TransportError> {
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "from": self.sender,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        if !res.status().is_success() {
            return Err(TransportError(format!("mail API returned {}", res.status())));
        }
        Ok(())
    }
}

/// Development default: log instead of sending.
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), TransportError> {
        info!(%to, subject, "mail (log only)");
        Ok(())
    }
}

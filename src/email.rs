use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EmailConfig;

/// Outbound mail seam. Production uses SMTP; tests inject a mock.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn from_config(cfg: &EmailConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
        let transport = if cfg.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
                .port(cfg.port)
                .credentials(creds)
                .build()
        } else if cfg.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)?
                .port(cfg.port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
                .port(cfg.port)
                .build()
        };
        Ok(Self {
            transport,
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// Used when email is disabled in config; logs what would have gone out.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
        info!(%to, %subject, "email disabled, skipping send");
        Ok(())
    }
}

pub fn mailer_from_config(cfg: &EmailConfig) -> Arc<dyn Mailer> {
    if cfg.enabled {
        match SmtpMailer::from_config(cfg) {
            Ok(m) => return Arc::new(m),
            Err(e) => warn!(error = %e, "smtp transport setup failed, falling back to noop"),
        }
    }
    Arc::new(NoopMailer)
}

/// Fire-and-forget admin notification about a new registration.
pub async fn notify_new_user(mailer: &dyn Mailer, admin_to: &str, username: &str, email: &str) {
    if admin_to.is_empty() {
        return;
    }
    let subject = format!("New User Registration: {username}");
    let body = format!(
        "A new user has registered on your portfolio site.\n\n\
         Username: {username}\nEmail: {email}\n\n\
         This user account has been created with default permissions.\n"
    );
    if let Err(e) = mailer.send(admin_to, &subject, &body).await {
        warn!(error = %e, "failed to send registration notification");
    }
}

/// Fire-and-forget admin notification about a new inbox message.
pub async fn notify_new_message(mailer: &dyn Mailer, admin_to: &str, sender: &str, content: &str) {
    if admin_to.is_empty() {
        return;
    }
    let subject = format!("New Message from {sender}");
    let body = format!(
        "A new message has been received on your portfolio site.\n\n\
         From: {sender}\nMessage:\n{content}\n\n\
         Please log in to your admin dashboard to respond.\n"
    );
    if let Err(e) = mailer.send(admin_to, &subject, &body).await {
        warn!(error = %e, "failed to send message notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn notify_new_user_addresses_the_admin() {
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
        };
        notify_new_user(&mailer, "admin@example.com", "alice", "alice@example.com").await;
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "admin@example.com");
        assert!(sent[0].1.contains("alice"));
    }

    #[tokio::test]
    async fn notifications_are_skipped_without_an_admin_address() {
        let mailer = RecordingMailer {
            sent: Mutex::new(Vec::new()),
        };
        notify_new_message(&mailer, "", "bob", "hi").await;
        assert!(mailer.sent.lock().unwrap().is_empty());
    }
}

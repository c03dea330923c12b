//! Log-only Mailer
//!
//! Renders the subject line of each mail and logs it instead of delivering.

use tokio::runtime::Handle;

use crate::domain::collaborator::Notifier;
use crate::domain::model::{Mail, MailKind};

/// `Notifier` that writes mails to the log from a background task
#[derive(Debug, Clone)]
pub struct LogMailer {
    exchange_name: String,
}

impl LogMailer {
    pub fn new(exchange_name: impl Into<String>) -> Self {
        Self {
            exchange_name: exchange_name.into(),
        }
    }

    pub fn subject(&self, kind: MailKind) -> String {
        let title = match kind {
            MailKind::Signup => "Sign Up",
            MailKind::Login => "Login",
            MailKind::ResetPassword => "Reset Password Request",
        };
        format!("{} {}", self.exchange_name, title)
    }
}

impl Notifier for LogMailer {
    fn send(&self, mail: Mail) {
        let subject = self.subject(mail.kind);
        let deliver = move || {
            tracing::info!(
                to = %mail.to,
                subject = %subject,
                domain = mail.domain.as_deref().unwrap_or_default(),
                data = %mail.data,
                "Mail sent"
            );
        };

        // Outside a runtime (sync tests, shutdown) log inline.
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { deliver() });
            }
            Err(_) => deliver(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subject() {
        let mailer = LogMailer::new("hollow");
        assert_eq!(mailer.subject(MailKind::Signup), "hollow Sign Up");
        assert_eq!(
            mailer.subject(MailKind::ResetPassword),
            "hollow Reset Password Request"
        );
    }

    #[tokio::test]
    async fn test_send_does_not_block() {
        let mailer = LogMailer::new("hollow");
        mailer.send(Mail {
            kind: MailKind::Login,
            to: "a@b.io".to_string(),
            data: json!({ "ip": "10.0.0.1" }),
            domain: None,
        });
    }
}

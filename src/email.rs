use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::{config::AppConfig, models::Order};

/// SMTP mailer. Holds no transport when credentials are not configured, in
/// which case sends become logged no-ops.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.email_user.is_empty() || config.email_password.is_empty() {
            return Ok(Self {
                transport: None,
                from: None,
            });
        }

        let credentials =
            Credentials::new(config.email_user.clone(), config.email_password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();
        let from: Mailbox = config.email_user.parse()?;

        Ok(Self {
            transport: Some(transport),
            from: Some(from),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn send_plain(&self, to: &str, subject: &str, body: String) -> anyhow::Result<()> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::info!("email configuration not set, skipping notification");
            return Ok(());
        };

        let message = Message::builder()
            .from(from.clone())
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        transport.send(message).await?;
        Ok(())
    }
}

pub async fn send_order_confirmation(
    mailer: &Mailer,
    to: &str,
    order: &Order,
) -> anyhow::Result<()> {
    let subject = format!("Order Confirmation #{}", order.id);
    let body = format!(
        "Thank you for your order!\n\n\
         Order ID: {}\n\
         Total Amount: ${:.2}\n\
         Status: {}\n\n\
         We'll send you another email when your order ships.\n\n\
         Best regards,\n\
         Your E-commerce Store\n",
        order.id, order.total_amount, order.status
    );
    mailer.send_plain(to, &subject, body).await
}

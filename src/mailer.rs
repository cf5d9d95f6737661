// src/mailer.rs

use log::info;
use reqwest::blocking::Client;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::ServerError;

pub struct BrevoMailer {
    api_key: String,
    sender_email: String,
    sender_name: String,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    html_content: String,
}

impl BrevoMailer {
    pub fn new(api_key: String, sender_email: String, sender_name: String) -> Self {
        Self {
            api_key,
            sender_email,
            sender_name,
            client: Client::new(),
        }
    }

    pub fn send_html(
        &self,
        recipient_email: &str,
        subject: &str,
        html_content: String,
    ) -> Result<(), ServerError> {
        let payload = BrevoPayload {
            sender: BrevoSender {
                name: &self.sender_name,
                email: &self.sender_email,
            },
            to: vec![BrevoRecipient {
                email: recipient_email,
            }],
            subject,
            html_content,
        };

        let resp = self
            .client
            .post("https://api.brevo.com/v3/smtp/email")
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .map_err(|e| ServerError::MailError(format!("Request failed: {e}")))?;

        if !resp.status().is_success() {
            let error_body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ServerError::MailError(format!(
                "Failed to send email: {error_body}"
            )));
        }

        Ok(())
    }
}

/// Outgoing mail. Without an API key configured, messages are logged instead
/// of sent, which keeps local setups and tests working.
pub enum Mailer {
    Brevo(BrevoMailer),
    Console,
}

impl Mailer {
    pub fn from_config(cfg: &AppConfig) -> Self {
        if cfg.brevo_api_key.is_empty() {
            Mailer::Console
        } else {
            Mailer::Brevo(BrevoMailer::new(
                cfg.brevo_api_key.clone(),
                cfg.sender_email.clone(),
                cfg.sender_name.clone(),
            ))
        }
    }

    fn deliver(&self, to: &str, subject: &str, html: String) -> Result<(), ServerError> {
        match self {
            Mailer::Brevo(brevo) => brevo.send_html(to, subject, html),
            Mailer::Console => {
                info!("📧 [console mail] to={to} subject={subject:?}");
                Ok(())
            }
        }
    }

    pub fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ServerError> {
        let subject = "Verify your account";
        let html = format!(
            r#"
            <h1>Welcome to the utility monitoring service</h1>
            <p>Enter the code below on the verification screen. It expires in 15 minutes.</p>
            <div style="background: #f4f4f4; padding: 10px; font-weight: bold; font-size: 1.2em;">
                {code}
            </div>
            <p>If you did not create an account, you can safely ignore this email.</p>
        "#
        );
        if let Mailer::Console = self {
            // The code has to be reachable somehow when no mail provider is set up.
            info!("📧 verification code for {to}: {code}");
        }
        self.deliver(to, subject, html)
    }

    pub fn send_incident_notice(
        &self,
        to: &str,
        neighborhood: &str,
        resource: &str,
        message: &str,
    ) -> Result<(), ServerError> {
        let subject = format!("Service notice for {neighborhood}");
        let html = format!(
            r#"
            <h1>Service notice</h1>
            <p>A {resource} disruption has been reported in {neighborhood}.</p>
            <p>{message}</p>
        "#
        );
        self.deliver(to, &subject, html)
    }

    pub fn send_support_report(
        &self,
        to: &str,
        neighborhood: &str,
        resource: &str,
        reporter: &str,
        message: &str,
    ) -> Result<(), ServerError> {
        let subject = format!("Support report: {resource} in {neighborhood}");
        let html = format!(
            r#"
            <h1>Support report</h1>
            <p><b>Neighborhood:</b> {neighborhood}</p>
            <p><b>Resource:</b> {resource}</p>
            <p><b>Reported by:</b> {reporter}</p>
            <p>{message}</p>
        "#
        );
        self.deliver(to, &subject, html)
    }
}

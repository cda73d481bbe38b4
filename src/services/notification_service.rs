use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::{CityConfig, Config};
use crate::models::submission::{ContactMessage, EmployerJobSubmission};
use crate::utils::html::escape_html;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Mail transport is missing {0}")]
    NotConfigured(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError>;
}

#[derive(Serialize)]
struct MailApiRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// JSON mail API (Resend-compatible `POST /emails`).
#[derive(Clone)]
pub struct HttpMailTransport {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailTransport {
    pub fn new(
        api_url: String,
        api_key: String,
        from_name: &str,
        from_address: &str,
        timeout: Duration,
    ) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from: format!("{} <{}>", from_name, from_address),
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        let body = MailApiRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: email.text.as_deref(),
        };
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotificationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum NotificationEvent {
    EmployerJobSubmitted {
        submission: EmployerJobSubmission,
        received_at: DateTime<Utc>,
    },
    ContactReceived {
        message: ContactMessage,
    },
}

impl NotificationEvent {
    fn name(&self) -> &'static str {
        match self {
            NotificationEvent::EmployerJobSubmitted { .. } => "employer_job_submitted",
            NotificationEvent::ContactReceived { .. } => "contact_received",
        }
    }
}

/// Best-effort email after a successful insert. Nothing here can fail a
/// submission: every transport error ends in a log line.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Option<Arc<dyn MailTransport>>,
    staff_inbox: String,
    send_employer_confirmation: bool,
    city: CityConfig,
}

impl NotificationDispatcher {
    pub fn new(
        transport: Option<Arc<dyn MailTransport>>,
        staff_inbox: impl Into<String>,
        send_employer_confirmation: bool,
        city: CityConfig,
    ) -> Self {
        Self {
            transport,
            staff_inbox: staff_inbox.into(),
            send_employer_confirmation,
            city,
        }
    }

    pub fn disabled(city: CityConfig) -> Self {
        Self::new(None, String::new(), false, city)
    }

    pub fn from_config(config: &Config) -> Result<Self, NotificationError> {
        if !config.emails_enabled() {
            info!(
                environment = %config.environment,
                "Email notifications disabled (set MAIL_API_KEY, MAIL_FROM_ADDRESS and MAIL_RECEIVER to enable)"
            );
            return Ok(Self::disabled(config.city.clone()));
        }

        let mail = &config.mail;
        let api_key = mail
            .api_key
            .clone()
            .ok_or(NotificationError::NotConfigured("MAIL_API_KEY"))?;
        let receiver = mail
            .receiver
            .clone()
            .ok_or(NotificationError::NotConfigured("MAIL_RECEIVER"))?;
        let from_address = mail
            .from_address
            .clone()
            .ok_or(NotificationError::NotConfigured("MAIL_FROM_ADDRESS"))?;

        let transport = HttpMailTransport::new(
            mail.api_url.clone(),
            api_key,
            &mail.from_name,
            &from_address,
            mail.timeout,
        )?;
        info!(to = %receiver, "Email notifications enabled");

        Ok(Self::new(
            Some(Arc::new(transport) as Arc<dyn MailTransport>),
            receiver,
            mail.send_employer_confirmation,
            config.city.clone(),
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Detached delivery. The handle is only for callers that want to wait.
    pub fn dispatch(&self, event: NotificationEvent) -> tokio::task::JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver(&event).await })
    }

    pub async fn deliver(&self, event: &NotificationEvent) {
        let Some(transport) = &self.transport else {
            info!(tag = "email_skipped", event = event.name(), "Emails disabled, skipping notification");
            return;
        };

        for email in self.render(event) {
            match transport.send(&email).await {
                Ok(()) => info!(
                    tag = "email_sent",
                    event = event.name(),
                    to = %email.to,
                    subject = %email.subject,
                    "Notification sent"
                ),
                Err(e) => error!(
                    tag = "email_send_error",
                    event = event.name(),
                    to = %email.to,
                    error = %e,
                    "Failed to send notification"
                ),
            }
        }
    }

    fn render(&self, event: &NotificationEvent) -> Vec<OutboundEmail> {
        match event {
            NotificationEvent::EmployerJobSubmitted {
                submission,
                received_at,
            } => {
                let mut emails = vec![employer_staff_email(
                    &self.city,
                    &self.staff_inbox,
                    submission,
                    *received_at,
                )];
                if self.send_employer_confirmation {
                    emails.push(employer_confirmation_email(&self.city, submission));
                }
                emails
            }
            NotificationEvent::ContactReceived { message } => {
                vec![contact_staff_email(&self.city, &self.staff_inbox, message)]
            }
        }
    }
}

fn field(label: &str, value: &str) -> String {
    format!(
        "<p><strong>{}</strong><br>{}</p>",
        escape_html(label),
        escape_html(value)
    )
}

fn salary_line(sub: &EmployerJobSubmission) -> Option<String> {
    if sub.base_salary_min.is_none() && sub.base_salary_max.is_none() {
        return None;
    }
    let show = |v: Option<rust_decimal::Decimal>| {
        v.map(|d| d.normalize().to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    Some(format!(
        "€{} - €{} per hour",
        show(sub.base_salary_min),
        show(sub.base_salary_max)
    ))
}

fn plan_line(sub: &EmployerJobSubmission) -> String {
    match sub.plan_price_eur {
        Some(price) => format!("{} - €{}", sub.plan.as_str(), price.normalize()),
        None => sub.plan.as_str().to_string(),
    }
}

fn location_line(sub: &EmployerJobSubmission) -> String {
    match &sub.area {
        Some(area) => format!("{}, {}", sub.city, area),
        None => sub.city.clone(),
    }
}

pub fn employer_staff_email(
    city: &CityConfig,
    to: &str,
    sub: &EmployerJobSubmission,
    received_at: DateTime<Utc>,
) -> OutboundEmail {
    let received = received_at.format("%Y-%m-%d %H:%M UTC").to_string();
    let id = sub.id.to_string();
    let employment = sub.employment_type.display_name();
    let location = location_line(sub);
    let plan = plan_line(sub);

    let mut rows = vec![
        field("Submission ID", &id),
        field("Company", &sub.company),
        field("Contact person", &sub.contact_name),
        field("Email", &sub.email),
    ];
    if let Some(phone) = &sub.phone {
        rows.push(field("Phone", phone));
    }
    rows.extend([
        field("Job title", &sub.job_title),
        field("Employment type", &employment),
        field("Category", sub.category.label()),
        field("Location", &location),
    ]);
    if let Some(salary) = salary_line(sub) {
        rows.push(field("Salary range", &salary));
    }
    if sub.english_friendly {
        rows.push(field("English-friendly", "Yes"));
    }
    rows.push(field("Plan", &plan));
    rows.push(field("Description", &sub.description));
    if let Some(url) = &sub.external_url {
        rows.push(field("External apply URL", url));
    }
    if let Some(logo) = &sub.logo_url {
        rows.push(field("Logo", logo));
    }

    let html = format!(
        "<h1>New job submission</h1><p>{} &middot; status: {}</p>{}<p>Received at {}</p>",
        escape_html(&city.site_name()),
        escape_html(&sub.status),
        rows.join(""),
        escape_html(&received)
    );

    let mut text = vec![
        format!("New Job Submission - {}", city.site_name()),
        String::new(),
        format!("Submission ID: {}", id),
        format!("Status: {}", sub.status),
        String::new(),
        format!("Company: {}", sub.company),
        format!("Contact: {}", sub.contact_name),
        format!("Email: {}", sub.email),
    ];
    if let Some(phone) = &sub.phone {
        text.push(format!("Phone: {}", phone));
    }
    text.extend([
        String::new(),
        format!("Title: {}", sub.job_title),
        format!("Type: {}", employment),
        format!("Category: {}", sub.category.label()),
        format!("Location: {}", location),
    ]);
    if let Some(salary) = salary_line(sub) {
        text.push(format!("Salary: {}", salary));
    }
    if sub.english_friendly {
        text.push("English-friendly: Yes".to_string());
    }
    text.extend([
        format!("Plan: {}", plan),
        String::new(),
        sub.description.clone(),
    ]);
    if let Some(url) = &sub.external_url {
        text.push(format!("Apply URL: {}", url));
    }
    if let Some(logo) = &sub.logo_url {
        text.push(format!("Logo: {}", logo));
    }
    text.push(String::new());
    text.push(format!("Received at {}", received));

    OutboundEmail {
        to: to.to_string(),
        subject: format!("New Job: {} at {}", sub.job_title, sub.company),
        html,
        text: Some(text.join("\n")),
    }
}

pub fn employer_confirmation_email(city: &CityConfig, sub: &EmployerJobSubmission) -> OutboundEmail {
    let site = city.site_name();
    let html = format!(
        "<h1>Job submitted successfully</h1>\
         <p>Hi {name},</p>\
         <p>Thank you for submitting your job posting for <strong>{title}</strong>!</p>\
         <p>Our team will review it shortly. Most jobs are reviewed and published within 24 hours.</p>\
         <p>Best regards,<br><strong>{site} Team</strong></p>\
         <p><a href=\"https://{host}\">{host}</a></p>",
        name = escape_html(&sub.contact_name),
        title = escape_html(&sub.job_title),
        site = escape_html(&site),
        host = escape_html(&city.canonical_host),
    );
    let text = format!(
        "Hi {},\n\nThank you for submitting your job posting for {}!\n\
         Our team will review it shortly. Most jobs are reviewed and published within 24 hours.\n\n\
         Best regards,\n{} Team\nhttps://{}",
        sub.contact_name, sub.job_title, site, city.canonical_host
    );

    OutboundEmail {
        to: sub.email.clone(),
        subject: format!("Job Submitted: {}", sub.job_title),
        html,
        text: Some(text),
    }
}

pub fn contact_staff_email(city: &CityConfig, to: &str, msg: &ContactMessage) -> OutboundEmail {
    let name = msg.name.as_deref().unwrap_or("(no name)");
    let subject = msg.subject.as_deref().unwrap_or("(no subject)");
    let received = msg.submitted_at.format("%Y-%m-%d %H:%M UTC").to_string();

    let html = format!(
        "<h1>New contact message</h1><p>{}</p>{}{}{}{}<p>Received at {}</p>",
        escape_html(&city.site_name()),
        field("Name", name),
        field("Email", &msg.email),
        field("Subject", subject),
        field("Message", &msg.message),
        escape_html(&received)
    );
    let text = format!(
        "New contact message - {}\n\nName: {}\nEmail: {}\nSubject: {}\n\n{}\n\nReceived at {}",
        city.site_name(),
        name,
        msg.email,
        subject,
        msg.message,
        received
    );

    OutboundEmail {
        to: to.to_string(),
        subject: format!("Contact: {}", subject),
        html,
        text: Some(text),
    }
}

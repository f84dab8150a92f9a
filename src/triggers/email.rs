// src/triggers/email.rs — Mailbox-polling trigger (IMAP)
//
// Polls a mailbox for unseen messages on an interval and emits one
// {from, subject, body} event per message, flagging each Seen. IMAP is
// blocking, so each check cycle runs on a blocking thread.

use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::engine::{Event, EventSink, Payload};
use crate::triggers::Trigger;

fn default_port() -> u16 {
    993
}

fn default_mailbox() -> String {
    "INBOX".into()
}

fn default_interval() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
struct EmailParams {
    /// IMAP server hostname (e.g. "imap.example.com")
    imap_server: String,
    #[serde(default = "default_port")]
    port: u16,
    username: String,
    password: String,
    #[serde(default = "default_mailbox")]
    mailbox: String,
    /// Seconds between mailbox checks
    #[serde(default = "default_interval")]
    interval: u64,
}

/// Connection parameters handed to the blocking check cycle.
#[derive(Clone)]
struct MailboxConn {
    server: String,
    port: u16,
    username: String,
    password: String,
    mailbox: String,
}

pub struct EmailTrigger {
    conn: MailboxConn,
    interval: Duration,
}

impl EmailTrigger {
    pub const KIND: &'static str = "email";

    pub fn from_params(params: Payload) -> anyhow::Result<Self> {
        let params: EmailParams = serde_json::from_value(serde_json::Value::Object(params))
            .context("email trigger parameters")?;
        Ok(Self {
            conn: MailboxConn {
                server: params.imap_server,
                port: params.port,
                username: params.username,
                password: params.password,
                mailbox: params.mailbox,
            },
            interval: Duration::from_secs(params.interval),
        })
    }
}

impl Trigger for EmailTrigger {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn start(&self, sink: EventSink, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let conn = self.conn.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            tracing::info!(
                "email trigger watching {} on {} every {}s",
                conn.mailbox,
                conn.server,
                interval.as_secs()
            );

            loop {
                let cycle = {
                    let conn = conn.clone();
                    tokio::task::spawn_blocking(move || fetch_unseen(&conn)).await
                };

                match cycle {
                    Ok(Ok(payloads)) => {
                        for payload in payloads {
                            sink.dispatch(&Event::new(EmailTrigger::KIND, payload));
                        }
                    }
                    Ok(Err(e)) => tracing::error!("email trigger check failed: {:#}", e),
                    Err(e) => tracing::error!("email trigger worker panicked: {}", e),
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown.recv() => {
                        tracing::info!("email trigger stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// One check cycle: fetch unseen messages, flag them Seen, and return
/// their payloads in mailbox order.
fn fetch_unseen(conn: &MailboxConn) -> anyhow::Result<Vec<Payload>> {
    let client = imap::ClientBuilder::new(&conn.server, conn.port)
        .connect()
        .map_err(|e| anyhow!("IMAP connect failed: {}", e))?;

    let mut session = client
        .login(&conn.username, &conn.password)
        .map_err(|e| anyhow!("IMAP login failed: {}", e.0))?;

    session.select(&conn.mailbox)?;

    let mut unseen: Vec<u32> = session.search("UNSEEN")?.into_iter().collect();
    unseen.sort_unstable();

    let mut payloads = Vec::new();
    for seq in unseen {
        let fetches = session.fetch(seq.to_string(), "RFC822")?;
        for msg in fetches.iter() {
            if let Some(raw) = msg.body() {
                payloads.push(message_payload(raw));
            }
        }
        session.store(seq.to_string(), "+FLAGS (\\Seen)")?;
    }

    session.logout()?;
    Ok(payloads)
}

/// Build the {from, subject, body} payload for one raw message.
fn message_payload(raw: &[u8]) -> Payload {
    use mailparse::MailHeaderMap;

    let mut payload = Payload::new();
    match mailparse::parse_mail(raw) {
        Ok(parsed) => {
            let from = parsed
                .headers
                .get_first_value("From")
                .unwrap_or_else(|| "unknown".into());
            let subject = parsed.headers.get_first_value("Subject").unwrap_or_default();
            payload.insert("from".into(), from.into());
            payload.insert("subject".into(), subject.into());
            payload.insert("body".into(), extract_text(&parsed).into());
        }
        Err(e) => {
            tracing::warn!("unparseable message, passing raw body through: {}", e);
            payload.insert(
                "body".into(),
                String::from_utf8_lossy(raw).to_string().into(),
            );
        }
    }
    payload
}

/// Pull plain text out of a parsed message: text/plain part first, then
/// tag-stripped text/html, then the first part as-is.
fn extract_text(mail: &mailparse::ParsedMail) -> String {
    if mail.subparts.is_empty() {
        return mail.get_body().unwrap_or_default();
    }

    for part in &mail.subparts {
        if part.ctype.mimetype == "text/plain" {
            if let Ok(body) = part.get_body() {
                return body;
            }
        }
    }

    for part in &mail.subparts {
        if part.ctype.mimetype == "text/html" {
            if let Ok(body) = part.get_body() {
                return strip_html_tags(&body);
            }
        }
    }

    mail.subparts
        .first()
        .and_then(|p| p.get_body().ok())
        .unwrap_or_default()
}

/// Drop HTML tags and collapse whitespace.
fn strip_html_tags(html: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let mut collapsed = String::new();
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(ch);
            last_was_space = false;
        }
    }
    collapsed.trim().to_string()
}

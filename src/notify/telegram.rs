use std::time::Duration;

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{retry, Notifier};
use crate::config::{Secret, TelegramConfig};
use crate::error::NotificationError;

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

pub struct TelegramNotifier {
    client: Client,
    token: Option<Secret>,
    chat_id: Option<String>,
    api_base: String,
    attempts: u32,
    retry_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default http client");
                Client::new()
            });

        TelegramNotifier {
            client,
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.clone(),
            attempts: config.attempts,
            retry_delay: config.retry_delay,
        }
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/bot{token}/sendMessage", self.api_base.trim_end_matches('/'))
    }

    fn post_once(&self, url: &str, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        let resp = self.client.post(url).json(&SendMessage { chat_id, text }).send()?;

        let status = resp.status();
        if status.as_u16() == 200 {
            Ok(())
        } else {
            Err(NotificationError::Status {
                status: status.as_u16(),
                body: resp.text().unwrap_or_default(),
            })
        }
    }

    pub fn deliver(&self, text: &str) -> Result<u32, NotificationError> {
        let (Some(token), Some(chat_id)) = (self.token.as_ref(), self.chat_id.as_deref()) else {
            return Err(NotificationError::MissingCredentials);
        };
        let url = self.endpoint(token.expose());

        retry::with_fixed_delay(self.attempts, self.retry_delay, |_| self.post_once(&url, chat_id, text))
            .map(|((), attempt)| attempt)
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, text: &str) {
        match self.deliver(text) {
            Ok(attempt) => info!(attempt, "alert sent"),
            Err(NotificationError::MissingCredentials) => {
                warn!("chat token or chat id not configured, alert skipped")
            }
            Err(e) => error!(attempts = self.attempts, error = %e, "alert dropped"),
        }
    }
}

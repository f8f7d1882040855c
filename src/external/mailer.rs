use crate::config::MailerConfig;
use crate::entities::winner_entity as winners;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// 中奖通知。调用方只记录失败，不影响领奖结果
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify_winner(&self, winner: &winners::Model) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
pub struct SendMailRequest<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: String,
    pub text: String,
}

/// 通过 HTTP 邮件服务商接口发送邮件（JSON + Bearer key）
#[derive(Clone)]
pub struct MailerService {
    client: Client,
    config: MailerConfig,
}

impl MailerService {
    pub fn new(config: MailerConfig) -> Self {
        // 通知在领奖请求内同步等待，必须有超时上限
        let client = Client::builder()
            .user_agent("promo-backend/mailer")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build mailer client, using defaults: {e}");
                Client::new()
            });
        Self { client, config }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_url.is_empty() && !self.config.api_key.is_empty()
    }

    fn compose<'a>(&'a self, winner: &'a winners::Model) -> SendMailRequest<'a> {
        SendMailRequest {
            from: &self.config.from_address,
            to: &winner.email,
            subject: format!("You won: {}", winner.prize_awarded),
            text: format!(
                "Congratulations {}!\n\nYour code {} has won: {}.\nWe will contact you soon to arrange delivery.",
                winner.name, winner.winning_code, winner.prize_awarded
            ),
        }
    }
}

#[async_trait]
impl Notifier for MailerService {
    async fn notify_winner(&self, winner: &winners::Model) -> AppResult<()> {
        if !self.is_enabled() {
            log::debug!("Mailer disabled, skipping notification for {}", winner.winning_code);
            return Ok(());
        }

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&self.compose(winner))
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Winner email sent for code {}", winner.winning_code);
            Ok(())
        } else {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::ExternalApiError(format!(
                "Mail sending failed: HTTP {}: {}",
                status.as_u16(),
                error_text
            )))
        }
    }
}

//! `send_email_to_customer`: outbound email through the Resend API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use super::registry::{LocalTool, ToolDescriptor, ToolError, ToolKind};

/// Name the model calls the tool by.
pub const SEND_EMAIL_TOOL: &str = "send_email_to_customer";

/// Default Resend API base URL.
pub const RESEND_API_URL: &str = "https://api.resend.com";

/// Resend settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    pub api_key: String,
    /// Sender address, e.g. `Store <sales@example.com>`
    pub from: String,
    pub api_url: String,
}

/// Arguments accepted by the email tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendEmailArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Sends an email to the customer on the call.
#[derive(Debug, Clone)]
pub struct SendEmailTool {
    http: reqwest::Client,
    config: EmailConfig,
}

impl SendEmailTool {
    pub fn new(http: reqwest::Client, config: EmailConfig) -> Self {
        Self { http, config }
    }

    fn failed(message: impl Into<String>) -> ToolError {
        ToolError::Execution {
            name: SEND_EMAIL_TOOL.to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl LocalTool for SendEmailTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: SEND_EMAIL_TOOL.to_string(),
            description: Some(
                "Send an email to the customer, for example a payment link or an invoice summary."
                    .to_string(),
            ),
            parameters: json!({
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Customer email address"},
                    "subject": {"type": "string", "description": "Email subject"},
                    "body": {"type": "string", "description": "Plain text email body"}
                },
                "required": ["to", "subject", "body"]
            }),
            kind: ToolKind::Local,
        }
    }

    async fn invoke(&self, arguments: &str) -> Result<Value, ToolError> {
        let args: SendEmailArgs =
            serde_json::from_str(arguments).map_err(|_| ToolError::InvalidArguments)?;
        if !args.to.contains('@') {
            return Err(ToolError::InvalidArguments);
        }

        let url = format!("{}/emails", self.config.api_url.trim_end_matches('/'));
        let request = ResendRequest {
            from: &self.config.from,
            to: [args.to.as_str()],
            subject: &args.subject,
            text: &args.body,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, "Resend rejected email: {}", error_text);
            return Err(Self::failed(format!("HTTP {} - {}", status, error_text)));
        }

        let sent: ResendResponse = response
            .json()
            .await
            .map_err(|e| Self::failed(format!("Failed to parse response: {}", e)))?;

        info!(id = ?sent.id, "Email sent to customer");
        Ok(json!({ "success": true, "id": sent.id }))
    }
}

//! JSON envelopes returned by the tracker backend.
//!
//! View endpoints answer `{success, data, message?}`; form endpoints answer
//! `{success, message?, redirect?, refresh?}`. Both share one shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub refresh: bool,
}

/// What the page should do after a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Redirect(String),
    Refresh,
    Message(String),
    Failed(String),
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            redirect: None,
            refresh: false,
        }
    }

    /// A failed response with a message for the user.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            redirect: None,
            refresh: false,
        }
    }

    /// Resolve a form response: failures win, then redirect, then refresh.
    pub fn form_outcome(&self) -> FormOutcome {
        let message = self.message.clone().unwrap_or_default();
        if !self.success {
            return FormOutcome::Failed(message);
        }
        match &self.redirect {
            Some(url) if !url.is_empty() => FormOutcome::Redirect(url.clone()),
            _ if self.refresh => FormOutcome::Refresh,
            _ => FormOutcome::Message(message),
        }
    }

    /// The payload of a successful view response.
    pub fn into_data(self) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err("response carried no data".to_string()),
            (false, _) => Err(self.message.unwrap_or_else(|| "request failed".to_string())),
        }
    }
}

//! Localized two-part error messages

use codetree_config::Locale;
use serde::Serialize;

use crate::error::ApiError;

/// What the sidebar shows for a failed load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    /// Short label, e.g. "Error: Private repository"
    pub error: String,
    /// Explanation, may contain a link to create a token
    pub message: String,
    /// Whether to show the token input
    pub need_auth: bool,
}

impl ApiError {
    /// Render the error for display
    ///
    /// `create_token_url` is linked from messages that ask for a token.
    pub fn to_message(&self, locale: Locale, create_token_url: &str) -> ErrorMessage {
        let (label, message) = match locale {
            Locale::Zh => zh(self, create_token_url),
            Locale::En => en(self, create_token_url),
        };
        let prefix = match locale {
            Locale::Zh => "错误信息: ",
            Locale::En => "Error: ",
        };

        ErrorMessage {
            error: format!("{}{}", prefix, label),
            message,
            need_auth: self.need_auth(),
        }
    }
}

fn raw_text(err: &ApiError) -> String {
    match err {
        ApiError::Unclassified { status, status_text } if status_text.is_empty() => {
            status.to_string()
        }
        ApiError::Unclassified { status_text, .. } => status_text.clone(),
        ApiError::InvalidResponse(detail) => detail.clone(),
        other => other.to_string(),
    }
}

fn zh(err: &ApiError, url: &str) -> (String, String) {
    let (label, message) = match err {
        ApiError::Connection(_) => (
            "连接错误",
            "无法连接到网站. 如果你的网络连接这个网站很好,也许有一个中断的API. 请稍后再试.".to_string(),
        ),
        ApiError::TooLarge => (
            "仓库太大",
            "这个仓库检索太大. 如果你经常使用这个库,去设置和取消“立即加载整个仓库”的选项.".to_string(),
        ),
        ApiError::InvalidToken => (
            "无效的token",
            format!(
                "token是无效的.<br/><a href=\"{}\" target=\"_blank\">点此</a>去创建一个access token并粘贴到下面.",
                url
            ),
        ),
        ApiError::EmptyRepository => ("空仓库", "空仓库.".to_string()),
        ApiError::PrivateRepository => (
            "私人仓库",
            format!(
                "访问私有仓库需要access token.<br/><a href=\"{}\" target=\"_blank\">点此链接</a>去创建一个access token并粘贴到下面.",
                url
            ),
        ),
        ApiError::RateLimited => (
            "API超过限制",
            format!(
                "你已经超过GitHub API小时限制和需要GitHub访问令牌进行额外的请求.<br/><a href=\"{}\" target=\"_blank\">点此</a>去创建一个access token并粘贴到下面.",
                url
            ),
        ),
        ApiError::Forbidden => (
            "禁止访问",
            format!(
                "禁止访问. 你可能需要提供 access token.<br/><a href=\"{}\" target=\"_blank\">点此链接</a>去创建一个access token并粘贴到下面.",
                url
            ),
        ),
        ApiError::Unclassified { .. } | ApiError::InvalidResponse(_) => {
            let text = raw_text(err);
            return (text.clone(), text);
        }
    };
    (label.to_string(), message)
}

fn en(err: &ApiError, url: &str) -> (String, String) {
    let (label, message) = match err {
        ApiError::Connection(_) => (
            "Connection error",
            "Cannot connect to website. If your network connection to this website is fine, maybe there is an outage of the API. Please try again later.".to_string(),
        ),
        ApiError::TooLarge => (
            "Repo too large",
            "This repository is too large to be retrieved at once. If you frequently work with this repository, go to Settings and uncheck the \"Load entire tree at once\" option.".to_string(),
        ),
        ApiError::InvalidToken => (
            "Invalid token",
            format!(
                "The token is invalid.<br/>Follow <a href=\"{}\" target=\"_blank\">this link</a> to create a new token and paste it below.",
                url
            ),
        ),
        ApiError::EmptyRepository => ("Empty repository", "This repository is empty.".to_string()),
        ApiError::PrivateRepository => (
            "Private repository",
            format!(
                "Accessing private repositories requires an access token.<br/>Follow <a href=\"{}\" target=\"_blank\">this link</a> to create one and paste it below.",
                url
            ),
        ),
        ApiError::RateLimited => (
            "API limit exceeded",
            format!(
                "You have exceeded the hourly API limit and need an access token to make extra requests.<br/>Follow <a href=\"{}\" target=\"_blank\">this link</a> to create one and paste it below.",
                url
            ),
        ),
        ApiError::Forbidden => (
            "Forbidden",
            format!(
                "You are not allowed to access the API. You might need to provide an access token.<br/>Follow <a href=\"{}\" target=\"_blank\">this link</a> to create one and paste it below.",
                url
            ),
        ),
        ApiError::Unclassified { .. } | ApiError::InvalidResponse(_) => {
            let text = raw_text(err);
            return (text.clone(), text);
        }
    };
    (label.to_string(), message)
}

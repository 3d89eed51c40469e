//! Shared blocking HTTP client construction and response handling.

use std::time::Duration;

use crate::error::LlmError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create a blocking HTTP client with the standard skillbridge configuration.
///
/// Config: 30s connect timeout, `timeout_secs` request timeout, rustls TLS,
/// `skillbridge/{version}` user-agent, redirect limit 10.
#[must_use]
pub fn default_client(timeout_secs: u64) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("skillbridge/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("default HTTP client construction must not fail")
}

/// Read the response body, mapping 429 and other non-success statuses to errors.
pub(crate) fn read_body(
    provider: &'static str,
    response: reqwest::blocking::Response,
) -> Result<String, LlmError> {
    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("{provider} rate limited the request");
        return Err(LlmError::RateLimited { provider });
    }

    let text = response.text()?;
    if !status.is_success() {
        tracing::error!("{provider} API error {status}: {text}");
        return Err(LlmError::Api {
            provider,
            status: status.as_u16(),
        });
    }
    Ok(text)
}

pub(crate) fn trim_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_base_url_strips_trailing_slashes() {
        assert_eq!(trim_base_url("http://host:1//".into()), "http://host:1");
        assert_eq!(trim_base_url("http://host:1".into()), "http://host:1");
    }

    #[test]
    fn default_client_builds() {
        let _client = default_client(DEFAULT_TIMEOUT_SECS);
    }
}

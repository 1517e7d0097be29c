use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::{GatewayError, Result};

const DISABLE_SYSTEM_PROXY_ENV: &str = "AGRIMATE_DISABLE_SYSTEM_PROXY";
const USER_AGENT: &str = concat!("agrimate/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 512;

/// Build a client without a request deadline.
pub fn build_http_client() -> Result<Client> {
    builder().build().map_err(GatewayError::from)
}

/// Build a client whose requests fail after `timeout`.
pub fn build_http_client_with_timeout(timeout: Duration) -> Result<Client> {
    builder().timeout(timeout).build().map_err(GatewayError::from)
}

fn builder() -> reqwest::ClientBuilder {
    let builder = Client::builder().user_agent(USER_AGENT);
    if should_disable_system_proxy() {
        builder.no_proxy()
    } else {
        builder
    }
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}

/// Turn a non-success response into an [`GatewayError::Upstream`].
pub(crate) async fn response_to_error(response: Response, service: &str) -> GatewayError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Cut on a char boundary so the message stays valid UTF-8.
    let message = if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &body[..end])
    } else {
        body
    };

    GatewayError::Upstream {
        service: service.to_string(),
        status,
        message,
    }
}

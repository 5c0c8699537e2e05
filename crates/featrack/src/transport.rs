//! HTTP transport for the Featrack API.

use crate::config::Config;
use crate::types::ApiErrorBody;
use crate::Error;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// API endpoints, relative to the configured base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    CustomersCreate,
    SessionsStart,
    SessionsSetTime,
    SessionsEnd,
    SessionsIdentify,
    UsagesConsume,
}

impl Endpoint {
    pub(crate) fn path(self) -> &'static str {
        match self {
            Endpoint::CustomersCreate => "customers/create",
            Endpoint::SessionsStart => "sessions/start",
            Endpoint::SessionsSetTime => "sessions/set-time",
            Endpoint::SessionsEnd => "sessions/end",
            Endpoint::SessionsIdentify => "sessions/identify",
            Endpoint::UsagesConsume => "usages/consume",
        }
    }
}

/// HTTP client bound to a base URL and bearer token.
#[derive(Debug)]
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build the client. Performs no I/O.
    pub(crate) fn new(config: &Config) -> Result<Self, Error> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.auth_token()))
            .map_err(|_| Error::Config("auth token contains invalid header characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url().to_string(),
        })
    }

    pub(crate) fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// POST a JSON body and decode the JSON response.
    ///
    /// Non-success responses become [`Error::Api`] carrying the server's
    /// `message` (or `error`) field, or a generic message when the body has
    /// neither.
    pub(crate) async fn post<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(endpoint);
        debug!(endpoint = endpoint.path(), "sending request");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &bytes);
            debug!(endpoint = endpoint.path(), status = %status, message = %message, "request failed");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(endpoint = endpoint.path(), status = %status, "request succeeded");

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return decode_empty();
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Decode an empty success body: `null` for free-form responses, `{}` for
/// structs whose fields all have defaults.
fn decode_empty<R: DeserializeOwned>() -> Result<R, Error> {
    serde_json::from_value(Value::Null)
        .or_else(|_| serde_json::from_value(Value::Object(Map::new())))
        .map_err(Error::from)
}

fn error_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatrackBuilder;
    use crate::types::{Ack, SessionStarted};

    #[test]
    fn test_url_construction() {
        let config = FeatrackBuilder::new("tok", "app")
            .api_url("https://example.com/api")
            .build_config();

        let transport = HttpTransport::new(&config).unwrap();

        assert_eq!(
            transport.url(Endpoint::SessionsSetTime),
            "https://example.com/api/sessions/set-time"
        );
        assert_eq!(
            transport.url(Endpoint::UsagesConsume),
            "https://example.com/api/usages/consume"
        );
    }

    #[test]
    fn test_invalid_token_is_config_error() {
        let config = FeatrackBuilder::new("bad\ntoken", "app").build_config();

        let result = HttpTransport::new(&config);

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_body_decoding() {
        assert_eq!(decode_empty::<Value>().unwrap(), Value::Null);
        assert_eq!(decode_empty::<Ack>().unwrap(), Ack { success: false });
        assert!(matches!(
            decode_empty::<SessionStarted>(),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(400, br#"{"message":"bad slug"}"#), "bad slug");
        assert_eq!(error_message(401, br#"{"error":"unauthorized"}"#), "unauthorized");
        assert_eq!(
            error_message(500, b"<html>oops</html>"),
            "Request failed with status code 500"
        );
        assert_eq!(
            error_message(502, br#"{"message":""}"#),
            "Request failed with status code 502"
        );
    }
}

// Campus API HTTP client
//
// Wraps `reqwest::Client` with base-URL path construction, the auth
// stage, and `{ message, <key>: payload }` envelope unwrapping. Endpoint
// groups (auth, resources) are implemented as inherent methods in
// separate modules to keep this one focused on transport mechanics.

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::auth::AuthLayer;
use crate::error::Error;
use crate::models::{Section, Student, Subject, Teacher};
use crate::resources::ResourceClient;
use crate::transport::TransportConfig;

/// Raw HTTP client for the campus API.
///
/// Cheap to share by reference; resource clients borrow it.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthLayer,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the API root (e.g. `http://localhost:3000`); it may
    /// carry a path prefix such as `/api`.
    pub fn new(base_url: Url, transport: &TransportConfig, auth: AuthLayer) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, auth))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, auth: AuthLayer) -> Self {
        Self {
            http,
            base_url,
            auth,
        }
    }

    // ── Resource groups ──────────────────────────────────────────────

    pub fn students(&self) -> ResourceClient<'_, Student> {
        ResourceClient::new(self)
    }

    pub fn teachers(&self) -> ResourceClient<'_, Teacher> {
        ResourceClient::new(self)
    }

    pub fn subjects(&self) -> ResourceClient<'_, Subject> {
        ResourceClient::new(self)
    }

    pub fn sections(&self) -> ResourceClient<'_, Section> {
        ResourceClient::new(self)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::UnusableBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a request with the credential already attached.
    pub(crate) fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, Error> {
        let url = self.endpoint(segments)?;
        debug!("{method} {url}");
        Ok(self.auth.authorize(self.http.request(method, url)))
    }

    /// Send a request, run the response side of the auth stage, and
    /// unwrap the envelope.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Envelope, Error> {
        let resp = builder.send().await?;
        let status = resp.status();
        // A rejected credential must reach the auth stage even when the
        // body cannot be read.
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) if status == StatusCode::UNAUTHORIZED => {
                debug!(error = %e, "unreadable 401 body");
                String::new()
            }
            Err(e) => return Err(e.into()),
        };
        trace!(%status, bytes = body.len(), "response received");

        self.auth.inspect(status, &body)?;

        if !status.is_success() {
            return Err(Error::from_response(status, &body));
        }

        Envelope::parse(&body)
    }
}

// ── Envelope ─────────────────────────────────────────────────────────

/// A decoded `{ message, <key>: payload, pagination? }` response body.
///
/// Bare arrays are accepted too and exposed under the `data` key.
#[derive(Debug, Default)]
pub(crate) struct Envelope {
    fields: Map<String, Value>,
    raw: String,
}

impl Envelope {
    fn parse(body: &str) -> Result<Self, Error> {
        if body.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_str(body).map_err(|e| deserialization(&e, body))?;
        let fields = match value {
            Value::Object(map) => map,
            Value::Array(items) => {
                let mut map = Map::new();
                map.insert("data".into(), Value::Array(items));
                map
            }
            other => {
                let mut map = Map::new();
                map.insert("data".into(), other);
                map
            }
        };

        Ok(Self {
            fields,
            raw: body.to_owned(),
        })
    }

    /// Take the payload stored under `key`.
    pub(crate) fn take<T: DeserializeOwned>(&mut self, key: &'static str) -> Result<T, Error> {
        let value = self.fields.remove(key).ok_or(Error::MissingPayload { key })?;
        serde_json::from_value(value).map_err(|e| deserialization(&e, &self.raw))
    }

    /// Take the list payload stored under `key`, falling back to `data`.
    pub(crate) fn take_list<T: DeserializeOwned>(&mut self, key: &'static str) -> Result<T, Error> {
        if self.fields.contains_key(key) {
            self.take(key)
        } else if self.fields.contains_key("data") {
            self.take("data")
        } else {
            Err(Error::MissingPayload { key })
        }
    }

    /// Take an optional payload; absent or `null` yields `None`.
    pub(crate) fn take_optional<T: DeserializeOwned>(
        &mut self,
        key: &'static str,
    ) -> Result<Option<T>, Error> {
        match self.fields.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| deserialization(&e, &self.raw)),
        }
    }

    /// Deserialize the whole envelope as one struct.
    pub(crate) fn into_inner<T: DeserializeOwned>(self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.fields)).map_err(|e| deserialization(&e, &self.raw))
    }
}

fn deserialization(err: &serde_json::Error, body: &str) -> Error {
    let preview: String = body.chars().take(200).collect();
    Error::Deserialization {
        message: format!("{err} (body preview: {preview:?})"),
        body: body.to_owned(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            AuthLayer::anonymous(),
        )
    }

    #[test]
    fn endpoint_appends_segments() {
        let api = client("http://localhost:3000");
        let url = api.endpoint(&["student", "students", "7"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/student/students/7");
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let api = client("http://localhost:3000/api/");
        let url = api.endpoint(&["subject", "subjects"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/subject/subjects");
    }

    #[test]
    fn endpoint_encodes_identifiers() {
        let api = client("http://localhost:3000");
        let url = api.endpoint(&["teacher", "teachers", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/teacher/teachers/a%2Fb%20c");
    }

    #[test]
    fn envelope_accepts_bare_arrays() {
        let mut env = Envelope::parse(r#"[{"n":1},{"n":2}]"#).unwrap();
        let items: Vec<Value> = env.take_list("sections").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn envelope_reports_missing_key() {
        let mut env = Envelope::parse(r#"{"message":"ok"}"#).unwrap();
        let err = env.take::<Value>("student").unwrap_err();
        assert!(matches!(err, Error::MissingPayload { key: "student" }));
    }
}

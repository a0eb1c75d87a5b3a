use axum::extract::{ConnectInfo, MatchedPath};
use axum::http::{HeaderMap, header, request::Parts};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Descriptor of a file uploaded with the failing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}

/// Read-only copy of the inbound request, taken when an error is handled.
///
/// Serializes with the same top-level keys the log context uses:
/// `attributes`, `request` (the POST body), `query`, `server`, `files`,
/// `cookies`, `headers`, `requestUri` and `method`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    attributes: BTreeMap<String, String>,
    #[serde(rename = "request")]
    body: BTreeMap<String, Value>,
    query: BTreeMap<String, String>,
    server: BTreeMap<String, String>,
    files: Vec<UploadedFile>,
    cookies: BTreeMap<String, String>,
    headers: BTreeMap<String, Vec<String>>,
    request_uri: String,
    method: String,
}

/// Body encodings whose fields end up in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyFormat {
    Form,
    Json,
}

impl BodyFormat {
    pub(crate) fn of(headers: &HeaderMap) -> Option<Self> {
        let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime == "application/x-www-form-urlencoded" {
            Some(Self::Form)
        } else if mime == "application/json" || mime.ends_with("+json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

impl RequestSnapshot {
    pub fn builder() -> RequestSnapshotBuilder {
        RequestSnapshotBuilder::default()
    }

    /// Capture the request head plus, when it was buffered, its body.
    ///
    /// Form and JSON-object bodies populate the `request` map; any other body
    /// is ignored. Malformed query strings or bodies leave their maps empty.
    pub fn capture(parts: &Parts, body: Option<&[u8]>) -> Self {
        let mut snapshot = Self {
            method: parts.method.as_str().to_string(),
            request_uri: parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string()),
            ..Self::default()
        };

        if let Some(query) = parts.uri.query() {
            snapshot.query = parse_pairs(query.as_bytes());
        }

        for (name, value) in &parts.headers {
            snapshot
                .headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        snapshot.cookies = parse_cookies(&parts.headers);

        if let Some(route) = parts.extensions.get::<MatchedPath>() {
            snapshot
                .attributes
                .insert("_route".to_string(), route.as_str().to_string());
        }

        snapshot.server = server_params(parts);

        if let (Some(bytes), Some(format)) = (body, BodyFormat::of(&parts.headers)) {
            snapshot.body = parse_body(bytes, format);
        }

        snapshot
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Fields of the POST body.
    pub fn body(&self) -> &BTreeMap<String, Value> {
        &self.body
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn server(&self) -> &BTreeMap<String, String> {
        &self.server
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.cookies
    }

    pub fn headers(&self) -> &BTreeMap<String, Vec<String>> {
        &self.headers
    }

    pub fn request_uri(&self) -> &str {
        &self.request_uri
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

fn parse_pairs(input: &[u8]) -> BTreeMap<String, String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(input)
        .map(|pairs| pairs.into_iter().collect())
        .unwrap_or_default()
}

fn parse_body(bytes: &[u8], format: BodyFormat) -> BTreeMap<String, Value> {
    match format {
        BodyFormat::Form => parse_pairs(bytes)
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
        BodyFormat::Json => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => fields.into_iter().collect(),
            _ => BTreeMap::new(),
        },
    }
}

fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    cookies
                        .entry(name.to_string())
                        .or_insert_with(|| value.trim().trim_matches('"').to_string());
                }
            }
        }
    }
    cookies
}

fn server_params(parts: &Parts) -> BTreeMap<String, String> {
    let mut server = BTreeMap::new();
    server.insert("SERVER_PROTOCOL".to_string(), format!("{:?}", parts.version));
    server.insert("REQUEST_METHOD".to_string(), parts.method.to_string());
    server.insert("REQUEST_URI".to_string(), parts.uri.to_string());
    if let Some(query) = parts.uri.query() {
        server.insert("QUERY_STRING".to_string(), query.to_string());
    }

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()));
    if let Some(host) = host {
        server.insert("HTTP_HOST".to_string(), host);
    }

    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        server.insert("REMOTE_ADDR".to_string(), addr.ip().to_string());
        server.insert("REMOTE_PORT".to_string(), addr.port().to_string());
    }
    server
}

/// Builds snapshots by hand, for pipelines that are not axum-based or that
/// know about uploaded files.
#[derive(Debug, Default)]
pub struct RequestSnapshotBuilder {
    snapshot: RequestSnapshot,
}

impl RequestSnapshotBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.snapshot.method = method.into();
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.snapshot.request_uri = uri.into();
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.attributes.insert(key.into(), value.into());
        self
    }

    pub fn body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.snapshot.body.insert(key.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.query.insert(key.into(), value.into());
        self
    }

    pub fn server(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.server.insert(key.into(), value.into());
        self
    }

    pub fn file(mut self, file: UploadedFile) -> Self {
        self.snapshot.files.push(file);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.cookies.insert(name.into(), value.into());
        self
    }

    /// Append a header value; repeated names accumulate.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot
            .headers
            .entry(name.into().to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn build(self) -> RequestSnapshot {
        self.snapshot
    }
}

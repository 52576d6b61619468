//! Blocking client for the Beeper Desktop local API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | accounts | `GET /v1/accounts` |
//! | chats | `GET /v1/chats?cursor=..&direction=before` |
//! | messages | `GET /v1/chats/{chatID}/messages?cursor=..&direction=before` |
//! | asset hydration | `POST /v1/assets/download` with `{"url": ...}` |
//!
//! List endpoints answer with a page envelope
//! `{"items": [...], "hasMore": bool, "oldestCursor": "..."}` and are followed
//! until `hasMore` is false or no cursor is returned.

use std::fs;
use std::path::PathBuf;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::{ChatSource, MessageStream};
use crate::config::ClientConfig;
use crate::core::models::{Account, Chat};
use crate::error::{ApiErrorKind, BeepexError, Result};
use crate::message::{Attachment, Message};

/// Oldest Beeper Desktop release whose API this client understands.
pub const MIN_BEEPER_VERSION: &str = "4.1.244";

const VERSION_HEADER: &str = "X-Beeper-Desktop-Version";

/// Longest response body quoted in an error message.
const MAX_ERROR_BODY: usize = 200;

/// One page of a list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    oldest_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Cursor of the following page, if there is one.
    fn next_cursor(&self) -> Option<String> {
        if self.has_more {
            self.oldest_cursor.clone().filter(|c| !c.is_empty())
        } else {
            None
        }
    }
}

/// Some endpoints return a bare array instead of a page envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Paged(Page<T>),
}

impl<T> Listing<T> {
    fn into_page(self) -> Page<T> {
        match self {
            Listing::Bare(items) => Page {
                items,
                has_more: false,
                oldest_cursor: None,
            },
            Listing::Paged(page) => page,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadedAsset {
    #[serde(rename = "srcURL", default)]
    src_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn parse_json<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| BeepexError::api(operation, ApiErrorKind::Malformed(e.to_string())))
}

fn parse_page<T: DeserializeOwned>(operation: &str, body: &str) -> Result<Page<T>> {
    parse_json::<Listing<T>>(operation, body).map(Listing::into_page)
}

/// Numeric components of a dotted version; trailing non-digits in a
/// component (`244-beta`) are ignored.
fn parse_version(version: &str) -> Option<Vec<u64>> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}

/// Returns `Some(true)` if `found` is at least `required`, `None` if either
/// does not parse.
///
/// ```
/// use beepex::source::version_at_least;
///
/// assert_eq!(version_at_least("4.1.300", "4.1.244"), Some(true));
/// assert_eq!(version_at_least("4.0.999", "4.1.244"), Some(false));
/// assert_eq!(version_at_least("4.2", "4.1.244"), Some(true));
/// ```
pub fn version_at_least(found: &str, required: &str) -> Option<bool> {
    let mut found = parse_version(found)?;
    let mut required = parse_version(required)?;
    let len = found.len().max(required.len());
    found.resize(len, 0);
    required.resize(len, 0);
    Some(found >= required)
}

/// Passes successful responses through and maps the rest to API errors.
fn check_status(operation: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = status.as_u16();
    let kind = if code == 401 || code == 403 {
        ApiErrorKind::Unauthorized { status: code }
    } else {
        let body = response.text().unwrap_or_default();
        ApiErrorKind::Status {
            status: code,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }
    };
    Err(BeepexError::api(operation, kind))
}

/// Resolves a `file://` URL to a local path.
fn file_url_to_path(src: &str) -> Result<PathBuf> {
    let invalid = || BeepexError::api("read attachment", ApiErrorKind::AssetUrl(src.to_string()));
    Url::parse(src)
        .map_err(|_| invalid())?
        .to_file_path()
        .map_err(|()| invalid())
}

/// [`ChatSource`] backed by Beeper Desktop's HTTP API.
#[derive(Debug)]
pub struct BeeperClient {
    http: Client,
    base: Url,
    config: ClientConfig,
    version: Option<String>,
}

impl BeeperClient {
    /// Creates a client without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid, or an API
    /// error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            BeepexError::config(format!("invalid API URL '{}': {e}", config.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(BeepexError::config(format!(
                "invalid API URL '{}'",
                config.base_url
            )));
        }
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BeepexError::api("create HTTP client", ApiErrorKind::Http(e)))?;

        Ok(Self {
            http,
            base,
            config,
            version: None,
        })
    }

    /// Creates a client and checks that Beeper Desktop is reachable and recent enough.
    ///
    /// # Errors
    ///
    /// Returns an API error if the server is unreachable, rejects the token,
    /// does not report a version, or is older than [`MIN_BEEPER_VERSION`].
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        let version = client.check_version()?;
        info!(%version, "connected to Beeper Desktop");
        client.version = Some(version);
        Ok(client)
    }

    /// Version reported during [`connect`](Self::connect).
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn check_version(&self) -> Result<String> {
        const OP: &str = "check Beeper version";
        let response = self.send(OP, self.http.get(self.endpoint(&["v1", "accounts"])))?;
        let found = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| BeepexError::api(OP, ApiErrorKind::MissingVersion))?;

        match version_at_least(&found, MIN_BEEPER_VERSION) {
            Some(true) => Ok(found),
            Some(false) => Err(BeepexError::api(
                OP,
                ApiErrorKind::UnsupportedVersion {
                    found,
                    required: MIN_BEEPER_VERSION,
                },
            )),
            None => Err(BeepexError::api(
                OP,
                ApiErrorKind::Malformed(format!("unparsable version '{found}'")),
            )),
        }
    }

    /// Absolute URL for the given path segments, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Whether `url` points at the Beeper API itself (same scheme, host and port).
    fn is_api_origin(&self, url: &Url) -> bool {
        url.origin() == self.base.origin()
    }

    /// Sends an authenticated request and maps failures to API errors.
    ///
    /// Only use this for requests to [`endpoint`](Self::endpoint) or other
    /// URLs on the API origin; the access token goes with every call.
    fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.config.token)
            .send()
            .map_err(|e| self.transport_error(operation, e))?;
        check_status(operation, response)
    }

    fn transport_error(&self, operation: &str, err: reqwest::Error) -> BeepexError {
        if err.is_connect() {
            debug!(error = %err, "connection failed");
            BeepexError::api(
                operation,
                ApiErrorKind::Unreachable {
                    url: self.config.base_url.clone(),
                },
            )
        } else {
            BeepexError::api(operation, ApiErrorKind::Http(err))
        }
    }

    fn read_body(&self, operation: &str, response: Response) -> Result<String> {
        response
            .text()
            .map_err(|e| self.transport_error(operation, e))
    }

    fn get_page<T: DeserializeOwned>(
        &self,
        operation: &str,
        segments: &[&str],
        cursor: Option<&str>,
    ) -> Result<Page<T>> {
        let mut request = self.http.get(self.endpoint(segments));
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor), ("direction", "before")]);
        }
        let response = self.send(operation, request)?;
        let body = self.read_body(operation, response)?;
        let page = parse_page(operation, &body)?;
        debug!(
            operation,
            items = page.items.len(),
            has_more = page.has_more,
            "fetched page"
        );
        Ok(page)
    }

    /// Follows a list endpoint until the last page.
    fn get_all<T: DeserializeOwned>(&self, operation: &str, segments: &[&str]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.get_page(operation, segments, cursor.as_deref())?;
            let next = page.next_cursor();
            items.extend(page.items);
            match next {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                Some(_) => {
                    warn!(operation, "server repeated a page cursor, stopping");
                    break;
                }
                None => break,
            }
        }
        Ok(items)
    }

    /// Asks Beeper to download an `mxc://` asset into its cache.
    ///
    /// Returns the `file://` URL of the cached copy.
    fn hydrate(&self, src: &str) -> Result<String> {
        const OP: &str = "download asset";
        let request = self
            .http
            .post(self.endpoint(&["v1", "assets", "download"]))
            .json(&serde_json::json!({ "url": src }));
        let response = self.send(OP, request)?;
        let body = self.read_body(OP, response)?;
        let asset: DownloadedAsset = parse_json(OP, &body)?;

        if let Some(error) = asset.error.filter(|e| !e.is_empty()) {
            return Err(BeepexError::api(
                OP,
                ApiErrorKind::Malformed(format!("{src}: {error}")),
            ));
        }
        asset
            .src_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| BeepexError::api(OP, ApiErrorKind::Malformed("missing srcURL".into())))
    }

    fn download(&self, src: &str) -> Result<Vec<u8>> {
        const OP: &str = "download attachment";
        let url = Url::parse(src)
            .map_err(|_| BeepexError::api(OP, ApiErrorKind::AssetUrl(src.to_string())))?;

        let response = if self.is_api_origin(&url) {
            self.send(OP, self.http.get(url))?
        } else {
            debug!(host = url.host_str().unwrap_or_default(), "downloading without token");
            let response = self
                .http
                .get(url)
                .send()
                .map_err(|e| BeepexError::api(OP, ApiErrorKind::Http(e)))?;
            check_status(OP, response)?
        };
        let bytes = response
            .bytes()
            .map_err(|e| self.transport_error(OP, e))?;
        Ok(bytes.to_vec())
    }
}

impl ChatSource for BeeperClient {
    fn list_accounts(&self) -> Result<Vec<Account>> {
        self.get_all("list accounts", &["v1", "accounts"])
    }

    fn list_chats(&self) -> Result<Vec<Chat>> {
        self.get_all("list chats", &["v1", "chats"])
    }

    fn list_messages(&self, chat_id: &str) -> Result<MessageStream<'_>> {
        Ok(Box::new(MessagePages {
            client: self,
            chat_id: chat_id.to_string(),
            cursor: None,
            buffer: Vec::new().into_iter(),
            finished: false,
        }))
    }

    fn fetch_attachment(&self, attachment: &Attachment) -> Result<Vec<u8>> {
        let mut src = attachment.src_url.clone();
        if src.starts_with("mxc://") || src.starts_with("localmxc://") {
            src = self.hydrate(&src)?;
            debug!(from = %attachment.src_url, to = %src, "hydrated asset");
        }

        if src.starts_with("file://") {
            let path = file_url_to_path(&src)?;
            Ok(fs::read(path)?)
        } else if src.starts_with("http://") || src.starts_with("https://") {
            self.download(&src)
        } else {
            Err(BeepexError::api(
                "fetch attachment",
                ApiErrorKind::AssetUrl(src),
            ))
        }
    }
}

/// Messages of one chat, one page at a time.
struct MessagePages<'a> {
    client: &'a BeeperClient,
    chat_id: String,
    cursor: Option<String>,
    buffer: std::vec::IntoIter<Message>,
    finished: bool,
}

impl Iterator for MessagePages<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.buffer.next() {
                return Some(Ok(message));
            }
            if self.finished {
                return None;
            }
            let page = self.client.get_page::<Message>(
                "list messages",
                &["v1", "chats", &self.chat_id, "messages"],
                self.cursor.as_deref(),
            );
            match page {
                Ok(page) => {
                    let next = page.next_cursor();
                    if next.is_none() || next == self.cursor {
                        self.finished = true;
                    }
                    self.cursor = next;
                    self.buffer = page.items.into_iter();
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

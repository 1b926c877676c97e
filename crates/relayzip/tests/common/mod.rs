//! Canned HTTP server and zip fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use relayzip::{Settings, SourceConfig};
use relayzip_archive::{BuilderEntry, ZipBuilder};
use relayzip_fetch::{BoxStream, HttpClient};

pub const BASE: &str = "http://stub.test";
pub const FOO_PATTERN: &str = r"^foo-20\d\d-\d\d-\d\d\.zip$";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct StubError(pub String);

#[derive(Clone)]
enum Route {
    Page(String),
    Download {
        body: Vec<u8>,
        chunk: usize,
        fail_after: Option<usize>,
    },
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, Route>,
    requests: Mutex<Vec<String>>,
}

/// In-process stand-in for the remote site. Clones share routes and the
/// request log.
#[derive(Clone, Default)]
pub struct StubClient {
    inner: Arc<Inner>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(mut self, path: &str, route: Route) -> Self {
        let inner = Arc::get_mut(&mut self.inner).expect("routes are set up before sharing");
        inner.routes.insert(format!("{BASE}/{path}"), route);
        self
    }

    pub fn page(self, path: &str, html: &str) -> Self {
        self.route(path, Route::Page(html.to_string()))
    }

    pub fn download(self, path: &str, body: Vec<u8>, chunk: usize) -> Self {
        self.route(
            path,
            Route::Download {
                body,
                chunk,
                fail_after: None,
            },
        )
    }

    /// Serve `body`, then fail once `fail_after` bytes have been sent.
    pub fn broken_download(self, path: &str, body: Vec<u8>, chunk: usize, fail_after: usize) -> Self {
        self.route(
            path,
            Route::Download {
                body,
                chunk,
                fail_after: Some(fail_after),
            },
        )
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.requests.lock().unwrap().clone()
    }

    fn log(&self, url: &str) {
        self.inner.requests.lock().unwrap().push(url.to_string());
    }
}

impl HttpClient for StubClient {
    type Error = StubError;

    async fn get_text(&self, url: &str) -> Result<String, StubError> {
        self.log(url);
        match self.inner.routes.get(url) {
            Some(Route::Page(html)) => Ok(html.clone()),
            _ => Err(StubError(format!("HTTP status client error (404 Not Found) for url ({url})"))),
        }
    }

    async fn stream(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<BoxStream<'static, Result<Bytes, StubError>>, StubError> {
        self.log(url);
        let Some(Route::Download {
            body,
            chunk,
            fail_after,
        }) = self.inner.routes.get(url).cloned()
        else {
            return Err(StubError(format!("HTTP status client error (404 Not Found) for url ({url})")));
        };

        let cut = fail_after.unwrap_or(body.len()).min(body.len());
        let mut items: Vec<Result<Bytes, StubError>> = body[..cut]
            .chunks(chunk.max(1))
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        if fail_after.is_some() {
            items.push(Err(StubError("connection reset by peer".to_string())));
        }
        Ok(Box::pin(futures_util::stream::iter(items)))
    }
}

pub fn anchor_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| format!("<li><a href=\"{href}\">{href}</a></li>\n"))
        .collect();
    format!("<html><body><ul>\n<li><a href=\"readme.txt\">readme</a></li>\n{items}</ul></body></html>")
}

pub fn zip(entries: Vec<BuilderEntry>) -> Vec<u8> {
    entries
        .into_iter()
        .fold(ZipBuilder::new(), ZipBuilder::entry)
        .finish()
        .unwrap()
}

/// Pseudo-random bytes that deflate poorly.
pub fn noise(len: usize) -> Vec<u8> {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        })
        .collect()
}

/// Settings with a single `result` source writing to `mem://out/result.csv`.
pub fn settings() -> Settings {
    Settings {
        base_url: BASE.to_string(),
        destination: Some("mem://out".to_string()),
        base_dir: String::new(),
        output_prefix: String::new(),
        sources: [(
            "result".to_string(),
            SourceConfig::new("index.html", FOO_PATTERN, "csv"),
        )]
        .into_iter()
        .collect(),
        ..Settings::default()
    }
}

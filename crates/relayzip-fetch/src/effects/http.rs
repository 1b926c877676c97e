use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::Stream;

/// Response body as delivered by an [`HttpClient`].
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// The two requests relayzip makes: fetch an index page, and stream a
/// download.
///
/// Redirects, timeouts and proxies are the implementation's business.
/// [`ReqwestClient`] is the real one; tests plug in canned responses.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// GET `url` and return the whole body as text.
    ///
    /// Used for index pages only; archive bodies go through [`HttpClient::stream`].
    /// A non-2xx status must be reported as an error.
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Open a streaming GET and return the response body as a stream.
    ///
    /// The returned future resolves once response headers are available; the
    /// body is not buffered. A non-2xx status must be reported as an error.
    /// Dropping the stream must release the connection.
    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error>> + Send;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    type Error = C::Error;

    fn get_text(&self, url: &str) -> impl Future<Output = Result<String, Self::Error>> + Send {
        (**self).get_text(url)
    }

    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error>> + Send
    {
        (**self).stream(url, headers)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::{Client, Proxy, Url};
    use serde::{Deserialize, Serialize};

    use super::*;

    /// Settings used to build the production client.
    ///
    /// No timeout is applied unless configured; long archive downloads are
    /// expected to outlive any sensible whole-request deadline.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ClientSetting {
        pub user_agent: Option<String>,
        pub connect_timeout_secs: Option<u64>,
        pub timeout_secs: Option<u64>,
        pub proxies: Vec<String>,
    }

    impl ClientSetting {
        pub fn build(&self) -> Result<Client, reqwest::Error> {
            let mut cb = Client::builder();

            if let Some(ua) = &self.user_agent {
                cb = cb.user_agent(ua.clone());
            }
            if let Some(secs) = self.connect_timeout_secs {
                cb = cb.connect_timeout(Duration::from_secs(secs));
            }
            if let Some(secs) = self.timeout_secs {
                cb = cb.timeout(Duration::from_secs(secs));
            }

            for proxy in &self.proxies {
                let secure = Url::parse(proxy).is_ok_and(|u| u.scheme() == "https");
                cb = cb.proxy(if secure {
                    Proxy::https(proxy)?
                } else {
                    Proxy::http(proxy)?
                });
            }

            cb.build()
        }
    }

    /// [`HttpClient`] over a configured `reqwest::Client`.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        /// Client with reqwest's defaults and no timeouts.
        pub fn new() -> Result<Self, reqwest::Error> {
            Self::with_setting(&ClientSetting::default())
        }

        pub fn with_setting(setting: &ClientSetting) -> Result<Self, reqwest::Error> {
            Ok(Self {
                client: setting.build()?,
            })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get_text(&self, url: &str) -> Result<String, Self::Error> {
            self.client
                .get(url)
                .send()
                .await?
                .error_for_status()?
                .text()
                .await
        }

        async fn stream(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<BoxStream<'static, Result<Bytes, Self::Error>>, Self::Error> {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?.error_for_status()?;
            let stream = response.bytes_stream().map(|result| result.map(Bytes::from));

            Ok(Box::pin(stream))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientSetting, ReqwestClient};

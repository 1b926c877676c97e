//! Entry point: validate the requested download and run its pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use relayzip_fetch::{HttpClient, LinkPattern, LinkResolver, SourceOptions, StreamSource, join_href};
use relayzip_sink::{Sink, SinkPath};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::error::{PipelineError, Result};
use crate::pipeline::{RunReport, SingleEntryPipeline};

/// The invocation event. Only `download_type` is read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub download_type: Option<String>,
}

impl Request {
    pub fn new(download_type: impl Into<String>) -> Self {
        Self {
            download_type: Some(download_type.into()),
        }
    }
}

/// Summary handed back to the invoker. Carries no payload data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
}

impl InvocationResult {
    pub fn success(selector: &str, report: RunReport) -> Self {
        Self {
            status_code: 200,
            body: format!("Successfully extracted {selector} data"),
            error: None,
            report: Some(report),
        }
    }

    pub fn from_error(e: &PipelineError) -> Self {
        Self {
            status_code: e.status_code(),
            body: e.to_string(),
            error: Some(e.kind()),
            report: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Everything a run needs, worked out before touching the network.
#[derive(Clone, Debug)]
pub struct Plan {
    pub selector: String,
    pub pattern: LinkPattern,
    pub sink_path: SinkPath,
}

/// Routes requests to pipelines. Cheap to share; holds only immutable
/// settings plus the HTTP client and sink handles.
pub struct Dispatcher<C, K> {
    settings: Arc<Settings>,
    client: C,
    sink: K,
}

impl<C, K> Dispatcher<C, K>
where
    C: HttpClient + Clone,
    K: Sink + Clone,
{
    pub fn new(settings: Settings, client: C, sink: K) -> Self {
        Self {
            settings: Arc::new(settings),
            client,
            sink,
        }
    }

    /// Validate a request against the settings.
    ///
    /// Fails only with [`PipelineError::Configuration`].
    pub fn plan(&self, request: &Request) -> Result<Plan> {
        let selector = request
            .download_type
            .as_deref()
            .ok_or_else(|| config_error("required parameter \"download_type\" not found"))?;

        let Some(source) = self.settings.source(selector) else {
            let options: Vec<_> = self.settings.selectors().map(|s| format!("\"{s}\"")).collect();
            return Err(config_error(format!(
                "\"{selector}\" is not a valid option for \"download_type\", should be one of [{}]",
                options.join(", ")
            )));
        };

        let page_url = join_href(&self.base_url(), &source.page).map_err(as_config)?;
        let pattern = LinkPattern::new(page_url, &source.pattern).map_err(as_config)?;

        let sink_path = SinkPath::parse(&self.settings.sink_path(selector, source)?).map_err(as_config)?;
        if !self.sink.accepts(&sink_path) {
            return Err(config_error(format!(
                "no sink configured for '{}://' destinations",
                sink_path.scheme()
            )));
        }

        Ok(Plan {
            selector: selector.to_string(),
            pattern,
            sink_path,
        })
    }

    /// Resolve, download, unzip and store the requested file.
    pub async fn dispatch(&self, request: &Request) -> Result<RunReport> {
        let plan = self.plan(request)?;
        info!(selector = %plan.selector, sink = %plan.sink_path, "dispatching");

        let resolver = LinkResolver::new(self.client.clone());
        let download_url = resolver.resolve_url(&plan.pattern, &self.base_url()).await?;

        let options = SourceOptions::default().chunk_size(self.settings.chunk_size);
        let source = StreamSource::new(self.client.clone()).with_options(options);
        SingleEntryPipeline::new(source, self.sink.clone())
            .run(&download_url, &plan.sink_path)
            .await
    }

    /// Like [`dispatch`](Self::dispatch), folded into an invocation result.
    pub async fn invoke(&self, request: &Request) -> InvocationResult {
        let selector = request.download_type.clone().unwrap_or_default();
        match self.dispatch(request).await {
            Ok(report) => {
                info!(selector = %selector, bytes = report.bytes_written, "invocation succeeded");
                InvocationResult::success(&selector, report)
            }
            Err(e) => {
                error!(selector = %selector, kind = e.kind(), error = %e, "invocation failed");
                InvocationResult::from_error(&e)
            }
        }
    }

    /// Run several selectors as independent, concurrent pipelines.
    ///
    /// Results come back in the order the selectors were given. A repeated
    /// selector runs once, since both runs would write the same object.
    pub async fn dispatch_many<S: AsRef<str>>(&self, selectors: &[S]) -> Vec<(String, InvocationResult)> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = selectors
            .iter()
            .map(|selector| selector.as_ref())
            .filter(|selector| seen.insert(*selector))
            .collect();
        if unique.len() < selectors.len() {
            debug!(
                requested = selectors.len(),
                running = unique.len(),
                "dropped repeated selectors"
            );
        }

        let mut runs: FuturesUnordered<_> = unique
            .iter()
            .enumerate()
            .map(|(index, &selector)| async move {
                let result = self.invoke(&Request::new(selector)).await;
                (index, selector.to_string(), result)
            })
            .collect();

        let mut results = Vec::with_capacity(unique.len());
        while let Some(done) = runs.next().await {
            results.push(done);
        }
        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, selector, result)| (selector, result))
            .collect()
    }

    fn base_url(&self) -> String {
        let base = &self.settings.base_url;
        if base.ends_with('/') {
            base.clone()
        } else {
            format!("{base}/")
        }
    }
}

fn config_error(message: impl Into<String>) -> PipelineError {
    PipelineError::Configuration(message.into())
}

fn as_config(e: impl std::fmt::Display) -> PipelineError {
    config_error(e.to_string())
}

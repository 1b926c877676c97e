use anyhow::{Context, Result};
use clap::Args;
use relayzip::{Dispatcher, InvocationResult, Request, Settings};
use relayzip_fetch::ReqwestClient;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Sources to extract, e.g. `basic` or `psc`.
    #[arg(required_unless_present = "event", conflicts_with = "event")]
    pub selectors: Vec<String>,

    /// Invocation event as JSON, e.g. `{"download_type": "basic"}`.
    #[arg(long)]
    pub event: Option<String>,

    /// Pretty-print the JSON results.
    #[arg(long)]
    pub pretty: bool,
}

/// Run every requested selector and print one JSON result per line.
///
/// Returns whether all of them succeeded.
pub async fn run(settings: Settings, args: RunArgs) -> Result<bool> {
    let client = ReqwestClient::with_setting(&settings.http).context("failed to build HTTP client")?;
    let sink = settings.sink_router();
    let dispatcher = Dispatcher::new(settings, client, sink);

    let results: Vec<InvocationResult> = match &args.event {
        Some(event) => {
            let request: Request =
                serde_json::from_str(event).context("event is not a valid JSON request")?;
            vec![dispatcher.invoke(&request).await]
        }
        None => dispatcher
            .dispatch_many(&args.selectors)
            .await
            .into_iter()
            .map(|(_, result)| result)
            .collect(),
    };

    for result in &results {
        let line = if args.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        println!("{line}");
    }

    Ok(results.iter().all(InvocationResult::is_success))
}

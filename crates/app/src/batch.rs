use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::prelude::*;
use network_analysis::pipeline::{
    AnalysisOutput, AnalysisRequest, AnalysisResults, AnalysisSource, InFlightAnalyses, RequestId,
};
use network_analysis::{
    AnalysisConfig, AnalysisError, NetworkAnalysisPlugin, RoadNetworkDescription,
};
use serde::Deserialize;

/// A batch document as read from disk.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BatchInput {
    pub config: AnalysisConfig,
    pub networks: Vec<RoadNetworkDescription>,
    pub estimate: Vec<String>,
}

/// One finished request, ready for stdout.
#[derive(Debug)]
pub struct ResultLine {
    pub request: u64,
    pub label: String,
    pub outcome: Result<serde_json::Value, String>,
}

impl ResultLine {
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn to_json(&self) -> serde_json::Value {
        match &self.outcome {
            Ok(bundle) => serde_json::json!({
                "request": self.request,
                "label": self.label,
                "status": "ok",
                "bundle": bundle,
            }),
            Err(message) => serde_json::json!({
                "request": self.request,
                "label": self.label,
                "status": "error",
                "error": message,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

pub fn parse_args(args: &[String]) -> Result<BatchInput, String> {
    let mut estimate = Vec::new();
    let mut path = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--estimate" => {
                let city = iter.next().ok_or("--estimate needs a city name")?;
                estimate.push(city.clone());
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
            file => {
                if path.replace(file.to_string()).is_some() {
                    return Err("only one batch file may be given".into());
                }
            }
        }
    }

    let mut input = match path {
        Some(path) => read_batch(Path::new(&path))?,
        None if estimate.is_empty() => return Err("nothing to do".into()),
        None => BatchInput::default(),
    };
    input.estimate.extend(estimate);
    Ok(input)
}

fn read_batch(path: &Path) -> Result<BatchInput, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    parse_batch(&text).map_err(|e| format!("{}: {e}", path.display()))
}

pub fn parse_batch(text: &str) -> Result<BatchInput, AnalysisError> {
    let input: BatchInput = serde_json::from_str(text)?;
    input.config.validate()?;
    Ok(input)
}

// ---------------------------------------------------------------------------
// Headless run
// ---------------------------------------------------------------------------

fn headless_app(config: AnalysisConfig) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default(), NetworkAnalysisPlugin));
    app.insert_resource(config);
    app
}

/// Run every request in `input` and return one line per request, in
/// request order. Networks that fail to build are reported without being
/// dispatched.
pub fn run(input: BatchInput) -> Vec<ResultLine> {
    let mut app = headless_app(input.config);
    let mut lines = Vec::new();
    let mut labels = Vec::new();
    let mut next_id = 0_u64;

    for description in input.networks {
        next_id += 1;
        let label = description.name.clone();
        match description.into_network() {
            Ok(network) => {
                app.world_mut().send_event(AnalysisRequest {
                    id: RequestId(next_id),
                    source: AnalysisSource::Network(Arc::new(network)),
                });
                labels.push((next_id, label));
            }
            Err(err) => {
                warn!("Network '{label}' rejected: {err}");
                lines.push(ResultLine {
                    request: next_id,
                    label,
                    outcome: Err(err.to_string()),
                });
            }
        }
    }
    for city in input.estimate {
        next_id += 1;
        app.world_mut().send_event(AnalysisRequest {
            id: RequestId(next_id),
            source: AnalysisSource::EstimateCity(city.clone()),
        });
        labels.push((next_id, city));
    }

    info!("Dispatching {} analysis requests", labels.len());
    wait_for(&mut app, labels.len());

    let results = app.world().resource::<AnalysisResults>();
    for (id, label) in labels {
        let outcome = match results.completed.get(&RequestId(id)) {
            Some(Ok(output)) => to_value(output),
            Some(Err(err)) => Err(err.to_string()),
            None => Err("request did not finish".to_string()),
        };
        lines.push(ResultLine {
            request: id,
            label,
            outcome,
        });
    }
    lines.sort_by_key(|line| line.request);
    lines
}

fn wait_for(app: &mut App, expected: usize) {
    loop {
        app.update();
        let done = app.world().resource::<AnalysisResults>().completed.len();
        if done >= expected {
            return;
        }
        if app.world().resource::<InFlightAnalyses>().is_empty() {
            error!("{} of {expected} requests finished with nothing in flight", done);
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn to_value(output: &AnalysisOutput) -> Result<serde_json::Value, String> {
    let value = match output {
        AnalysisOutput::Network(bundle) => serde_json::to_value(bundle),
        AnalysisOutput::Estimated(bundle) => serde_json::to_value(bundle),
    };
    value.map_err(|e| e.to_string())
}

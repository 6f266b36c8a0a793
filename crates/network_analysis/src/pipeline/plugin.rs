//! ECS front end for the analysis pipeline.
//!
//! Send an [`AnalysisRequest`] event; the request runs as a task on the
//! `AsyncComputeTaskPool` with a snapshot of the current [`AnalysisConfig`].
//! Finished tasks are polled every frame, stored in [`AnalysisResults`] and
//! announced with an [`AnalysisCompleted`] event. A [`CancelAnalysis`] event
//! trips the task's token, drops the task and records
//! `AnalysisError::Cancelled`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bevy::prelude::*;
use bevy::tasks::{block_on, AsyncComputeTaskPool, Task, TaskPool};

use super::{AnalysisBundle, AnalysisPipeline, CancelToken, EstimatedBundle};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::road_network::RoadNetwork;

/// Caller-chosen identifier tying a request to its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone)]
pub enum AnalysisSource {
    Network(Arc<RoadNetwork>),
    /// Explicit request for catalog estimates of a named city.
    EstimateCity(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutput {
    Network(Box<AnalysisBundle>),
    Estimated(Box<EstimatedBundle>),
}

#[derive(Event, Debug, Clone)]
pub struct AnalysisRequest {
    pub id: RequestId,
    pub source: AnalysisSource,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CancelAnalysis(pub RequestId);

#[derive(Event, Debug, Clone)]
pub struct AnalysisCompleted {
    pub id: RequestId,
    pub outcome: Result<AnalysisOutput, AnalysisError>,
}

/// Finished requests by id.
#[derive(Resource, Debug, Default)]
pub struct AnalysisResults {
    pub completed: BTreeMap<RequestId, Result<AnalysisOutput, AnalysisError>>,
}

struct InFlight {
    task: Task<Result<AnalysisOutput, AnalysisError>>,
    cancel: CancelToken,
}

#[derive(Resource, Default)]
pub struct InFlightAnalyses {
    tasks: HashMap<RequestId, InFlight>,
}

impl InFlightAnalyses {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn run_request(
    pipeline: &AnalysisPipeline,
    source: AnalysisSource,
    cancel: &CancelToken,
) -> Result<AnalysisOutput, AnalysisError> {
    match source {
        AnalysisSource::Network(network) => pipeline
            .analyze(&network, cancel)
            .map(|b| AnalysisOutput::Network(Box::new(b))),
        AnalysisSource::EstimateCity(name) => {
            cancel.check("estimation")?;
            pipeline
                .estimate_city(&name)
                .map(|b| AnalysisOutput::Estimated(Box::new(b)))
        }
    }
}

/// Spawn one task per request. A configuration that fails validation
/// completes every request of the frame with `InvalidConfig` instead.
pub fn dispatch_analysis_requests(
    mut requests: EventReader<AnalysisRequest>,
    config: Res<AnalysisConfig>,
    mut in_flight: ResMut<InFlightAnalyses>,
    mut results: ResMut<AnalysisResults>,
    mut completed: EventWriter<AnalysisCompleted>,
) {
    if requests.is_empty() {
        return;
    }
    let pipeline = match AnalysisPipeline::new((*config).clone()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            for request in requests.read() {
                warn!("Analysis request {:?} rejected: {}", request.id, e);
                results.completed.insert(request.id, Err(e.clone()));
                completed.send(AnalysisCompleted {
                    id: request.id,
                    outcome: Err(e.clone()),
                });
            }
            return;
        }
    };

    let pool = AsyncComputeTaskPool::get_or_init(TaskPool::default);
    for request in requests.read() {
        if in_flight.tasks.contains_key(&request.id) {
            warn!("Analysis request {:?} is already running, ignoring", request.id);
            continue;
        }
        let pipeline = pipeline.clone();
        let source = request.source.clone();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let task = pool.spawn(async move { run_request(&pipeline, source, &token) });
        in_flight.tasks.insert(request.id, InFlight { task, cancel });
    }
}

pub fn cancel_analyses(
    mut cancels: EventReader<CancelAnalysis>,
    mut in_flight: ResMut<InFlightAnalyses>,
    mut results: ResMut<AnalysisResults>,
    mut completed: EventWriter<AnalysisCompleted>,
) {
    for CancelAnalysis(id) in cancels.read().copied() {
        let Some(entry) = in_flight.tasks.remove(&id) else {
            continue;
        };
        entry.cancel.cancel();
        drop(entry.task);
        info!("Analysis request {:?} cancelled", id);
        results.completed.insert(id, Err(AnalysisError::Cancelled));
        completed.send(AnalysisCompleted {
            id,
            outcome: Err(AnalysisError::Cancelled),
        });
    }
}

/// Poll in-flight tasks and publish the finished ones.
pub fn collect_analysis_results(
    mut in_flight: ResMut<InFlightAnalyses>,
    mut results: ResMut<AnalysisResults>,
    mut completed: EventWriter<AnalysisCompleted>,
) {
    let mut finished = Vec::new();
    in_flight.tasks.retain(|id, entry| {
        match block_on(futures_lite::future::poll_once(&mut entry.task)) {
            Some(outcome) => {
                finished.push((*id, outcome));
                false
            }
            None => true,
        }
    });
    for (id, outcome) in finished {
        if let Err(e) = &outcome {
            warn!("Analysis request {:?} failed: {}", id, e);
        }
        results.completed.insert(id, outcome.clone());
        completed.send(AnalysisCompleted { id, outcome });
    }
}

pub struct NetworkAnalysisPlugin;

impl Plugin for NetworkAnalysisPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnalysisConfig>()
            .init_resource::<InFlightAnalyses>()
            .init_resource::<AnalysisResults>()
            .add_event::<AnalysisRequest>()
            .add_event::<CancelAnalysis>()
            .add_event::<AnalysisCompleted>()
            .add_systems(
                Update,
                (
                    dispatch_analysis_requests,
                    cancel_analyses,
                    collect_analysis_results,
                )
                    .chain(),
            );
    }
}

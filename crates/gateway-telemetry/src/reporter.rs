//! Execution reporting.
//!
//! The execution manager calls an [`ExecutionReporter`] at every step boundary
//! instead of logging directly. Reporters observe; they never influence the
//! outcome of a request.

use gateway_core::{ChatResponse, GatewayError, Route};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Span};

/// Identity of one route step attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepContext {
    /// Request id
    pub request_id: String,
    /// Route being executed
    pub route: String,
    /// Position of the step in the route
    pub step_index: usize,
    /// Provider called
    pub provider: String,
    /// Model sent upstream
    pub model: String,
    /// Resolved step deadline
    pub timeout: Duration,
}

/// Hooks invoked by the execution manager
pub trait ExecutionReporter: Send + Sync {
    /// Span wrapping the whole route execution
    fn route_span(&self, _request_id: &str, _route: &Route) -> Span {
        Span::none()
    }

    /// Span wrapping one step attempt
    fn step_span(&self, _step: &StepContext) -> Span {
        Span::none()
    }

    /// A step is about to call its provider
    fn step_attempted(&self, step: &StepContext);

    /// A step returned a response
    fn step_succeeded(&self, step: &StepContext, elapsed: Duration, response: &ChatResponse);

    /// A step failed; the manager moves on to the next one
    fn step_failed(&self, step: &StepContext, elapsed: Duration, error: &GatewayError);

    /// The caller cancelled the request while the step was in flight
    fn step_cancelled(&self, _step: &StepContext, _elapsed: Duration) {}

    /// Every step of the route failed
    fn route_failed(&self, request_id: &str, route: &Route, step_count: usize);
}

/// Reporter that emits structured `tracing` events and spans
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TracingReporter {
    /// Create a tracing reporter
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionReporter for TracingReporter {
    fn route_span(&self, request_id: &str, route: &Route) -> Span {
        info_span!(
            "route",
            otel.name = %format!("route/{}", route.name),
            request_id = %request_id,
            route = %route.name,
            steps = route.steps.len()
        )
    }

    fn step_span(&self, step: &StepContext) -> Span {
        info_span!(
            "route_step",
            otel.name = %format!("route.{}.step.{}", step.route, step.step_index),
            request_id = %step.request_id,
            route = %step.route,
            step_index = step.step_index,
            provider = %step.provider,
            model = %step.model,
            otel.kind = "client"
        )
    }

    fn step_attempted(&self, step: &StepContext) {
        info!(
            request_id = %step.request_id,
            route = %step.route,
            step_index = step.step_index,
            provider = %step.provider,
            model = %step.model,
            timeout_ms = step.timeout.as_millis() as u64,
            "Attempting route step"
        );
    }

    fn step_succeeded(&self, step: &StepContext, elapsed: Duration, response: &ChatResponse) {
        let response_json = serde_json::to_string(&response.truncated_for_logging())
            .unwrap_or_default();
        let usage = response.usage().copied().unwrap_or_default();

        info!(
            request_id = %step.request_id,
            route = %step.route,
            step_index = step.step_index,
            provider = %step.provider,
            model = %step.model,
            duration_ms = elapsed.as_millis() as u64,
            response_id = %response.id(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            response_json = %response_json,
            "Route step succeeded"
        );
    }

    fn step_failed(&self, step: &StepContext, elapsed: Duration, error: &GatewayError) {
        warn!(
            request_id = %step.request_id,
            route = %step.route,
            step_index = step.step_index,
            provider = %step.provider,
            model = %step.model,
            duration_ms = elapsed.as_millis() as u64,
            error_code = error.code(),
            error = %error,
            "Route step failed"
        );
    }

    fn step_cancelled(&self, step: &StepContext, elapsed: Duration) {
        warn!(
            request_id = %step.request_id,
            route = %step.route,
            step_index = step.step_index,
            provider = %step.provider,
            duration_ms = elapsed.as_millis() as u64,
            "Route step cancelled"
        );
    }

    fn route_failed(&self, request_id: &str, route: &Route, step_count: usize) {
        error!(
            request_id = %request_id,
            route = %route.name,
            steps = step_count,
            "All route steps failed"
        );
    }
}

/// Reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ExecutionReporter for NoopReporter {
    fn step_attempted(&self, _step: &StepContext) {}

    fn step_succeeded(&self, _step: &StepContext, _elapsed: Duration, _response: &ChatResponse) {}

    fn step_failed(&self, _step: &StepContext, _elapsed: Duration, _error: &GatewayError) {}

    fn route_failed(&self, _request_id: &str, _route: &Route, _step_count: usize) {}
}

/// One event captured by [`RecordingReporter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedEvent {
    /// Step about to run
    StepAttempted {
        /// Step index
        step_index: usize,
        /// Provider name
        provider: String,
        /// Upstream model
        model: String,
    },
    /// Step succeeded
    StepSucceeded {
        /// Step index
        step_index: usize,
        /// Provider name
        provider: String,
        /// Id of the returned response
        response_id: String,
    },
    /// Step failed
    StepFailed {
        /// Step index
        step_index: usize,
        /// Provider name
        provider: String,
        /// Error code
        code: &'static str,
        /// Error message
        error: String,
    },
    /// Step abandoned on cancellation
    StepCancelled {
        /// Step index
        step_index: usize,
    },
    /// Route exhausted
    RouteFailed {
        /// Route name
        route: String,
        /// Number of steps attempted
        step_count: usize,
    },
}

/// Reporter that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportedEvent>>,
}

impl RecordingReporter {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured events, in order
    #[must_use]
    pub fn events(&self) -> Vec<ReportedEvent> {
        self.events.lock().clone()
    }

    /// Number of step attempts seen
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, ReportedEvent::StepAttempted { .. }))
            .count()
    }

    /// Drop captured events
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn push(&self, event: ReportedEvent) {
        self.events.lock().push(event);
    }
}

impl ExecutionReporter for RecordingReporter {
    fn step_attempted(&self, step: &StepContext) {
        self.push(ReportedEvent::StepAttempted {
            step_index: step.step_index,
            provider: step.provider.clone(),
            model: step.model.clone(),
        });
    }

    fn step_succeeded(&self, step: &StepContext, _elapsed: Duration, response: &ChatResponse) {
        self.push(ReportedEvent::StepSucceeded {
            step_index: step.step_index,
            provider: step.provider.clone(),
            response_id: response.id().to_string(),
        });
    }

    fn step_failed(&self, step: &StepContext, _elapsed: Duration, error: &GatewayError) {
        self.push(ReportedEvent::StepFailed {
            step_index: step.step_index,
            provider: step.provider.clone(),
            code: error.code(),
            error: error.to_string(),
        });
    }

    fn step_cancelled(&self, step: &StepContext, _elapsed: Duration) {
        self.push(ReportedEvent::StepCancelled {
            step_index: step.step_index,
        });
    }

    fn route_failed(&self, _request_id: &str, route: &Route, step_count: usize) {
        self.push(ReportedEvent::RouteFailed {
            route: route.name.clone(),
            step_count,
        });
    }
}

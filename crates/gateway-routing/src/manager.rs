//! Ordered fallback execution of a route.
//!
//! For a request, the manager resolves the route named by `model` and walks its
//! steps in declaration order. The first step that returns a response wins.
//! Failed steps are recorded and the next one is tried; once every step has
//! failed, the collected failures come back as a [`RouteError`].

use crate::resolver::RouteResolver;
use gateway_core::{
    ChatRequest, ChatResponse, GatewayError, GatewayResult, Provider, Route, RouteError,
    RouteStepError, RoutingTable,
};
use gateway_providers::ProviderFactory;
use gateway_telemetry::{ExecutionReporter, StepContext};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Executes routes against upstream providers
pub struct ExecutionManager {
    providers: Vec<Provider>,
    provider_index: HashMap<String, Provider>,
    resolver: RouteResolver,
    default_timeout: Duration,
    factory: Arc<dyn ProviderFactory>,
    reporter: Arc<dyn ExecutionReporter>,
}

impl std::fmt::Debug for ExecutionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionManager")
            .field("providers", &self.providers.len())
            .field("routes", &self.resolver.routes().len())
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

impl ExecutionManager {
    /// Create a manager over a validated routing table
    #[must_use]
    pub fn new(
        table: RoutingTable,
        factory: Arc<dyn ProviderFactory>,
        reporter: Arc<dyn ExecutionReporter>,
    ) -> Self {
        let provider_index = table.provider_map();
        Self {
            providers: table.providers,
            provider_index,
            resolver: RouteResolver::new(table.routes),
            default_timeout: table.default_timeout,
            factory,
            reporter,
        }
    }

    /// Route for `model`
    pub fn resolve(&self, model: &str) -> GatewayResult<&Route> {
        self.resolver.resolve(model)
    }

    /// Configured routes in declaration order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        self.resolver.routes()
    }

    /// Configured providers in declaration order
    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }

    /// Timeout applied to steps without their own
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Execute the route for `request.model()`.
    ///
    /// Dropping the returned future abandons any in-flight upstream call.
    pub async fn execute(&self, request: &ChatRequest, request_id: &str) -> GatewayResult<ChatResponse> {
        self.execute_with_cancellation(request, request_id, &CancellationToken::new())
            .await
    }

    /// Execute the route for `request.model()`, giving up with
    /// [`GatewayError::Cancelled`] as soon as `cancel` fires.
    pub async fn execute_with_cancellation(
        &self,
        request: &ChatRequest,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<ChatResponse> {
        let route = self.resolve(request.model())?;
        let span = self.reporter.route_span(request_id, route);

        self.run_steps(route, request, request_id, cancel)
            .instrument(span)
            .await
    }

    async fn run_steps(
        &self,
        route: &Route,
        request: &ChatRequest,
        request_id: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<ChatResponse> {
        let mut errors = Vec::with_capacity(route.steps.len());

        for (step_index, step) in route.steps.iter().enumerate() {
            let Some(provider) = self.provider_index.get(&step.provider) else {
                return Err(GatewayError::ConfigurationFault {
                    route: route.name.clone(),
                    step_index,
                    provider: step.provider.clone(),
                });
            };

            let context = StepContext {
                request_id: request_id.to_string(),
                route: route.name.clone(),
                step_index,
                provider: step.provider.clone(),
                model: step.model.clone(),
                timeout: step.resolve_timeout(self.default_timeout),
            };

            let client = self.factory.create(provider, step, context.timeout);
            self.reporter.step_attempted(&context);

            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                result = client.call(request).instrument(self.reporter.step_span(&context)) => Some(result),
            };
            let elapsed = started.elapsed();

            match outcome {
                None => {
                    self.reporter.step_cancelled(&context, elapsed);
                    return Err(GatewayError::Cancelled);
                }
                Some(Ok(response)) => {
                    self.reporter.step_succeeded(&context, elapsed, &response);
                    return Ok(response);
                }
                Some(Err(error)) => {
                    self.reporter.step_failed(&context, elapsed, &error);
                    errors.push(RouteStepError {
                        step_index,
                        provider: step.provider.clone(),
                        model: step.model.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        self.reporter
            .route_failed(request_id, route, route.steps.len());
        Err(RouteError::new(route.clone(), errors).into())
    }
}

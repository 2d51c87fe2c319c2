//! Exact-match route lookup.

use gateway_core::{GatewayError, GatewayResult, Route};
use std::collections::HashMap;

/// Maps a requested model name to the first route declared with that name
#[derive(Debug, Clone)]
pub struct RouteResolver {
    routes: Vec<Route>,
    index: HashMap<String, usize>,
}

impl RouteResolver {
    /// Index `routes`; a repeated name keeps its first position
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        let mut index = HashMap::with_capacity(routes.len());
        for (position, route) in routes.iter().enumerate() {
            index.entry(route.name.clone()).or_insert(position);
        }
        Self { routes, index }
    }

    /// Route for `model`, matched case-sensitively
    pub fn resolve(&self, model: &str) -> GatewayResult<&Route> {
        self.index
            .get(model)
            .and_then(|&position| self.routes.get(position))
            .ok_or_else(|| GatewayError::route_not_found(model))
    }

    /// All routes in declaration order
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::RouteStep;

    fn resolver() -> RouteResolver {
        RouteResolver::new(vec![
            Route::new("smart", vec![RouteStep::new("p1", "first")]),
            Route::new("fast", vec![RouteStep::new("p2", "x")]),
            Route::new("smart", vec![RouteStep::new("p3", "second")]),
        ])
    }

    #[test]
    fn test_exact_match() {
        let resolver = resolver();
        assert_eq!(resolver.resolve("fast").map(|r| r.name.as_str()).ok(), Some("fast"));
    }

    #[test]
    fn test_first_declaration_wins() {
        let route = resolver().resolve("smart").cloned().expect("route");
        assert_eq!(route.steps[0].model, "first");
    }

    #[test]
    fn test_case_sensitive_and_missing() {
        let resolver = resolver();
        for model in ["Smart", "smart ", "", "unknown"] {
            match resolver.resolve(model) {
                Err(GatewayError::RouteNotFound { model: missing }) => assert_eq!(missing, model),
                other => panic!("expected route not found for {model:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_routes_keep_declaration_order() {
        let names: Vec<_> = resolver().routes().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["smart", "fast", "smart"]);
    }
}

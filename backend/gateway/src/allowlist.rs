//! Endpoint allow-list: the routing table of upstream paths the gateway may reach.
//!
//! A candidate endpoint `E` matches a template path `A` when `E == A`,
//! `E` starts with `A`, or `E` matches `^A\?.*$`. The prefix rule is what lets
//! parameterized paths such as `/client/v2/loans/42/repayments` through, and
//! it also admits any string that merely extends `A` (for example
//! `/client/v2/auth/signin-admin` under `/client/v2/auth/signin`). Templates
//! may additionally restrict the method.

use anyhow::{Context, Result};
use fingate_config::RouteSpec;
use fingate_core::UpstreamMethod;
use regex::Regex;
use tracing::debug;

/// One permitted upstream route.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    path: String,
    methods: Vec<UpstreamMethod>,
    with_query: Regex,
}

impl RouteTemplate {
    pub fn new(path: impl Into<String>, methods: Vec<UpstreamMethod>) -> Result<Self> {
        let path = path.into();
        let with_query = Regex::new(&format!(r"^{}\?.*$", regex::escape(&path)))
            .with_context(|| format!("Failed to compile route pattern for '{path}'"))?;
        Ok(Self {
            path,
            methods,
            with_query,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> &[UpstreamMethod] {
        &self.methods
    }

    /// Method-agnostic path predicate.
    pub fn matches_path(&self, endpoint: &str) -> bool {
        endpoint == self.path || endpoint.starts_with(&self.path) || self.with_query.is_match(endpoint)
    }

    /// An empty method list permits every brokered method.
    pub fn permits(&self, method: UpstreamMethod) -> bool {
        self.methods.is_empty() || self.methods.contains(&method)
    }
}

/// Ordered set of templates; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteTemplate>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteTemplate>) -> Self {
        Self { routes }
    }

    pub fn from_specs(specs: &[RouteSpec]) -> Result<Self> {
        let routes = specs
            .iter()
            .map(|spec| RouteTemplate::new(spec.path.clone(), spec.methods.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(routes))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// True if any template's path admits the endpoint, regardless of method.
    pub fn is_valid_endpoint(&self, endpoint: &str) -> bool {
        self.routes.iter().any(|r| r.matches_path(endpoint))
    }

    /// The template that authorizes `method` on `endpoint`, if any.
    pub fn match_route(&self, endpoint: &str, method: UpstreamMethod) -> Option<&RouteTemplate> {
        let found = self
            .routes
            .iter()
            .find(|r| r.matches_path(endpoint) && r.permits(method));
        if let Some(route) = found {
            debug!(endpoint = %endpoint, route = %route.path, method = %method, "Allow-list match");
        }
        found
    }
}

use async_trait::async_trait;
use rdf_adaptive_common::mediators::JoinSelectivityMediator;
use rdf_adaptive_common::{ActionContext, JoinEntry, JoinResult};

/// A [JoinSelectivityMediator] that assumes the same selectivity for every join.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedJoinSelectivity(pub f64);

impl Default for FixedJoinSelectivity {
    fn default() -> Self {
        Self(1.0)
    }
}

#[async_trait]
impl JoinSelectivityMediator for FixedJoinSelectivity {
    async fn selectivity(&self, _context: &ActionContext, _entries: &[JoinEntry]) -> JoinResult<f64> {
        Ok(self.0)
    }
}

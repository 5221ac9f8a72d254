use async_trait::async_trait;
use rdf_adaptive_common::mediators::{Fingerprint, HashBindingsMediator, HashFunction};
use rdf_adaptive_common::{ActionContext, JoinResult};
use rdf_adaptive_model::{Bindings, Variable};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Hashes the values of `variables` in `bindings`.
///
/// Unbound variables contribute to the fingerprint as well, such that `{?a: 1}` and
/// `{?b: 1}` are distinguished.
pub fn hash_bindings(bindings: &Bindings, variables: &[Variable]) -> Fingerprint {
    let mut hasher = FxHasher::default();
    for variable in variables {
        variable.as_str().hash(&mut hasher);
        bindings.get(variable).hash(&mut hasher);
    }
    hasher.finish()
}

/// A [HashBindingsMediator] that provides [hash_bindings].
///
/// The fingerprints are 64-bit hashes. Collisions are possible but improbable, so requests that
/// disallow collisions are served as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBindingsHash;

#[async_trait]
impl HashBindingsMediator for DefaultBindingsHash {
    async fn hash_function(
        &self,
        _context: &ActionContext,
        _allow_hash_collisions: bool,
    ) -> JoinResult<HashFunction> {
        Ok(Arc::new(hash_bindings))
    }
}

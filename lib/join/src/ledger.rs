use rdf_adaptive_common::mediators::Fingerprint;
use rustc_hash::FxHashMap;

/// Book-keeping of the fingerprints that a restartable stream has forwarded.
///
/// A new generation starts whenever the underlying source is replaced. The replacement
/// re-derives rows that previous generations have already forwarded. For each fingerprint,
/// the first `emitted[f]` occurrences within a generation are suppressed, where `emitted[f]` is
/// the number of occurrences forwarded over all generations. Hence, a fingerprint is forwarded
/// as often as the generation that produced it most often, and never more.
#[derive(Debug, Default)]
pub struct FingerprintLedger {
    /// Occurrences forwarded downstream over all generations.
    emitted: FxHashMap<Fingerprint, usize>,
    /// Occurrences produced by the current generation, forwarded or not.
    seen: FxHashMap<Fingerprint, usize>,
    total_emitted: usize,
}

impl FingerprintLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an occurrence of `fingerprint` in the current generation and returns whether it
    /// must be forwarded.
    pub fn admit(&mut self, fingerprint: Fingerprint) -> bool {
        let seen = self.seen.entry(fingerprint).or_insert(0);
        *seen += 1;
        let emitted = self.emitted.entry(fingerprint).or_insert(0);
        if *seen > *emitted {
            *emitted = *seen;
            self.total_emitted += 1;
            true
        } else {
            false
        }
    }

    /// Starts a new generation.
    ///
    /// Everything forwarded so far becomes pending suppression for the new generation. This
    /// includes suppressions that the abandoned generation had not yet worked off.
    pub fn start_generation(&mut self) {
        self.seen.clear();
    }

    /// The number of occurrences of `fingerprint` that the current generation will still
    /// suppress.
    pub fn pending_suppressions(&self, fingerprint: Fingerprint) -> usize {
        let emitted = self.emitted.get(&fingerprint).copied().unwrap_or(0);
        let seen = self.seen.get(&fingerprint).copied().unwrap_or(0);
        emitted.saturating_sub(seen)
    }

    /// The number of rows forwarded over all generations.
    pub fn total_emitted(&self) -> usize {
        self.total_emitted
    }

    pub fn clear(&mut self) {
        self.emitted.clear();
        self.seen.clear();
    }
}

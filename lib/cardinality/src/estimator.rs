use crate::void::{statistic, VoidDescription};
use rdf_adaptive_model::vocab::rdf;
use rdf_adaptive_model::{NamedNodePattern, TermPattern, TriplePattern};
use std::fmt::Debug;

/// Estimates the number of matches of a triple pattern in a dataset from its VoID description.
///
/// Returns `None` if the description lacks the statistics needed for `pattern`.
pub trait TriplePatternCardinalityEstimator: Debug + Send + Sync {
    fn estimate(&self, description: &VoidDescription, pattern: &TriplePattern) -> Option<f64>;
}

/// Estimates every pattern with a bound predicate as the number of triples with that predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateCountEstimator;

impl TriplePatternCardinalityEstimator for PredicateCountEstimator {
    fn estimate(&self, description: &VoidDescription, pattern: &TriplePattern) -> Option<f64> {
        let NamedNodePattern::NamedNode(predicate) = &pattern.predicate else {
            return None;
        };
        description
            .property_partition(predicate.as_str())?
            .triples
            .map(statistic)
    }
}

/// Estimates patterns with the formulas of Hagedorn et al., "Resource Planning for SPARQL
/// Query Execution on Data Sharing Platforms".
///
/// Variables and blank nodes are unbound, every other term is bound. Patterns with a bound
/// predicate use the statistics of its property partition, patterns with a variable predicate
/// use the statistics of the whole dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidFormulaEstimator;

impl TriplePatternCardinalityEstimator for VoidFormulaEstimator {
    fn estimate(&self, description: &VoidDescription, pattern: &TriplePattern) -> Option<f64> {
        let subject_bound = is_bound(&pattern.subject);
        let object_bound = is_bound(&pattern.object);

        match &pattern.predicate {
            NamedNodePattern::NamedNode(predicate) => {
                let partition = description.property_partition(predicate.as_str())?;
                let is_type = predicate.as_ref() == rdf::TYPE;
                match (subject_bound, object_bound) {
                    (false, false) => partition.triples.map(statistic),
                    (false, true) if is_type => {
                        let TermPattern::NamedNode(class) = &pattern.object else {
                            return None;
                        };
                        description
                            .class_partition(class.as_str())?
                            .entities
                            .map(statistic)
                    }
                    (false, true) => divide(partition.triples, partition.distinct_objects),
                    (true, false) => divide(partition.triples, partition.distinct_subjects),
                    (true, true) => {
                        let has_class = match &pattern.object {
                            TermPattern::NamedNode(class) => {
                                description.class_partition(class.as_str()).is_some()
                            }
                            _ => false,
                        };
                        if is_type && !has_class {
                            return Some(0.0);
                        }
                        divide(
                            partition.triples,
                            product(partition.distinct_subjects, partition.distinct_objects),
                        )
                    }
                }
            }
            NamedNodePattern::Variable(_) => match (subject_bound, object_bound) {
                (false, false) => description.triples.map(statistic),
                (false, true) => divide(description.triples, description.distinct_objects),
                (true, false) => divide(description.triples, description.distinct_subjects),
                (true, true) => divide(
                    description.triples,
                    product(description.distinct_subjects, description.distinct_objects),
                ),
            },
        }
    }
}

fn is_bound(term: &TermPattern) -> bool {
    !matches!(term, TermPattern::Variable(_) | TermPattern::BlankNode(_))
}

fn product(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    a?.checked_mul(b?)
}

fn divide(numerator: Option<u64>, denominator: Option<u64>) -> Option<f64> {
    let denominator = denominator.filter(|denominator| *denominator > 0)?;
    Some(statistic(numerator?) / statistic(denominator))
}

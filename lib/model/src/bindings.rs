use oxrdf::{Term, Variable};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// An immutable solution mapping from variables to RDF terms.
///
/// Bindings are never mutated after their creation. Cloning is cheap, as the variables and
/// values are shared between all clones. The variables are kept sorted by name such that two
/// bindings with the same content are equal regardless of the insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Bindings {
    /// The bound variables, sorted by name.
    variables: Arc<[Variable]>,
    /// The values of the bound variables. Has the same length as `variables`.
    values: Arc<[Term]>,
}

impl Bindings {
    /// Creates a new [Bindings] from the given `(variable, value)` pairs.
    ///
    /// If a variable occurs multiple times, the last value wins.
    pub fn new(entries: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        let mut entries = entries.into_iter().collect::<Vec<_>>();
        entries.sort_by(|(lhs, _), (rhs, _)| lhs.as_str().cmp(rhs.as_str()));

        let mut deduplicated: Vec<(Variable, Term)> = Vec::with_capacity(entries.len());
        for (variable, value) in entries {
            match deduplicated.last_mut() {
                Some((last, last_value)) if *last == variable => *last_value = value,
                _ => deduplicated.push((variable, value)),
            }
        }

        let (variables, values): (Vec<_>, Vec<_>) = deduplicated.into_iter().unzip();
        Self {
            variables: variables.into(),
            values: values.into(),
        }
    }

    /// Returns the bound variables, sorted by name.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the value of `variable`, if it is bound.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        self.get_by_name(variable.as_str())
    }

    /// Returns the value of the variable called `name`, if it is bound.
    pub fn get_by_name(&self, name: &str) -> Option<&Term> {
        self.variables
            .binary_search_by(|candidate| candidate.as_str().cmp(name))
            .ok()
            .map(|index| &self.values[index])
    }

    /// Iterates over the `(variable, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.variables.iter().zip(self.values.iter())
    }

    /// Returns the number of bound variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns whether no variable is bound.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Merges `self` with `other` if both agree on the values of their shared variables.
    ///
    /// Returns [None] if the bindings are incompatible. This is the compatibility notion of
    /// SPARQL solution mappings that inner joins are built upon.
    pub fn merge(&self, other: &Bindings) -> Option<Bindings> {
        for (variable, value) in other.iter() {
            if let Some(own_value) = self.get(variable) {
                if own_value != value {
                    return None;
                }
            }
        }

        Some(Bindings::new(
            self.iter()
                .chain(other.iter())
                .map(|(variable, value)| (variable.clone(), value.clone())),
        ))
    }
}

impl FromIterator<(Variable, Term)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl Display for Bindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode};

    fn var(name: &str) -> Variable {
        Variable::new_unchecked(name)
    }

    fn lit(value: &str) -> Term {
        Literal::new_simple_literal(value).into()
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let lhs = Bindings::new([(var("a"), lit("1")), (var("b"), lit("2"))]);
        let rhs = Bindings::new([(var("b"), lit("2")), (var("a"), lit("1"))]);

        assert_eq!(lhs, rhs);
        assert_eq!(lhs.variables(), &[var("a"), var("b")]);
    }

    #[test]
    fn get_bound_and_unbound() {
        let bindings = Bindings::new([(var("a"), lit("1"))]);

        assert_eq!(bindings.get(&var("a")), Some(&lit("1")));
        assert_eq!(bindings.get(&var("b")), None);
    }

    #[test]
    fn merge_compatible() {
        let s = NamedNode::new_unchecked("http://example.com/s");
        let lhs = Bindings::new([(var("s"), s.clone().into()), (var("a"), lit("1"))]);
        let rhs = Bindings::new([(var("s"), s.clone().into()), (var("b"), lit("2"))]);

        let merged = lhs.merge(&rhs);

        assert_eq!(
            merged,
            Some(Bindings::new([
                (var("a"), lit("1")),
                (var("b"), lit("2")),
                (var("s"), s.into()),
            ]))
        );
    }

    #[test]
    fn merge_incompatible() {
        let lhs = Bindings::new([(var("a"), lit("1"))]);
        let rhs = Bindings::new([(var("a"), lit("2"))]);

        assert_eq!(lhs.merge(&rhs), None);
    }

    #[test]
    fn display() {
        let bindings = Bindings::new([(var("b"), lit("2")), (var("a"), lit("1"))]);

        assert_eq!(bindings.to_string(), r#"{?a: "1", ?b: "2"}"#);
    }
}

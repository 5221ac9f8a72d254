mod bindings;
mod cardinality;
mod operation;
pub mod vocab;

pub use bindings::*;
pub use cardinality::*;
pub use operation::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, GraphName, GraphNameRef, IriParseError, Literal, LiteralRef,
    NamedNode, NamedNodeRef, Quad, QuadRef, Subject, SubjectRef, Term, TermRef, Triple, TripleRef,
    Variable, VariableNameParseError, VariableRef,
};
pub use spargebra::algebra::GraphPattern;
pub use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};

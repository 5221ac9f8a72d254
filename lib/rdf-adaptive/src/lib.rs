#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod model {
    pub use rdf_adaptive_model::*;
}

pub mod common {
    pub use rdf_adaptive_common::*;
}

pub mod join {
    pub use rdf_adaptive_join::*;
}

pub mod cardinality {
    pub use rdf_adaptive_cardinality::*;
}

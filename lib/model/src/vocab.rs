//! Vocabularies that are used for describing datasets.

pub use oxrdf::vocab::{rdf, xsd};

/// [VoID](https://www.w3.org/TR/void/) vocabulary.
pub mod void {
    use oxrdf::NamedNodeRef;

    /// A set of RDF triples that are published, maintained or aggregated by a single provider.
    pub const DATASET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#Dataset");
    /// The class that is the `rdf:type` of all entities in a class-based partition.
    pub const CLASS: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#class");
    /// The total number of distinct classes in a dataset.
    pub const CLASSES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#classes");
    /// A subset of a dataset that contains only the entities of a certain class.
    pub const CLASS_PARTITION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#classPartition");
    /// The total number of distinct objects in a dataset.
    pub const DISTINCT_OBJECTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#distinctObjects");
    /// The total number of distinct subjects in a dataset.
    pub const DISTINCT_SUBJECTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#distinctSubjects");
    /// The total number of entities that are described in a dataset.
    pub const ENTITIES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#entities");
    /// Points to the dataset that a document is a part of.
    pub const IN_DATASET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#inDataset");
    /// The total number of distinct properties in a dataset.
    pub const PROPERTIES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#properties");
    /// The property that is the predicate of all triples in a property-based partition.
    pub const PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#property");
    /// A subset of a dataset that contains only the triples of a certain property.
    pub const PROPERTY_PARTITION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#propertyPartition");
    /// The SPARQL endpoint of a dataset.
    pub const SPARQL_ENDPOINT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#sparqlEndpoint");
    /// The total number of triples contained in a dataset.
    pub const TRIPLES: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#triples");
    /// A URI that is a common string prefix of all the entity URIs in a dataset.
    pub const URI_SPACE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://rdfs.org/ns/void#uriSpace");
}

/// [SPARQL 1.1 Service Description](https://www.w3.org/TR/sparql11-service-description/)
/// vocabulary.
pub mod sd {
    use oxrdf::NamedNodeRef;

    /// The class of RDF datasets described by a service description.
    pub const DATASET: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/sparql-service-description#Dataset");
    /// The class of RDF graphs described by a service description.
    pub const GRAPH: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/sparql-service-description#Graph");
}

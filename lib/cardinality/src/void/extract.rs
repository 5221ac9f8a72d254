use crate::error::CardinalityResult;
use crate::void::{ClassPartition, PropertyPartition, VoidDescription};
use itertools::Itertools;
use oxrdfio::RdfParser;
use rdf_adaptive_model::vocab::{rdf, sd, void};
use rdf_adaptive_model::{Graph, NamedNodeRef, Quad, SubjectRef, TermRef, Triple};
use std::collections::BTreeMap;
use std::io::Read;

/// Extracts [VoidDescription]s from RDF data.
///
/// Every IRI that is typed as `void:Dataset`, `sd:Dataset` or `sd:Graph` is described.
/// Statistics are read from literals whose lexical form is a non-negative integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidDescriptionExtractor {
    infer_uri_space: bool,
}

impl VoidDescriptionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// If enabled, a dataset without `void:uriSpace` uses the part of its IRI before
    /// `.well-known` as uri space.
    #[must_use]
    pub fn with_infer_uri_space(mut self, infer_uri_space: bool) -> Self {
        self.infer_uri_space = infer_uri_space;
        self
    }

    /// Returns the descriptions in `graph`, ordered by dataset IRI.
    pub fn extract(&self, graph: &Graph) -> Vec<VoidDescription> {
        [void::DATASET, sd::DATASET, sd::GRAPH]
            .into_iter()
            .flat_map(|class| graph.subjects_for_predicate_object(rdf::TYPE, class))
            .filter_map(|subject| match subject {
                SubjectRef::NamedNode(node) => Some(node),
                _ => None,
            })
            .sorted_by(|a, b| a.as_str().cmp(b.as_str()))
            .dedup()
            .map(|dataset| self.describe(graph, dataset))
            .collect()
    }

    /// Returns the descriptions in `quads`, ignoring their graph names.
    pub fn extract_quads(&self, quads: impl IntoIterator<Item = Quad>) -> Vec<VoidDescription> {
        let mut graph = Graph::new();
        for quad in quads {
            graph.insert(&Triple::from(quad));
        }
        self.extract(&graph)
    }

    /// Parses `reader` with `parser` and returns the descriptions it contains.
    pub fn parse(
        &self,
        parser: impl Into<RdfParser>,
        reader: impl Read,
    ) -> CardinalityResult<Vec<VoidDescription>> {
        let quads = parser
            .into()
            .for_reader(reader)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.extract_quads(quads))
    }

    fn describe(&self, graph: &Graph, dataset: NamedNodeRef<'_>) -> VoidDescription {
        let subject = SubjectRef::from(dataset);
        let uri_space = iri(graph, subject, void::URI_SPACE).or_else(|| {
            self.infer_uri_space.then(|| {
                dataset
                    .as_str()
                    .split(".well-known")
                    .next()
                    .unwrap_or_default()
                    .to_owned()
            })
        });

        VoidDescription {
            dataset: dataset.as_str().to_owned(),
            sparql_endpoint: iri(graph, subject, void::SPARQL_ENDPOINT),
            uri_space,
            triples: integer(graph, subject, void::TRIPLES),
            entities: integer(graph, subject, void::ENTITIES),
            classes: integer(graph, subject, void::CLASSES),
            properties: integer(graph, subject, void::PROPERTIES),
            distinct_subjects: integer(graph, subject, void::DISTINCT_SUBJECTS),
            distinct_objects: integer(graph, subject, void::DISTINCT_OBJECTS),
            property_partitions: property_partitions(graph, subject),
            class_partitions: class_partitions(graph, subject),
        }
    }
}

fn as_subject(term: TermRef<'_>) -> Option<SubjectRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(node.into()),
        TermRef::BlankNode(node) => Some(node.into()),
        _ => None,
    }
}

fn integer(graph: &Graph, subject: SubjectRef<'_>, predicate: NamedNodeRef<'_>) -> Option<u64> {
    match graph.object_for_subject_predicate(subject, predicate)? {
        TermRef::Literal(literal) => literal.value().trim().parse().ok(),
        _ => None,
    }
}

fn iri(graph: &Graph, subject: SubjectRef<'_>, predicate: NamedNodeRef<'_>) -> Option<String> {
    match graph.object_for_subject_predicate(subject, predicate)? {
        TermRef::NamedNode(node) => Some(node.as_str().to_owned()),
        TermRef::Literal(literal) => Some(literal.value().to_owned()),
        _ => None,
    }
}

fn property_partitions(graph: &Graph, subject: SubjectRef<'_>) -> BTreeMap<String, PropertyPartition> {
    graph
        .objects_for_subject_predicate(subject, void::PROPERTY_PARTITION)
        .filter_map(as_subject)
        .filter_map(|partition| {
            let TermRef::NamedNode(property) =
                graph.object_for_subject_predicate(partition, void::PROPERTY)?
            else {
                return None;
            };
            let statistics = PropertyPartition {
                triples: integer(graph, partition, void::TRIPLES),
                distinct_subjects: integer(graph, partition, void::DISTINCT_SUBJECTS),
                distinct_objects: integer(graph, partition, void::DISTINCT_OBJECTS),
            };
            Some((property.as_str().to_owned(), statistics))
        })
        .collect()
}

fn class_partitions(graph: &Graph, subject: SubjectRef<'_>) -> BTreeMap<String, ClassPartition> {
    graph
        .objects_for_subject_predicate(subject, void::CLASS_PARTITION)
        .filter_map(as_subject)
        .filter_map(|partition| {
            let TermRef::NamedNode(class) =
                graph.object_for_subject_predicate(partition, void::CLASS)?
            else {
                return None;
            };
            let statistics = ClassPartition {
                entities: integer(graph, partition, void::ENTITIES),
                property_partitions: property_partitions(graph, partition),
            };
            Some((class.as_str().to_owned(), statistics))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdfio::RdfFormat;

    const DESCRIPTION: &str = r#"
        @prefix void: <http://rdfs.org/ns/void#> .
        @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

        <http://a.example/.well-known/void#dataset> a void:Dataset ;
            void:sparqlEndpoint <http://a.example/sparql> ;
            void:triples "1000"^^xsd:integer ;
            void:distinctSubjects 100 ;
            void:distinctObjects 400 ;
            void:propertyPartition [
                void:property <http://a.example/knows> ;
                void:triples 200 ;
                void:distinctSubjects 50 ;
                void:distinctObjects 80
            ] ;
            void:classPartition [
                void:class <http://a.example/Person> ;
                void:entities 70 ;
                void:propertyPartition [ void:property <http://a.example/name> ; void:triples 70 ]
            ] .

        <http://b.example/void> a <http://www.w3.org/ns/sparql-service-description#Graph> ;
            void:uriSpace "http://b.example/resource/" .
    "#;

    fn parse(extractor: VoidDescriptionExtractor) -> Vec<VoidDescription> {
        extractor
            .parse(RdfFormat::Turtle, DESCRIPTION.as_bytes())
            .unwrap()
    }

    #[test]
    fn extract_statistics() {
        let descriptions = parse(VoidDescriptionExtractor::new());

        assert_eq!(descriptions.len(), 2);
        let a = &descriptions[0];
        assert_eq!(a.dataset, "http://a.example/.well-known/void#dataset");
        assert_eq!(a.sparql_endpoint.as_deref(), Some("http://a.example/sparql"));
        assert_eq!(a.uri_space, None);
        assert_eq!(a.triples, Some(1000));
        assert_eq!(a.distinct_subjects, Some(100));
        assert_eq!(a.distinct_objects, Some(400));
        assert_eq!(a.entities, None);
        assert_eq!(
            a.property_partition("http://a.example/knows"),
            Some(&PropertyPartition {
                triples: Some(200),
                distinct_subjects: Some(50),
                distinct_objects: Some(80),
            })
        );

        let person = a.class_partition("http://a.example/Person").unwrap();
        assert_eq!(person.entities, Some(70));
        assert_eq!(
            person.property_partitions["http://a.example/name"].triples,
            Some(70)
        );

        let b = &descriptions[1];
        assert_eq!(b.uri_space.as_deref(), Some("http://b.example/resource/"));
        assert_eq!(b.match_target(), "http://b.example/resource/");
        assert!(b.property_partitions.is_empty());
    }

    #[test]
    fn infer_uri_space() {
        let descriptions = parse(VoidDescriptionExtractor::new().with_infer_uri_space(true));

        assert_eq!(descriptions[0].uri_space.as_deref(), Some("http://a.example/"));
        // A stated uri space takes precedence
        assert_eq!(
            descriptions[1].uri_space.as_deref(),
            Some("http://b.example/resource/")
        );
    }

    #[test]
    fn invalid_turtle() {
        let result = VoidDescriptionExtractor::new()
            .parse(RdfFormat::Turtle, "<http://a.example/> a".as_bytes());

        assert!(result.is_err());
    }
}

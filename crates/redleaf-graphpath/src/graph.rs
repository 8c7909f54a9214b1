//! The graph collaborator: the only thing the engine asks of a triple store.
//!
//! Node ids are the store's own dense `u32` ids; predicates and classes are
//! passed as IRIs so step trees stay independent of any one store. Lookups
//! return `anyhow::Result` and the engine forwards failures unchanged (wrapped
//! with the step that asked).

use anyhow::Result;
use oxrdf::NamedNodeRef;

use crate::NodeSet;

/// A node of the graph, as identified by the collaborator.
pub type NodeId = u32;

pub trait Graph {
    /// Objects `o` of triples `(subject, predicate, o)`.
    fn objects_of(&self, subject: NodeId, predicate: NamedNodeRef<'_>) -> Result<NodeSet>;

    /// Subjects `s` of triples `(s, predicate, object)`.
    fn subjects_of(&self, predicate: NamedNodeRef<'_>, object: NodeId) -> Result<NodeSet>;

    /// Every node that is the subject of at least one `predicate` triple.
    fn all_subjects_with(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet>;

    /// Every node that is the object of at least one `predicate` triple.
    fn all_objects_of(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet>;

    /// Whether `(node, rdf:type, class)` holds.
    fn is_member_of_class(&self, node: NodeId, class: NamedNodeRef<'_>) -> Result<bool>;

    /// Every node typed with `class`.
    fn all_members_of_class(&self, class: NamedNodeRef<'_>) -> Result<NodeSet>;
}

impl<G: Graph + ?Sized> Graph for &G {
    fn objects_of(&self, subject: NodeId, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        (**self).objects_of(subject, predicate)
    }

    fn subjects_of(&self, predicate: NamedNodeRef<'_>, object: NodeId) -> Result<NodeSet> {
        (**self).subjects_of(predicate, object)
    }

    fn all_subjects_with(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        (**self).all_subjects_with(predicate)
    }

    fn all_objects_of(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        (**self).all_objects_of(predicate)
    }

    fn is_member_of_class(&self, node: NodeId, class: NamedNodeRef<'_>) -> Result<bool> {
        (**self).is_member_of_class(node, class)
    }

    fn all_members_of_class(&self, class: NamedNodeRef<'_>) -> Result<NodeSet> {
        (**self).all_members_of_class(class)
    }
}

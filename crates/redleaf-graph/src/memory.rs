//! In-memory triple store with bitmap indexes in both directions.
//!
//! Each triple `(s, p, o)` is recorded in four places:
//!
//! - forward: `(s, p) -> {o}`
//! - backward: `(o, p) -> {s}`
//! - per predicate: `p -> {s}` and `p -> {o}`
//!
//! Removal shrinks the same entries and drops them once empty, so every index
//! answers exactly for the triples currently stored.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use oxrdf::vocab::rdf;
use oxrdf::{NamedNode, NamedNodeRef, Subject, Term, Triple};
use redleaf_graphpath::{Graph, NodeId, NodeSet};

use crate::interner::TermInterner;

/// Dense index into `MemoryGraph::predicates`.
type PredicateId = u32;

type TripleIds = (NodeId, PredicateId, NodeId);

#[derive(Debug, Default)]
pub struct MemoryGraph {
    terms: TermInterner,
    predicate_ids: AHashMap<String, PredicateId>,
    predicates: Vec<NamedNode>,
    triples: AHashSet<TripleIds>,
    forward: AHashMap<(NodeId, PredicateId), NodeSet>,
    backward: AHashMap<(NodeId, PredicateId), NodeSet>,
    subjects_by_predicate: AHashMap<PredicateId, NodeSet>,
    objects_by_predicate: AHashMap<PredicateId, NodeSet>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: &Triple) -> bool {
        let s = self.terms.intern(&Term::from(triple.subject.clone()));
        let p = self.intern_predicate(&triple.predicate);
        let o = self.terms.intern(&triple.object);
        if !self.triples.insert((s, p, o)) {
            return false;
        }
        self.forward.entry((s, p)).or_default().insert(o);
        self.backward.entry((o, p)).or_default().insert(s);
        self.subjects_by_predicate.entry(p).or_default().insert(s);
        self.objects_by_predicate.entry(p).or_default().insert(o);
        true
    }

    /// Add many triples, returning how many were new.
    pub fn extend<I: IntoIterator<Item = Triple>>(&mut self, triples: I) -> usize {
        let mut added = 0;
        for triple in triples {
            if self.insert(&triple) {
                added += 1;
            }
        }
        tracing::debug!(
            triples = added,
            total = self.triples.len(),
            nodes = self.terms.len(),
            "loaded triples"
        );
        added
    }

    /// Remove a triple. Returns `false` if it was not present.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        let Some((s, p, o)) = self.resolve(triple) else {
            return false;
        };
        if !self.triples.remove(&(s, p, o)) {
            return false;
        }
        if drop_member(&mut self.forward, (s, p), o) {
            drop_member(&mut self.subjects_by_predicate, p, s);
        }
        if drop_member(&mut self.backward, (o, p), s) {
            drop_member(&mut self.objects_by_predicate, p, o);
        }
        true
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn contains(&self, triple: &Triple) -> bool {
        self.resolve(triple)
            .is_some_and(|ids| self.triples.contains(&ids))
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Triples matching a pattern; `None` is a wildcard. Results are ordered by
    /// node id.
    pub fn search(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Vec<Triple> {
        // A bound term the graph has never seen matches nothing.
        let s = match subject.map(|s| self.terms.id_of(&Term::from(s.clone()))) {
            Some(None) => return Vec::new(),
            resolved => resolved.flatten(),
        };
        let p = match predicate.map(|p| self.predicate_id(p.as_ref())) {
            Some(None) => return Vec::new(),
            resolved => resolved.flatten(),
        };
        let o = match object.map(|o| self.terms.id_of(o)) {
            Some(None) => return Vec::new(),
            resolved => resolved.flatten(),
        };

        let mut found: Vec<TripleIds> = match (s, p, o) {
            (Some(s), Some(p), _) => self
                .forward
                .get(&(s, p))
                .into_iter()
                .flat_map(|objects| objects.iter())
                .filter(|object| o.map_or(true, |o| o == *object))
                .map(|object| (s, p, object))
                .collect(),
            (None, Some(p), Some(o)) => self
                .backward
                .get(&(o, p))
                .into_iter()
                .flat_map(|subjects| subjects.iter())
                .map(|subject| (subject, p, o))
                .collect(),
            _ => self
                .triples
                .iter()
                .copied()
                .filter(|(ts, tp, to)| {
                    s.map_or(true, |s| s == *ts)
                        && p.map_or(true, |p| p == *tp)
                        && o.map_or(true, |o| o == *to)
                })
                .collect(),
        };
        found.sort_unstable();
        found.into_iter().filter_map(|ids| self.triple(ids)).collect()
    }

    // ========================================================================
    // Node ids
    // ========================================================================

    pub fn node_id(&self, term: &Term) -> Option<NodeId> {
        self.terms.id_of(term)
    }

    pub fn term(&self, id: NodeId) -> Option<Term> {
        self.terms.lookup(id)
    }

    /// Terms for a set of node ids, in id order. Unknown ids are skipped.
    pub fn terms(&self, nodes: &NodeSet) -> Vec<Term> {
        nodes.iter().filter_map(|id| self.terms.lookup(id)).collect()
    }

    /// Node ids for `terms`. Terms the graph has never seen are skipped.
    pub fn population<'a>(&self, terms: impl IntoIterator<Item = &'a Term>) -> NodeSet {
        terms
            .into_iter()
            .filter_map(|term| self.terms.id_of(term))
            .collect()
    }

    /// Every node appearing as subject or object of a stored triple.
    pub fn all_nodes(&self) -> NodeSet {
        self.subjects() | self.objects()
    }

    pub fn subjects(&self) -> NodeSet {
        self.subjects_by_predicate.values().fold(NodeSet::new(), |acc, s| acc | s)
    }

    pub fn objects(&self) -> NodeSet {
        self.objects_by_predicate.values().fold(NodeSet::new(), |acc, o| acc | o)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn predicate_id(&self, predicate: NamedNodeRef<'_>) -> Option<PredicateId> {
        self.predicate_ids.get(predicate.as_str()).copied()
    }

    fn intern_predicate(&mut self, predicate: &NamedNode) -> PredicateId {
        if let Some(id) = self.predicate_id(predicate.as_ref()) {
            return id;
        }
        let id = self.predicates.len() as PredicateId;
        self.predicates.push(predicate.clone());
        self.predicate_ids.insert(predicate.as_str().to_string(), id);
        id
    }

    fn resolve(&self, triple: &Triple) -> Option<TripleIds> {
        let s = self.terms.id_of(&Term::from(triple.subject.clone()))?;
        let p = self.predicate_id(triple.predicate.as_ref())?;
        let o = self.terms.id_of(&triple.object)?;
        Some((s, p, o))
    }

    fn triple(&self, (s, p, o): TripleIds) -> Option<Triple> {
        let subject = match self.terms.lookup(s)? {
            Term::NamedNode(node) => Subject::from(node),
            Term::BlankNode(node) => Subject::from(node),
            _ => return None,
        };
        let predicate = self.predicates.get(p as usize)?.clone();
        let object = self.terms.lookup(o)?;
        Some(Triple::new(subject, predicate, object))
    }

    /// `(rdf:type, class)` ids, if both are known.
    fn class_key(&self, class: NamedNodeRef<'_>) -> Option<(PredicateId, NodeId)> {
        let rdf_type = self.predicate_id(rdf::TYPE)?;
        let class = self.terms.id_of(&Term::from(class.into_owned()))?;
        Some((rdf_type, class))
    }
}

/// Remove `member` from the set under `key`, dropping the entry once empty.
/// Returns `true` if the entry was dropped.
fn drop_member<K: Hash + Eq>(index: &mut AHashMap<K, NodeSet>, key: K, member: u32) -> bool {
    let Some(set) = index.get_mut(&key) else {
        return false;
    };
    set.remove(member);
    if set.is_empty() {
        index.remove(&key);
        true
    } else {
        false
    }
}

impl FromIterator<Triple> for MemoryGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

impl Graph for MemoryGraph {
    fn objects_of(&self, subject: NodeId, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        Ok(self
            .predicate_id(predicate)
            .and_then(|p| self.forward.get(&(subject, p)))
            .cloned()
            .unwrap_or_default())
    }

    fn subjects_of(&self, predicate: NamedNodeRef<'_>, object: NodeId) -> Result<NodeSet> {
        Ok(self
            .predicate_id(predicate)
            .and_then(|p| self.backward.get(&(object, p)))
            .cloned()
            .unwrap_or_default())
    }

    fn all_subjects_with(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        Ok(self
            .predicate_id(predicate)
            .and_then(|p| self.subjects_by_predicate.get(&p))
            .cloned()
            .unwrap_or_default())
    }

    fn all_objects_of(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        Ok(self
            .predicate_id(predicate)
            .and_then(|p| self.objects_by_predicate.get(&p))
            .cloned()
            .unwrap_or_default())
    }

    fn is_member_of_class(&self, node: NodeId, class: NamedNodeRef<'_>) -> Result<bool> {
        Ok(self.class_key(class).is_some_and(|(rdf_type, class)| {
            self.forward
                .get(&(node, rdf_type))
                .is_some_and(|types| types.contains(class))
        }))
    }

    fn all_members_of_class(&self, class: NamedNodeRef<'_>) -> Result<NodeSet> {
        Ok(self
            .class_key(class)
            .and_then(|(rdf_type, class)| self.backward.get(&(class, rdf_type)))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{BlankNode, Literal};

    const EX: &str = "http://example.org/";

    fn iri(local: &str) -> NamedNode {
        NamedNode::new(format!("{EX}{local}")).unwrap()
    }

    fn knows(s: &str, o: &str) -> Triple {
        Triple::new(iri(s), iri("knows"), iri(o))
    }

    fn id(graph: &MemoryGraph, local: &str) -> NodeId {
        graph.node_id(&Term::from(iri(local))).unwrap()
    }

    #[test]
    fn insert_is_idempotent() {
        let mut graph = MemoryGraph::new();
        assert!(graph.insert(&knows("alice", "bob")));
        assert!(!graph.insert(&knows("alice", "bob")));
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(&knows("alice", "bob")));
        assert!(!graph.contains(&knows("bob", "alice")));
    }

    #[test]
    fn extend_counts_new_triples() {
        let mut graph = MemoryGraph::new();
        let added = graph.extend(vec![
            knows("alice", "bob"),
            knows("bob", "carol"),
            knows("alice", "bob"),
        ]);
        assert_eq!(added, 2);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn indexes_answer_both_directions() {
        let graph: MemoryGraph = vec![knows("alice", "bob"), knows("alice", "carol")]
            .into_iter()
            .collect();
        let knows = iri("knows");
        let alice = id(&graph, "alice");
        let bob = id(&graph, "bob");
        let carol = id(&graph, "carol");

        let objects = graph.objects_of(alice, knows.as_ref()).unwrap();
        assert_eq!(objects.iter().collect::<Vec<_>>(), vec![bob, carol]);
        let subjects = graph.subjects_of(knows.as_ref(), carol).unwrap();
        assert_eq!(subjects.iter().collect::<Vec<_>>(), vec![alice]);
        assert_eq!(graph.all_subjects_with(knows.as_ref()).unwrap().len(), 1);
        assert_eq!(graph.all_objects_of(knows.as_ref()).unwrap().len(), 2);
    }

    #[test]
    fn unknown_predicate_is_empty_not_an_error() {
        let graph: MemoryGraph = std::iter::once(knows("alice", "bob")).collect();
        let missing = iri("likes");
        assert!(graph.all_subjects_with(missing.as_ref()).unwrap().is_empty());
        assert!(graph.objects_of(0, missing.as_ref()).unwrap().is_empty());
        assert!(!graph.is_member_of_class(0, missing.as_ref()).unwrap());
    }

    #[test]
    fn classes_come_from_rdf_type() {
        let person = iri("Person");
        let graph: MemoryGraph = vec![
            Triple::new(iri("alice"), rdf::TYPE, person.clone()),
            knows("alice", "bob"),
        ]
        .into_iter()
        .collect();
        let alice = id(&graph, "alice");
        let bob = id(&graph, "bob");

        assert!(graph.is_member_of_class(alice, person.as_ref()).unwrap());
        assert!(!graph.is_member_of_class(bob, person.as_ref()).unwrap());
        let members = graph.all_members_of_class(person.as_ref()).unwrap();
        assert_eq!(members.iter().collect::<Vec<_>>(), vec![alice]);
    }

    #[test]
    fn remove_keeps_indexes_exact() {
        let mut graph: MemoryGraph = vec![knows("alice", "bob"), knows("carol", "bob")]
            .into_iter()
            .collect();
        let knows_p = iri("knows");
        let alice = id(&graph, "alice");
        let bob = id(&graph, "bob");
        let carol = id(&graph, "carol");

        assert!(graph.remove(&knows("alice", "bob")));
        assert!(!graph.remove(&knows("alice", "bob")));
        assert!(!graph.remove(&knows("nobody", "bob")));

        assert!(graph.objects_of(alice, knows_p.as_ref()).unwrap().is_empty());
        let subjects = graph.all_subjects_with(knows_p.as_ref()).unwrap();
        assert_eq!(subjects.iter().collect::<Vec<_>>(), vec![carol]);
        let objects = graph.all_objects_of(knows_p.as_ref()).unwrap();
        assert_eq!(objects.iter().collect::<Vec<_>>(), vec![bob]);

        assert!(graph.remove(&knows("carol", "bob")));
        assert!(graph.is_empty());
        assert!(graph.all_nodes().is_empty());
        assert!(graph.all_objects_of(knows_p.as_ref()).unwrap().is_empty());
    }

    #[test]
    fn search_treats_none_as_wildcard() {
        let name = iri("name");
        let alice_name = Triple::new(iri("alice"), name.clone(), Literal::new_simple_literal("Alice"));
        let graph: MemoryGraph = vec![
            knows("alice", "bob"),
            knows("bob", "carol"),
            alice_name.clone(),
        ]
        .into_iter()
        .collect();

        assert_eq!(graph.search(None, None, None).len(), 3);
        let alice = Subject::from(iri("alice"));
        assert_eq!(graph.search(Some(&alice), None, None).len(), 2);
        assert_eq!(
            graph.search(Some(&alice), Some(&name), None),
            vec![alice_name.clone()]
        );
        let bob = Term::from(iri("bob"));
        assert_eq!(
            graph.search(None, Some(&iri("knows")), Some(&bob)),
            vec![knows("alice", "bob")]
        );
        assert_eq!(graph.search(None, None, Some(&bob)).len(), 1);
        assert!(graph.search(Some(&Subject::from(iri("dave"))), None, None).is_empty());
        assert!(graph.search(None, Some(&iri("likes")), None).is_empty());
    }

    #[test]
    fn blank_subjects_round_trip_through_search() {
        let anon = BlankNode::new_unchecked("b0");
        let triple = Triple::new(anon.clone(), iri("knows"), iri("alice"));
        let graph: MemoryGraph = std::iter::once(triple.clone()).collect();
        assert_eq!(
            graph.search(Some(&Subject::from(anon)), None, None),
            vec![triple]
        );
    }

    #[test]
    fn populations_map_terms_to_ids() {
        let graph: MemoryGraph = vec![knows("alice", "bob"), knows("bob", "carol")]
            .into_iter()
            .collect();
        let people = [Term::from(iri("alice")), Term::from(iri("dave"))];
        let population = graph.population(&people);
        assert_eq!(population.len(), 1);
        assert_eq!(graph.terms(&population), vec![Term::from(iri("alice"))]);

        assert_eq!(graph.all_nodes().len(), 3);
        assert_eq!(graph.subjects().len(), 2);
        assert_eq!(graph.objects().len(), 2);
    }
}

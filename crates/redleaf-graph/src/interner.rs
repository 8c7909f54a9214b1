//! RDF term interning: every distinct term gets a dense `u32` node id.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use oxrdf::Term;
use redleaf_graphpath::NodeId;

/// Bidirectional `Term` <-> [`NodeId`] table. Ids are never reused.
#[derive(Debug)]
pub struct TermInterner {
    term_to_id: DashMap<Term, NodeId>,
    id_to_term: DashMap<NodeId, Term>,
    next_id: AtomicU32,
}

impl TermInterner {
    pub fn new() -> Self {
        Self {
            term_to_id: DashMap::new(),
            id_to_term: DashMap::new(),
            next_id: AtomicU32::new(0),
        }
    }

    /// Intern a term, returning its id
    pub fn intern(&self, term: &Term) -> NodeId {
        if let Some(id) = self.term_to_id.get(term) {
            return *id;
        }
        *self.term_to_id.entry(term.clone()).or_insert_with(|| {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.id_to_term.insert(id, term.clone());
            id
        })
    }

    /// Look up an existing id without inserting.
    pub fn id_of(&self, term: &Term) -> Option<NodeId> {
        self.term_to_id.get(term).map(|id| *id)
    }

    pub fn lookup(&self, id: NodeId) -> Option<Term> {
        self.id_to_term.get(&id).map(|term| term.clone())
    }

    pub fn len(&self) -> usize {
        self.id_to_term.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_term.is_empty()
    }
}

impl Default for TermInterner {
    fn default() -> Self {
        Self::new()
    }
}

//! Shared fixtures: a linear-scan graph collaborator and a naive relation
//! oracle the evaluator is compared against.

#![allow(dead_code)]

use std::collections::BTreeSet;

use anyhow::{anyhow, Result};
use oxrdf::{NamedNode, NamedNodeRef};
use redleaf_graphpath::{Graph, NodeId, NodeSet, Step};

pub fn predicate(i: usize) -> NamedNode {
    NamedNode::new_unchecked(format!("http://example.org/p{i}"))
}

pub fn class() -> NamedNode {
    NamedNode::new_unchecked("http://example.org/Thing")
}

#[derive(Debug, Clone, Default)]
pub struct TestGraph {
    pub arcs: Vec<(NodeId, NamedNode, NodeId)>,
    pub types: Vec<(NodeId, NamedNode)>,
    /// Lookups touching this predicate fail.
    pub broken: Option<NamedNode>,
}

impl TestGraph {
    pub fn arc(mut self, s: NodeId, p: &NamedNode, o: NodeId) -> Self {
        self.arcs.push((s, p.clone(), o));
        self
    }

    pub fn typed(mut self, node: NodeId, class: &NamedNode) -> Self {
        self.types.push((node, class.clone()));
        self
    }

    fn check(&self, p: NamedNodeRef<'_>) -> Result<()> {
        match &self.broken {
            Some(broken) if broken.as_ref() == p => Err(anyhow!("store offline")),
            _ => Ok(()),
        }
    }
}

impl Graph for TestGraph {
    fn objects_of(&self, subject: NodeId, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        self.check(predicate)?;
        Ok(self
            .arcs
            .iter()
            .filter(|(s, p, _)| *s == subject && p.as_ref() == predicate)
            .map(|(_, _, o)| *o)
            .collect())
    }

    fn subjects_of(&self, predicate: NamedNodeRef<'_>, object: NodeId) -> Result<NodeSet> {
        self.check(predicate)?;
        Ok(self
            .arcs
            .iter()
            .filter(|(_, p, o)| *o == object && p.as_ref() == predicate)
            .map(|(s, _, _)| *s)
            .collect())
    }

    fn all_subjects_with(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        self.check(predicate)?;
        Ok(self
            .arcs
            .iter()
            .filter(|(_, p, _)| p.as_ref() == predicate)
            .map(|(s, _, _)| *s)
            .collect())
    }

    fn all_objects_of(&self, predicate: NamedNodeRef<'_>) -> Result<NodeSet> {
        self.check(predicate)?;
        Ok(self
            .arcs
            .iter()
            .filter(|(_, p, _)| p.as_ref() == predicate)
            .map(|(_, _, o)| *o)
            .collect())
    }

    fn is_member_of_class(&self, node: NodeId, class: NamedNodeRef<'_>) -> Result<bool> {
        self.check(class)?;
        Ok(self
            .types
            .iter()
            .any(|(n, c)| *n == node && c.as_ref() == class))
    }

    fn all_members_of_class(&self, class: NamedNodeRef<'_>) -> Result<NodeSet> {
        self.check(class)?;
        Ok(self
            .types
            .iter()
            .filter(|(_, c)| c.as_ref() == class)
            .map(|(n, _)| *n)
            .collect())
    }
}

// ============================================================================
// Naive oracle: enumerate the relation a step denotes inside a population
// ============================================================================

pub type Pairs = BTreeSet<(NodeId, NodeId)>;

pub fn relation(step: &Step, graph: &TestGraph, population: &NodeSet) -> Pairs {
    let identity_where = |keep: &dyn Fn(NodeId) -> bool| -> Pairs {
        population
            .iter()
            .filter(|n| keep(*n))
            .map(|n| (n, n))
            .collect()
    };
    match step {
        Step::Arc(p) => graph
            .arcs
            .iter()
            .filter(|(s, q, o)| q == p && population.contains(*s) && population.contains(*o))
            .map(|(s, _, o)| (*s, *o))
            .collect(),
        Step::Class(c) => identity_where(&|n| graph.types.iter().any(|(m, k)| *m == n && k == c)),
        Step::Identity => identity_where(&|_| true),
        Step::HasNo(p) => identity_where(&|n| !graph.arcs.iter().any(|(s, q, _)| *s == n && q == p)),
        Step::Path { lhs, rhs } => {
            let first = relation(rhs, graph, population);
            let second = relation(lhs, graph, population);
            let mut out = Pairs::new();
            for (x, y) in &first {
                for (y2, z) in &second {
                    if y == y2 {
                        out.insert((*x, *z));
                    }
                }
            }
            out
        }
        Step::Predicate { lhs, rhs } => {
            let condition = domain(&relation(rhs, graph, population));
            relation(lhs, graph, population)
                .into_iter()
                .filter(|(_, y)| condition.contains(y))
                .collect()
        }
        Step::Projection { lhs, rhs } => {
            let starts = domain(&relation(lhs, graph, population));
            relation(rhs, graph, population)
                .into_iter()
                .filter(|(x, _)| starts.contains(x))
                .collect()
        }
        Step::Union { lhs, rhs } => relation(lhs, graph, population)
            .union(&relation(rhs, graph, population))
            .copied()
            .collect(),
        Step::Intersect { lhs, rhs } => relation(lhs, graph, population)
            .intersection(&relation(rhs, graph, population))
            .copied()
            .collect(),
        Step::Inverse(inner) => relation(inner, graph, population)
            .into_iter()
            .map(|(x, y)| (y, x))
            .collect(),
        Step::ScanOnly(inner) => relation(inner, graph, population),
    }
}

pub fn domain(pairs: &Pairs) -> BTreeSet<NodeId> {
    pairs.iter().map(|(x, _)| *x).collect()
}

pub fn range(pairs: &Pairs) -> BTreeSet<NodeId> {
    pairs.iter().map(|(_, y)| *y).collect()
}

pub fn image(pairs: &Pairs, subjects: &NodeSet) -> BTreeSet<NodeId> {
    pairs
        .iter()
        .filter(|(x, _)| subjects.contains(*x))
        .map(|(_, y)| *y)
        .collect()
}

pub fn preimage(pairs: &Pairs, values: &NodeSet) -> BTreeSet<NodeId> {
    pairs
        .iter()
        .filter(|(_, y)| values.contains(*y))
        .map(|(x, _)| *x)
        .collect()
}

pub fn sorted(set: &NodeSet) -> BTreeSet<NodeId> {
    set.iter().collect()
}

/// Wrap every other level of the tree in `ScanOnly`, starting below the root
/// when `odd` is false.
pub fn scan_alternate(step: Step, odd: bool) -> Step {
    let rebuilt = match step {
        Step::Path { lhs, rhs } => Step::path(scan_alternate(*lhs, !odd), scan_alternate(*rhs, !odd)),
        Step::Predicate { lhs, rhs } => scan_alternate(*lhs, !odd).filter(scan_alternate(*rhs, !odd)),
        Step::Projection { lhs, rhs } => scan_alternate(*lhs, !odd).project(scan_alternate(*rhs, !odd)),
        Step::Union { lhs, rhs } => scan_alternate(*lhs, !odd).union(scan_alternate(*rhs, !odd)),
        Step::Intersect { lhs, rhs } => {
            scan_alternate(*lhs, !odd).intersect(scan_alternate(*rhs, !odd))
        }
        Step::Inverse(inner) => Step::Inverse(Box::new(scan_alternate(*inner, !odd))),
        Step::ScanOnly(inner) => Step::ScanOnly(Box::new(scan_alternate(*inner, !odd))),
        atom => atom,
    };
    if odd {
        rebuilt.scan_only()
    } else {
        rebuilt
    }
}

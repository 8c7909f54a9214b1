//! Step expressions: the terms of the path algebra.
//!
//! A [`Step`] denotes a binary relation between graph nodes. Atomic steps read
//! the relation straight from the graph collaborator; operators build new
//! relations out of their operands. Trees are immutable: every builder consumes
//! its operands and returns a new tree, and nothing is evaluated until the tree
//! is handed to an [`crate::Evaluator`].

use std::fmt;

use oxrdf::NamedNode;

use crate::error::{PathError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// One RDF property, traversed subject to object.
    Arc(NamedNode),
    /// Nodes typed with a class (identity relation on the class members).
    Class(NamedNode),
    /// The identity relation ("self").
    Identity,
    /// Nodes without any outgoing arc for a property (identity relation).
    HasNo(NamedNode),
    /// Sequential composition: `rhs` first, then `lhs`.
    Path { lhs: Box<Step>, rhs: Box<Step> },
    /// `lhs`, keeping only the nodes it reaches that are initials of `rhs`.
    Predicate { lhs: Box<Step>, rhs: Box<Step> },
    /// `rhs`, applied only to nodes that are initials of `lhs`.
    Projection { lhs: Box<Step>, rhs: Box<Step> },
    Union { lhs: Box<Step>, rhs: Box<Step> },
    Intersect { lhs: Box<Step>, rhs: Box<Step> },
    /// The converse relation.
    Inverse(Box<Step>),
    /// Same relation as the operand, but never answers `initials` or
    /// `terminals` directly.
    ScanOnly(Box<Step>),
}

fn parse_iri(operator: &'static str, iri: &str) -> Result<NamedNode> {
    NamedNode::new(iri).map_err(|source| PathError::InvalidIri {
        operator,
        iri: iri.to_string(),
        source,
    })
}

impl Step {
    // ========================================================================
    // Atomic steps
    // ========================================================================

    /// Property step for `predicate`, which must be an absolute IRI.
    pub fn arc(predicate: &str) -> Result<Self> {
        Ok(Step::Arc(parse_iri("arc", predicate)?))
    }

    /// Class-membership step for `class`, which must be an absolute IRI.
    pub fn class(class: &str) -> Result<Self> {
        Ok(Step::Class(parse_iri("class", class)?))
    }

    pub fn identity() -> Self {
        Step::Identity
    }

    pub fn has_no(predicate: &str) -> Result<Self> {
        Ok(Step::HasNo(parse_iri("has-no", predicate)?))
    }

    /// `Path(lhs, rhs)`: evaluate `rhs`, then feed its results to `lhs`.
    pub fn path(lhs: Step, rhs: Step) -> Self {
        Step::Path {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// `self` then `next`.
    pub fn compose(self, next: Step) -> Self {
        Step::path(next, self)
    }

    /// Keep the nodes reached by `self` from which `condition` can step.
    pub fn filter(self, condition: Step) -> Self {
        Step::Predicate {
            lhs: Box::new(self),
            rhs: Box::new(condition),
        }
    }

    /// Apply `onto` to the nodes `self` can start from.
    pub fn project(self, onto: Step) -> Self {
        Step::Projection {
            lhs: Box::new(self),
            rhs: Box::new(onto),
        }
    }

    pub fn union(self, other: Step) -> Self {
        Step::Union {
            lhs: Box::new(self),
            rhs: Box::new(other),
        }
    }

    pub fn intersect(self, other: Step) -> Self {
        Step::Intersect {
            lhs: Box::new(self),
            rhs: Box::new(other),
        }
    }

    /// Evaluation hint: hide the efficient `initials`/`terminals` of `self`.
    pub fn scan_only(self) -> Self {
        Step::ScanOnly(Box::new(self))
    }

    /// The converse step.
    ///
    /// Inverses are pushed through the operators that have a direct law for
    /// it (`Path` reverses its operands, `Union`/`Intersect` invert each side);
    /// identity-like atoms are symmetric and come back unchanged.
    ///
    /// `s.invert().invert()` always evaluates like `s`. It is also structurally
    /// equal to `s` when `s` was built with the builders; a hand-written
    /// `Step::Inverse` around a pushable or symmetric step comes back in the
    /// pushed-through form.
    pub fn invert(self) -> Self {
        match self {
            Step::Inverse(inner) => *inner,
            Step::Identity | Step::Class(_) | Step::HasNo(_) => self,
            Step::Path { lhs, rhs } => Step::path(rhs.invert(), lhs.invert()),
            Step::Union { lhs, rhs } => lhs.invert().union(rhs.invert()),
            Step::Intersect { lhs, rhs } => lhs.invert().intersect(rhs.invert()),
            Step::ScanOnly(inner) => inner.invert().scan_only(),
            step @ (Step::Arc(_) | Step::Predicate { .. } | Step::Projection { .. }) => {
                Step::Inverse(Box::new(step))
            }
        }
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Name of the variant, e.g. `"path"` or `"arc"`.
    pub fn operator(&self) -> &'static str {
        match self {
            Step::Arc(_) => "arc",
            Step::Class(_) => "class",
            Step::Identity => "self",
            Step::HasNo(_) => "has-no",
            Step::Path { .. } => "path",
            Step::Predicate { .. } => "predicate",
            Step::Projection { .. } => "projection",
            Step::Union { .. } => "union",
            Step::Intersect { .. } => "intersect",
            Step::Inverse(_) => "inverse",
            Step::ScanOnly(_) => "scan-only",
        }
    }

    /// Direct sub-expressions, left operand first.
    pub fn operands(&self) -> Vec<&Step> {
        match self {
            Step::Arc(_) | Step::Class(_) | Step::Identity | Step::HasNo(_) => Vec::new(),
            Step::Path { lhs, rhs }
            | Step::Predicate { lhs, rhs }
            | Step::Projection { lhs, rhs }
            | Step::Union { lhs, rhs }
            | Step::Intersect { lhs, rhs } => vec![lhs.as_ref(), rhs.as_ref()],
            Step::Inverse(inner) | Step::ScanOnly(inner) => vec![inner.as_ref()],
        }
    }

    /// Visit every node of the tree, operands before the operator.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Step)) {
        for operand in self.operands() {
            operand.walk(visit);
        }
        visit(self);
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    pub fn depth(&self) -> usize {
        1 + self
            .operands()
            .into_iter()
            .map(Step::depth)
            .max()
            .unwrap_or(0)
    }
}

impl From<NamedNode> for Step {
    fn from(predicate: NamedNode) -> Self {
        Step::Arc(predicate)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Arc(p) => write!(f, "{p}"),
            Step::Class(c) => write!(f, "Class({c})"),
            Step::Identity => f.write_str("Self"),
            Step::HasNo(p) => write!(f, "HasNo({p})"),
            // Reads in traversal order.
            Step::Path { lhs, rhs } => write!(f, "({rhs}/{lhs})"),
            Step::Predicate { lhs, rhs } => write!(f, "{lhs}[{rhs}]"),
            Step::Projection { lhs, rhs } => write!(f, "{lhs}%{rhs}"),
            Step::Union { lhs, rhs } => write!(f, "({lhs}|{rhs})"),
            Step::Intersect { lhs, rhs } => write!(f, "({lhs}&{rhs})"),
            Step::Inverse(inner) => write!(f, "~{inner}"),
            Step::ScanOnly(inner) => write!(f, "Scan({inner})"),
        }
    }
}

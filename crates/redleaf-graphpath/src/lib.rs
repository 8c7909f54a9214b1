//! GraphPath: a small algebra of path expressions over an RDF graph.
//!
//! Step expressions ([`Step`]) are built from atomic steps (a property, a
//! class, the identity) with composition, filtering, projection, union,
//! intersection and inversion. An [`Evaluator`] answers four primitives for a
//! step against a population of graph nodes: `initials`, `terminals`, `match`
//! and `values`.
//!
//! ## Strategies
//!
//! `initials`/`terminals` are answered from the graph collaborator's indexes
//! when the step allows it. A step that cannot (e.g. [`Step::HasNo`]) declines,
//! and the enclosing operator scans the population instead with
//! `filter_initials`/`filter_terminals`. Declining is a plain `Option`, never
//! an error, and never escapes [`Evaluator::initials_or_scan`],
//! [`Evaluator::terminals_or_scan`] or a [`BoundPath`].
//!
//! ## Example
//!
//! Any store implementing [`Graph`] can be queried; here a small table of
//! `(subject, predicate, object)` arcs over node ids `0..4`.
//!
//! ```
//! # use oxrdf::NamedNodeRef;
//! # use redleaf_graphpath::{Graph, NodeId, NodeSet};
//! # struct Arcs(Vec<(NodeId, &'static str, NodeId)>);
//! # impl Arcs {
//! #     fn select(&self, keep: impl Fn(NodeId, &str, NodeId) -> Option<NodeId>) -> NodeSet {
//! #         self.0.iter().filter_map(|&(s, p, o)| keep(s, p, o)).collect()
//! #     }
//! # }
//! # impl Graph for Arcs {
//! #     fn objects_of(&self, subject: NodeId, p: NamedNodeRef<'_>) -> anyhow::Result<NodeSet> {
//! #         Ok(self.select(|s, q, o| (s == subject && q == p.as_str()).then_some(o)))
//! #     }
//! #     fn subjects_of(&self, p: NamedNodeRef<'_>, object: NodeId) -> anyhow::Result<NodeSet> {
//! #         Ok(self.select(|s, q, o| (o == object && q == p.as_str()).then_some(s)))
//! #     }
//! #     fn all_subjects_with(&self, p: NamedNodeRef<'_>) -> anyhow::Result<NodeSet> {
//! #         Ok(self.select(|s, q, _| (q == p.as_str()).then_some(s)))
//! #     }
//! #     fn all_objects_of(&self, p: NamedNodeRef<'_>) -> anyhow::Result<NodeSet> {
//! #         Ok(self.select(|_, q, o| (q == p.as_str()).then_some(o)))
//! #     }
//! #     fn is_member_of_class(&self, node: NodeId, c: NamedNodeRef<'_>) -> anyhow::Result<bool> {
//! #         Ok(self.objects_of(node, oxrdf::vocab::rdf::TYPE)?.iter().any(|o| o == class_id(c)))
//! #     }
//! #     fn all_members_of_class(&self, c: NamedNodeRef<'_>) -> anyhow::Result<NodeSet> {
//! #         self.subjects_of(oxrdf::vocab::rdf::TYPE, class_id(c))
//! #     }
//! # }
//! # fn class_id(_: NamedNodeRef<'_>) -> NodeId { 3 }
//! use redleaf_graphpath::{Evaluator, Step};
//!
//! const KNOWS: &str = "http://xmlns.com/foaf/0.1/knows";
//! const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
//!
//! // 0 knows 1, 1 knows 2; 0 and 1 are typed with class node 3.
//! let graph = Arcs(vec![(0, KNOWS, 1), (1, KNOWS, 2), (0, TYPE, 3), (1, TYPE, 3)]);
//!
//! let knows = Step::arc(KNOWS)?;
//! let person = Step::class("http://xmlns.com/foaf/0.1/Person")?;
//! let friends_of_people = person.compose(knows.clone());
//! let friends_of_friends = knows.clone().compose(knows);
//!
//! let evaluator = Evaluator::new(&graph);
//! let population: NodeSet = (0..4).collect();
//! let found: Vec<NodeId> = evaluator
//!     .bind(population.clone(), friends_of_people)
//!     .iter()
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(found, vec![1, 2]);
//! assert_eq!(evaluator.bind(population, friends_of_friends).first()?, 2);
//! # Ok::<(), redleaf_graphpath::PathError>(())
//! ```

pub mod bound;
pub mod config;
pub mod error;
pub mod eval;
pub mod graph;
pub mod step;

pub use bound::{BoundPath, Terminals};
pub use config::EvalConfig;
pub use error::{PathError, Result};
pub use eval::{Evaluator, NodeStream};
pub use graph::{Graph, NodeId};
pub use step::Step;

/// A set of graph nodes: populations and primitive results.
pub type NodeSet = roaring::RoaringBitmap;

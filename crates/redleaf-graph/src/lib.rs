//! Reference graph collaborator for GraphPath.
//!
//! [`MemoryGraph`] keeps RDF triples in memory, interns every term to a dense
//! node id ([`TermInterner`]) and implements [`redleaf_graphpath::Graph`] from
//! bitmap indexes, so step trees can be evaluated end to end:
//!
//! ```
//! use oxrdf::{NamedNode, Term, Triple};
//! use redleaf_graph::MemoryGraph;
//! use redleaf_graphpath::{Evaluator, Step};
//!
//! let knows = NamedNode::new("http://xmlns.com/foaf/0.1/knows")?;
//! let alice = NamedNode::new("http://example.org/alice")?;
//! let bob = NamedNode::new("http://example.org/bob")?;
//!
//! let mut graph = MemoryGraph::new();
//! graph.insert(&Triple::new(alice, knows.clone(), bob.clone()));
//!
//! let evaluator = Evaluator::new(&graph);
//! let reached = evaluator.bind(graph.all_nodes(), Step::from(knows)).to_set()?;
//! assert_eq!(graph.terms(&reached), vec![Term::from(bob)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod interner;
pub mod memory;

pub use interner::TermInterner;
pub use memory::MemoryGraph;

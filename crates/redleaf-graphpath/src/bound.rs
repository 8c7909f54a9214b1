//! A step bound to a population: a restartable, lazy sequence of terminals.

use crate::error::{PathError, Result};
use crate::eval::{Evaluator, NodeStream};
use crate::graph::{Graph, NodeId};
use crate::step::Step;
use crate::NodeSet;

pub struct BoundPath<'g, G: Graph + ?Sized> {
    evaluator: Evaluator<'g, G>,
    population: NodeSet,
    step: Step,
}

impl<'g, G: Graph + ?Sized> BoundPath<'g, G> {
    pub(crate) fn new(evaluator: Evaluator<'g, G>, population: NodeSet, step: Step) -> Self {
        Self {
            evaluator,
            population,
            step,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn population(&self) -> &NodeSet {
        &self.population
    }

    /// Terminals of the step. Nothing is evaluated until the first `next()`,
    /// and every call starts a fresh evaluation.
    pub fn iter(&self) -> Terminals<'_, 'g, G> {
        Terminals {
            bound: self,
            state: State::Pending,
            seen: NodeSet::new(),
        }
    }

    pub fn to_set(&self) -> Result<NodeSet> {
        self.iter().collect()
    }

    /// The first terminal, failing if the path reaches nothing.
    pub fn first(&self) -> Result<NodeId> {
        match self.iter().next() {
            Some(node) => node,
            None => Err(PathError::EmptyPath {
                step: self.step.to_string(),
            }),
        }
    }
}

impl<'a, 'g, G: Graph + ?Sized> IntoIterator for &'a BoundPath<'g, G> {
    type Item = Result<NodeId>;
    type IntoIter = Terminals<'a, 'g, G>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

enum State<'a> {
    Pending,
    Indexed(roaring::bitmap::IntoIter),
    Scanning(NodeStream<'a>),
    Failed(PathError),
    Done,
}

/// Iterator over the terminals of a [`BoundPath`], without duplicates.
pub struct Terminals<'a, 'g, G: Graph + ?Sized> {
    bound: &'a BoundPath<'g, G>,
    state: State<'a>,
    seen: NodeSet,
}

impl<'a, 'g, G: Graph + ?Sized> Terminals<'a, 'g, G> {
    fn start(&self) -> State<'a> {
        let bound = self.bound;
        tracing::trace!(
            step = %bound.step,
            population = bound.population.len(),
            "evaluating bound path"
        );
        match bound.evaluator.terminals(&bound.step, &bound.population) {
            Ok(Some(terminals)) => State::Indexed(terminals.into_iter()),
            Ok(None) => {
                match bound
                    .evaluator
                    .check_scan(&bound.step, "terminals", &bound.population)
                {
                    Ok(()) => State::Scanning(bound.evaluator.filter_terminals(
                        &bound.step,
                        &bound.population,
                        &bound.population,
                    )),
                    Err(err) => State::Failed(err),
                }
            }
            Err(err) => State::Failed(err),
        }
    }
}

impl<'a, 'g, G: Graph + ?Sized> Iterator for Terminals<'a, 'g, G> {
    type Item = Result<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Pending => self.state = self.start(),
                State::Indexed(nodes) => return nodes.next().map(Ok),
                State::Scanning(stream) => match stream.next() {
                    Some(Ok(node)) => {
                        if self.seen.insert(node) {
                            return Some(Ok(node));
                        }
                    }
                    Some(Err(err)) => {
                        self.state = State::Done;
                        return Some(Err(err));
                    }
                    None => {
                        self.state = State::Done;
                        return None;
                    }
                },
                State::Failed(_) => {
                    if let State::Failed(err) = std::mem::replace(&mut self.state, State::Done) {
                        return Some(Err(err));
                    }
                }
                State::Done => return None,
            }
        }
    }
}

//! Step evaluation: the four query primitives and the strategy fallback.
//!
//! Every step is read as a relation restricted to the population `P` on both
//! ends. Relative to `P`:
//!
//! - `initials(P)`: nodes with at least one successor,
//! - `terminals(P)`: nodes with at least one predecessor,
//! - `match(P, V)`: nodes with a successor in `V`,
//! - `values(P, S)`: successors of the nodes in `S`.
//!
//! `match`/`values` are always answered. `initials`/`terminals` are the
//! *efficient* primitives: a step may decline them (`Ok(None)`), and the
//! nearest enclosing operator then substitutes the brute-force form,
//! [`Evaluator::filter_initials`] / [`Evaluator::filter_terminals`] over the
//! whole population. Both strategies produce the same sets; the efficient one
//! just avoids the linear scan.

use oxrdf::NamedNodeRef;
use rayon::prelude::*;

use crate::bound::BoundPath;
use crate::config::EvalConfig;
use crate::error::{PathError, Result};
use crate::graph::{Graph, NodeId};
use crate::step::Step;
use crate::NodeSet;

/// Lazily produced nodes. May contain duplicates (see [`Step::Union`]).
pub type NodeStream<'a> = Box<dyn Iterator<Item = Result<NodeId>> + 'a>;

fn singleton(node: NodeId) -> NodeSet {
    let mut set = NodeSet::new();
    set.insert(node);
    set
}

/// Evaluates step trees against a graph collaborator.
pub struct Evaluator<'g, G: Graph + ?Sized> {
    graph: &'g G,
    config: EvalConfig,
}

impl<'g, G: Graph + ?Sized> Clone for Evaluator<'g, G> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph,
            config: self.config.clone(),
        }
    }
}

impl<'g, G: Graph + ?Sized> Evaluator<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self::with_config(graph, EvalConfig::default())
    }

    pub fn with_config(graph: &'g G, config: EvalConfig) -> Self {
        Self { graph, config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn graph(&self) -> &'g G {
        self.graph
    }

    /// Bind `step` to `population` for lazy iteration of its terminals.
    pub fn bind(&self, population: NodeSet, step: Step) -> BoundPath<'g, G> {
        BoundPath::new(self.clone(), population, step)
    }

    fn lookup<T>(
        &self,
        step: &Step,
        primitive: &'static str,
        result: anyhow::Result<T>,
    ) -> Result<T> {
        result.map_err(|source| PathError::Graph {
            step: step.to_string(),
            primitive,
            source,
        })
    }

    // ========================================================================
    // Efficient primitives (may decline)
    // ========================================================================

    /// Domain of `step` within `population`, or `Ok(None)` if the step cannot
    /// answer without scanning the population.
    pub fn initials(&self, step: &Step, population: &NodeSet) -> Result<Option<NodeSet>> {
        if self.config.prefer_scan {
            return Ok(None);
        }
        let set = match step {
            Step::Arc(p) => self.arc_initials(step, p.as_ref(), population)?,
            Step::Class(c) => self.class_members(step, c.as_ref(), population)?,
            Step::Identity => population.clone(),
            Step::HasNo(_) | Step::ScanOnly(_) => return Ok(None),
            Step::Inverse(inner) => return self.terminals(inner, population),
            Step::Path { lhs, rhs } => {
                let seeds = self.initials_or_scan(lhs, population)?;
                self.r#match(rhs, population, &seeds)?
            }
            Step::Predicate { lhs, rhs } => {
                let condition = self.initials_or_scan(rhs, population)?;
                self.r#match(lhs, population, &condition)?
            }
            Step::Projection { lhs, rhs } => {
                let starts = self.initials_or_scan(rhs, population)?;
                self.restrict_to_initials(lhs, population, &starts)?
            }
            Step::Union { lhs, rhs } => {
                self.initials_or_scan(lhs, population)? | self.initials_or_scan(rhs, population)?
            }
            Step::Intersect { lhs, rhs } => {
                let candidates = self.initials_or_scan(lhs, population)?
                    & self.initials_or_scan(rhs, population)?;
                self.keep_with_values(step, population, &candidates)?
            }
        };
        Ok(Some(set))
    }

    /// Range of `step` within `population`, or `Ok(None)` if declined.
    pub fn terminals(&self, step: &Step, population: &NodeSet) -> Result<Option<NodeSet>> {
        if self.config.prefer_scan {
            return Ok(None);
        }
        let set = match step {
            Step::Arc(p) => self.arc_terminals(step, p.as_ref(), population)?,
            Step::Class(c) => self.class_members(step, c.as_ref(), population)?,
            Step::Identity => population.clone(),
            Step::HasNo(_) | Step::ScanOnly(_) => return Ok(None),
            Step::Inverse(inner) => return self.initials(inner, population),
            Step::Path { lhs, rhs } => {
                let reached = self.terminals_or_scan(rhs, population)?;
                self.values(lhs, population, &reached)?
            }
            Step::Predicate { lhs, rhs } => {
                return self.predicate_terminals(lhs, rhs, population).map(Some)
            }
            Step::Projection { lhs, rhs } => {
                let starts = self.initials_or_scan(lhs, population)?;
                self.values(rhs, population, &starts)?
            }
            Step::Union { lhs, rhs } => {
                self.terminals_or_scan(lhs, population)?
                    | self.terminals_or_scan(rhs, population)?
            }
            Step::Intersect { lhs, rhs } => {
                let candidates = self.terminals_or_scan(lhs, population)?
                    & self.terminals_or_scan(rhs, population)?;
                self.keep_with_matches(step, population, &candidates)?
            }
        };
        Ok(Some(set))
    }

    // ========================================================================
    // Total primitives
    // ========================================================================

    /// Nodes of `population` with a successor in `values`.
    pub fn r#match(
        &self,
        step: &Step,
        population: &NodeSet,
        values: &NodeSet,
    ) -> Result<NodeSet> {
        let values = values & population;
        match step {
            Step::Arc(p) => {
                let mut out = NodeSet::new();
                for object in &values {
                    let subjects = self.graph.subjects_of(p.as_ref(), object);
                    out |= self.lookup(step, "match", subjects)?;
                }
                Ok(out & population)
            }
            Step::Class(_) | Step::Identity | Step::HasNo(_) => self.node_test(step, values),
            Step::Inverse(inner) => self.values(inner, population, &values),
            Step::ScanOnly(inner) => self.r#match(inner, population, &values),
            Step::Path { lhs, rhs } => {
                let middle = self.r#match(lhs, population, &values)?;
                self.r#match(rhs, population, &middle)
            }
            Step::Predicate { lhs, rhs } => {
                let kept = self.restrict_to_initials(rhs, population, &values)?;
                self.r#match(lhs, population, &kept)
            }
            Step::Projection { lhs, rhs } => {
                let subjects = self.r#match(rhs, population, &values)?;
                self.restrict_to_initials(lhs, population, &subjects)
            }
            Step::Union { lhs, rhs } => Ok(self.r#match(lhs, population, &values)?
                | self.r#match(rhs, population, &values)?),
            Step::Intersect { lhs, rhs } => {
                let candidates = self.r#match(lhs, population, &values)?
                    & self.r#match(rhs, population, &values)?;
                if values.len() <= 1 {
                    return Ok(candidates);
                }
                // A subject may reach `values` through different nodes on each side.
                let mut out = NodeSet::new();
                for subject in &candidates {
                    if !(self.values(step, population, &singleton(subject))? & &values).is_empty() {
                        out.insert(subject);
                    }
                }
                Ok(out)
            }
        }
    }

    /// Successors within `population` of the nodes in `subjects`.
    pub fn values(
        &self,
        step: &Step,
        population: &NodeSet,
        subjects: &NodeSet,
    ) -> Result<NodeSet> {
        let subjects = subjects & population;
        match step {
            Step::Arc(p) => {
                let mut out = NodeSet::new();
                for subject in &subjects {
                    let objects = self.graph.objects_of(subject, p.as_ref());
                    out |= self.lookup(step, "values", objects)?;
                }
                Ok(out & population)
            }
            Step::Class(_) | Step::Identity | Step::HasNo(_) => self.node_test(step, subjects),
            Step::Inverse(inner) => self.r#match(inner, population, &subjects),
            Step::ScanOnly(inner) => self.values(inner, population, &subjects),
            Step::Path { lhs, rhs } => {
                let middle = self.values(rhs, population, &subjects)?;
                self.values(lhs, population, &middle)
            }
            Step::Predicate { lhs, rhs } => {
                let reached = self.values(lhs, population, &subjects)?;
                self.restrict_to_initials(rhs, population, &reached)
            }
            Step::Projection { lhs, rhs } => {
                let starts = self.restrict_to_initials(lhs, population, &subjects)?;
                self.values(rhs, population, &starts)
            }
            Step::Union { lhs, rhs } => Ok(self.values(lhs, population, &subjects)?
                | self.values(rhs, population, &subjects)?),
            Step::Intersect { lhs, rhs } => {
                if subjects.len() <= 1 {
                    return Ok(self.values(lhs, population, &subjects)?
                        & self.values(rhs, population, &subjects)?);
                }
                let mut out = NodeSet::new();
                for subject in &subjects {
                    out |= self.values(step, population, &singleton(subject))?;
                }
                Ok(out)
            }
        }
    }

    // ========================================================================
    // Brute-force primitives
    // ========================================================================

    /// The nodes of `candidates` (within `population`) that are initials of
    /// `step`, decided one node at a time.
    pub fn filter_initials<'a>(
        &'a self,
        step: &'a Step,
        population: &'a NodeSet,
        candidates: &'a NodeSet,
    ) -> NodeStream<'a>
    where
        'g: 'a,
        G: 'a,
    {
        match step {
            Step::Union { lhs, rhs } => Box::new(
                self.filter_initials(lhs, population, candidates)
                    .chain(self.filter_initials(rhs, population, candidates)),
            ),
            Step::Inverse(inner) => self.filter_terminals(inner, population, candidates),
            Step::ScanOnly(inner) => self.filter_initials(inner, population, candidates),
            _ => Box::new(
                candidates
                    .iter()
                    .filter(move |node| population.contains(*node))
                    .filter_map(move |node| {
                        match self.values(step, population, &singleton(node)) {
                            Ok(image) if image.is_empty() => None,
                            Ok(_) => Some(Ok(node)),
                            Err(err) => Some(Err(err)),
                        }
                    }),
            ),
        }
    }

    /// The nodes of `candidates` (within `population`) that are terminals of
    /// `step`, decided one node at a time.
    pub fn filter_terminals<'a>(
        &'a self,
        step: &'a Step,
        population: &'a NodeSet,
        candidates: &'a NodeSet,
    ) -> NodeStream<'a>
    where
        'g: 'a,
        G: 'a,
    {
        match step {
            Step::Union { lhs, rhs } => Box::new(
                self.filter_terminals(lhs, population, candidates)
                    .chain(self.filter_terminals(rhs, population, candidates)),
            ),
            Step::Inverse(inner) => self.filter_initials(inner, population, candidates),
            Step::ScanOnly(inner) => self.filter_terminals(inner, population, candidates),
            _ => Box::new(
                candidates
                    .iter()
                    .filter(move |node| population.contains(*node))
                    .filter_map(move |node| {
                        match self.r#match(step, population, &singleton(node)) {
                            Ok(preimage) if preimage.is_empty() => None,
                            Ok(_) => Some(Ok(node)),
                            Err(err) => Some(Err(err)),
                        }
                    }),
            ),
        }
    }

    // ========================================================================
    // Strategy fallback
    // ========================================================================

    /// `initials`, falling back to a population scan if the step declines.
    pub fn initials_or_scan(&self, step: &Step, population: &NodeSet) -> Result<NodeSet> {
        if let Some(set) = self.initials(step, population)? {
            return Ok(set);
        }
        self.check_scan(step, "initials", population)?;
        self.filter_initials(step, population, population).collect()
    }

    /// `terminals`, falling back to a population scan if the step declines.
    pub fn terminals_or_scan(&self, step: &Step, population: &NodeSet) -> Result<NodeSet> {
        if let Some(set) = self.terminals(step, population)? {
            return Ok(set);
        }
        self.check_scan(step, "terminals", population)?;
        self.filter_terminals(step, population, population).collect()
    }

    /// Log a fallback scan over `scanned` and enforce the scan limit.
    pub(crate) fn check_scan(
        &self,
        step: &Step,
        primitive: &'static str,
        scanned: &NodeSet,
    ) -> Result<()> {
        tracing::debug!(
            step = %step,
            primitive,
            population = scanned.len(),
            "efficient strategy unavailable, scanning population"
        );
        match self.config.scan_limit {
            Some(limit) if scanned.len() > limit => Err(PathError::ScanLimitExceeded {
                step: step.to_string(),
                population: scanned.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// `candidates` reduced to the initials of `step`, asking for the
    /// initials directly first and testing node by node only if declined.
    fn restrict_to_initials(
        &self,
        step: &Step,
        population: &NodeSet,
        candidates: &NodeSet,
    ) -> Result<NodeSet> {
        match self.initials(step, population)? {
            Some(initials) => Ok(candidates & &initials),
            None => {
                self.check_scan(step, "initials", candidates)?;
                self.filter_initials(step, population, candidates).collect()
            }
        }
    }

    fn predicate_terminals(
        &self,
        lhs: &Step,
        rhs: &Step,
        population: &NodeSet,
    ) -> Result<NodeSet> {
        if let Some(reached) = self.terminals(lhs, population)? {
            return self.restrict_to_initials(rhs, population, &reached);
        }
        match self.initials(rhs, population)? {
            Some(condition) => {
                self.check_scan(lhs, "terminals", &condition)?;
                self.filter_terminals(lhs, population, &condition).collect()
            }
            None => {
                self.check_scan(lhs, "terminals", population)?;
                let reached: NodeSet = self
                    .filter_terminals(lhs, population, population)
                    .collect::<Result<_>>()?;
                self.check_scan(rhs, "initials", &reached)?;
                self.filter_initials(rhs, population, &reached).collect()
            }
        }
    }

    // ========================================================================
    // Atomic helpers
    // ========================================================================

    fn arc_initials(
        &self,
        step: &Step,
        p: NamedNodeRef<'_>,
        population: &NodeSet,
    ) -> Result<NodeSet> {
        let subjects = self.lookup(step, "initials", self.graph.all_subjects_with(p))? & population;
        let objects = self.lookup(step, "initials", self.graph.all_objects_of(p))?;
        if objects.is_subset(population) {
            return Ok(subjects);
        }
        // Some arcs leave the population: only subjects with an object inside count.
        let mut out = NodeSet::new();
        for subject in &subjects {
            let reached = self.lookup(step, "initials", self.graph.objects_of(subject, p))?;
            if !reached.is_disjoint(population) {
                out.insert(subject);
            }
        }
        Ok(out)
    }

    fn arc_terminals(
        &self,
        step: &Step,
        p: NamedNodeRef<'_>,
        population: &NodeSet,
    ) -> Result<NodeSet> {
        let objects = self.lookup(step, "terminals", self.graph.all_objects_of(p))? & population;
        let subjects = self.lookup(step, "terminals", self.graph.all_subjects_with(p))?;
        if subjects.is_subset(population) {
            return Ok(objects);
        }
        let mut out = NodeSet::new();
        for object in &objects {
            let origins = self.lookup(step, "terminals", self.graph.subjects_of(p, object))?;
            if !origins.is_disjoint(population) {
                out.insert(object);
            }
        }
        Ok(out)
    }

    fn class_members(
        &self,
        step: &Step,
        class: NamedNodeRef<'_>,
        population: &NodeSet,
    ) -> Result<NodeSet> {
        let members = self.graph.all_members_of_class(class);
        Ok(self.lookup(step, "members", members)? & population)
    }

    /// Identity-relation steps: keep the nodes of `nodes` passing the test.
    fn node_test(&self, step: &Step, mut nodes: NodeSet) -> Result<NodeSet> {
        match step {
            Step::Class(class) => {
                let mut rejected = NodeSet::new();
                for node in &nodes {
                    let member = self.graph.is_member_of_class(node, class.as_ref());
                    if !self.lookup(step, "member", member)? {
                        rejected.insert(node);
                    }
                }
                nodes -= rejected;
            }
            Step::HasNo(p) => {
                let mut rejected = NodeSet::new();
                for node in &nodes {
                    let objects = self.graph.objects_of(node, p.as_ref());
                    if !self.lookup(step, "has-no", objects)?.is_empty() {
                        rejected.insert(node);
                    }
                }
                nodes -= rejected;
            }
            _ => {}
        }
        Ok(nodes)
    }

    fn keep_with_values(
        &self,
        step: &Step,
        population: &NodeSet,
        candidates: &NodeSet,
    ) -> Result<NodeSet> {
        let mut out = NodeSet::new();
        for node in candidates {
            if !self.values(step, population, &singleton(node))?.is_empty() {
                out.insert(node);
            }
        }
        Ok(out)
    }

    fn keep_with_matches(
        &self,
        step: &Step,
        population: &NodeSet,
        candidates: &NodeSet,
    ) -> Result<NodeSet> {
        let mut out = NodeSet::new();
        for node in candidates {
            if !self.r#match(step, population, &singleton(node))?.is_empty() {
                out.insert(node);
            }
        }
        Ok(out)
    }
}

impl<'g, G: Graph + Sync + ?Sized> Evaluator<'g, G> {
    /// Terminals of each step against the same population, evaluated in
    /// parallel. Results keep the order of `steps`.
    pub fn terminals_batch(&self, population: &NodeSet, steps: &[Step]) -> Vec<Result<NodeSet>> {
        steps
            .par_iter()
            .map(|step| self.terminals_or_scan(step, population))
            .collect()
    }
}

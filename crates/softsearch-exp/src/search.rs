use serde::{Deserialize, Serialize};
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{Candidate, Compiler, Component, RngHandle, SoftwareChoice};

use crate::product::CartesianProduct;

/// One point of the search space: a compiler and one choice per dependency group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPoint {
    pub compiler: Compiler,
    pub dependencies: Vec<SoftwareChoice>,
}

/// Capability shared by every search strategy.
///
/// Strategies are configured through the setters before [`iterate`] is
/// called; iterating an unconfigured strategy is a precondition error.
///
/// [`iterate`]: SearchStrategy::iterate
pub trait SearchStrategy {
    fn set_component(&mut self, component: Component);
    fn set_compiler_space(&mut self, compilers: Vec<Compiler>);
    fn set_dependency_space(&mut self, groups: Vec<Vec<Candidate>>);
    /// Records a measurement for the most recent point. Reserved for adaptive
    /// strategies; the provided strategies ignore it when ordering points.
    fn observe_feedback(&mut self, value: f64);
    /// Starts a fresh traversal of the configured space.
    fn iterate(&self) -> Result<Box<dyn Iterator<Item = SearchPoint> + '_>, SwsError>;
}

#[derive(Debug, Clone, Default)]
struct SearchSpace {
    component: Option<Component>,
    compilers: Option<Vec<Compiler>>,
    groups: Option<Vec<Vec<SoftwareChoice>>>,
    feedback: Vec<f64>,
}

impl SearchSpace {
    fn configured(&self) -> Result<(&[Compiler], &[Vec<SoftwareChoice>]), SwsError> {
        match (&self.compilers, &self.groups) {
            (Some(compilers), Some(groups)) => Ok((compilers.as_slice(), groups.as_slice())),
            (compilers, _) => Err(SwsError::Search(
                ErrorInfo::new(
                    "search-unconfigured",
                    "search strategy iterated before its space was set",
                )
                .with_context(
                    "missing",
                    if compilers.is_none() {
                        "compiler space"
                    } else {
                        "dependency space"
                    },
                ),
            )),
        }
    }

    fn points(&self) -> Result<impl Iterator<Item = SearchPoint> + '_, SwsError> {
        let (compilers, groups) = self.configured()?;
        let mut lists = vec![(0..compilers.len()).collect::<Vec<_>>()];
        lists.extend(groups.iter().map(|group| (0..group.len()).collect()));
        Ok(CartesianProduct::new(lists).map(move |tuple| SearchPoint {
            compiler: compilers[tuple[0]].clone(),
            dependencies: tuple[1..]
                .iter()
                .zip(groups)
                .map(|(&idx, group)| group[idx].clone())
                .collect(),
        }))
    }

    fn set_groups(&mut self, groups: Vec<Vec<Candidate>>) {
        self.groups = Some(groups.iter().map(|group| Candidate::flatten(group)).collect());
    }
}

/// Walks the whole space lazily in lexicographic order.
#[derive(Debug, Clone, Default)]
pub struct Exhaustive {
    space: SearchSpace,
}

impl Exhaustive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component(&self) -> Option<&Component> {
        self.space.component.as_ref()
    }

    pub fn feedback(&self) -> &[f64] {
        &self.space.feedback
    }
}

impl SearchStrategy for Exhaustive {
    fn set_component(&mut self, component: Component) {
        self.space.component = Some(component);
    }

    fn set_compiler_space(&mut self, compilers: Vec<Compiler>) {
        self.space.compilers = Some(compilers);
    }

    fn set_dependency_space(&mut self, groups: Vec<Vec<Candidate>>) {
        self.space.set_groups(groups);
    }

    fn observe_feedback(&mut self, value: f64) {
        self.space.feedback.push(value);
    }

    fn iterate(&self) -> Result<Box<dyn Iterator<Item = SearchPoint> + '_>, SwsError> {
        Ok(Box::new(self.space.points()?))
    }
}

/// Shuffles the materialized space with a seeded RNG and yields at most
/// `max_iterations` points. Every traversal replays the same permutation.
#[derive(Debug, Clone)]
pub struct BoundedRandom {
    space: SearchSpace,
    max_iterations: usize,
    seed: u64,
}

impl BoundedRandom {
    pub fn new(max_iterations: usize, seed: u64) -> Self {
        Self {
            space: SearchSpace::default(),
            max_iterations,
            seed,
        }
    }

    pub fn component(&self) -> Option<&Component> {
        self.space.component.as_ref()
    }

    pub fn feedback(&self) -> &[f64] {
        &self.space.feedback
    }
}

impl SearchStrategy for BoundedRandom {
    fn set_component(&mut self, component: Component) {
        self.space.component = Some(component);
    }

    fn set_compiler_space(&mut self, compilers: Vec<Compiler>) {
        self.space.compilers = Some(compilers);
    }

    fn set_dependency_space(&mut self, groups: Vec<Vec<Candidate>>) {
        self.space.set_groups(groups);
    }

    fn observe_feedback(&mut self, value: f64) {
        self.space.feedback.push(value);
    }

    // TODO: switch to reservoir sampling once spaces are too large to materialize.
    fn iterate(&self) -> Result<Box<dyn Iterator<Item = SearchPoint> + '_>, SwsError> {
        let points: Vec<SearchPoint> = self.space.points()?.collect();
        let sampled = RngHandle::from_seed(self.seed).sample(points, self.max_iterations);
        Ok(Box::new(sampled.into_iter()))
    }
}

//! Parent selection and non-dominated sorting.

mod nondominated;
mod proportional;
mod tournament;

pub use nondominated::{HierarchicalSorter, SorterStats};
pub use proportional::ProportionalSelector;
pub use tournament::TournamentSelector;

use crate::core::Individual;
use rand::Rng;

/// Selection operator over a prepared population.
///
/// [`prepare`](Selector::prepare) captures whatever per-population state
/// the scheme needs; [`select`](Selector::select) then draws parent
/// indices without touching the population again.
pub trait Selector {
    fn prepare(&mut self, population: &[Individual]);

    /// Draws the index of one parent.
    ///
    /// # Panics
    /// Panics if [`prepare`](Selector::prepare) has not been called with a
    /// non-empty population.
    fn select<R: Rng>(&self, rng: &mut R) -> usize;
}

//! Stochastic ant construction
//!
//! One ant builds one candidate item selection by repeated roulette-wheel
//! draws over the remaining candidate pool. Selection probability combines
//! pheromone (weighted by alpha) with the value-per-unit-weight heuristic
//! (weighted by beta). Construction stops the first time the drawn item
//! would overflow the capacity; it does not scan on for a smaller item.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::problem::ItemCatalogue;

/// One candidate selection produced by a single ant.
///
/// `items` keeps construction order; `value` is the sum of the chosen
/// items' values. The total weight never exceeds the catalogue capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntSolution {
    /// Chosen item indices in the order they were drawn
    pub items: Vec<usize>,
    /// Accumulated value of the chosen items
    pub value: u32,
}

/// Build one feasible selection.
///
/// Preconditions (enforced by [`ItemCatalogue::validate`], not here):
/// the catalogue is non-empty with positive weights, and
/// `pheromone.len() == catalogue.len()`.
///
/// An ant may legally choose zero items when its very first draw already
/// exceeds the capacity.
pub fn construct<R: Rng + ?Sized>(
    catalogue: &ItemCatalogue,
    pheromone: &[f64],
    alpha: f64,
    beta: f64,
    rng: &mut R,
) -> AntSolution {
    debug_assert_eq!(pheromone.len(), catalogue.len());

    let mut pool: Vec<usize> = (0..catalogue.len()).collect();
    let mut chosen = Vec::new();
    let mut current_weight: u64 = 0;
    let mut current_value: u32 = 0;
    let mut desirability = Vec::with_capacity(pool.len());

    while !pool.is_empty() {
        desirability.clear();
        for &i in &pool {
            let ratio = f64::from(catalogue.values[i]) / f64::from(catalogue.weights[i]);
            desirability.push(pheromone[i].powf(alpha) * ratio.powf(beta));
        }
        let total: f64 = desirability.iter().sum();

        // Roulette wheel: first pool entry whose cumulative share reaches r.
        let r = rng.gen::<f64>();
        let mut cumulative = 0.0;
        let mut selected_pos = pool.len() - 1;
        for (pos, d) in desirability.iter().enumerate() {
            cumulative += d / total;
            if cumulative >= r {
                selected_pos = pos;
                break;
            }
        }
        let selected = pool[selected_pos];

        if current_weight + u64::from(catalogue.weights[selected]) <= u64::from(catalogue.capacity)
        {
            chosen.push(selected);
            current_weight += u64::from(catalogue.weights[selected]);
            current_value += catalogue.values[selected];
            // Ordered removal: the cumulative distribution is built in pool
            // order, so the pool must keep its relative order between draws.
            pool.remove(selected_pos);
        } else {
            // Premature termination is the policy: the drawn item did not
            // fit, so the ant is done even if smaller items remain.
            break;
        }
    }

    AntSolution {
        items: chosen,
        value: current_value,
    }
}

//! Pheromone evaporation and reinforcement
//!
//! Applied by the coordinator once per round, after every worker's results
//! have arrived. The round barrier guarantees no ant construction reads the
//! vector while it is being rewritten.

/// Evaporate and reinforce the pheromone vector in place.
///
/// Every entry decays by `1 - rho` regardless of use. Reinforcement adds
/// `q / sum_values` to every item each ant chose, where `sum_values` is the
/// round's single shared normalizer (the sum of all ants' values). When the
/// whole round came back empty (`sum_values == 0`) the reinforcement term is
/// undefined and is skipped; evaporation still applies, so entries stay
/// strictly positive either way.
pub fn update(pheromone: &mut [f64], rho: f64, q: f64, all_values: &[u32], all_item_sets: &[Vec<usize>]) {
    for entry in pheromone.iter_mut() {
        *entry *= 1.0 - rho;
    }

    let sum_values: f64 = all_values.iter().map(|&v| f64::from(v)).sum();
    if sum_values == 0.0 {
        return;
    }
    let deposit = q / sum_values;
    for items in all_item_sets {
        for &index in items {
            pheromone[index] += deposit;
        }
    }
}

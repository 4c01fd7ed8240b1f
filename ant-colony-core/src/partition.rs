//! Ant-per-worker round schedule

/// Split `max_ants` across `num_workers` workers.
///
/// Even split with the remainder handed out one ant each to the first
/// `max_ants % num_workers` workers; entries differ by at most one and sum
/// exactly to `max_ants`.
pub fn ants_per_worker(max_ants: usize, num_workers: usize) -> Vec<usize> {
    debug_assert!(num_workers > 0);
    let base = max_ants / num_workers;
    let mut shares = vec![base; num_workers];
    for share in shares.iter_mut().take(max_ants % num_workers) {
        *share += 1;
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_sums_and_balances() {
        for max_ants in 0..40 {
            for num_workers in 1..10 {
                let shares = ants_per_worker(max_ants, num_workers);
                assert_eq!(shares.len(), num_workers);
                assert_eq!(shares.iter().sum::<usize>(), max_ants);
                let max = *shares.iter().max().unwrap();
                let min = *shares.iter().min().unwrap();
                assert!(max - min <= 1);
            }
        }
    }

    #[test]
    fn remainder_goes_to_the_first_workers() {
        assert_eq!(ants_per_worker(20, 3), vec![7, 7, 6]);
        assert_eq!(ants_per_worker(10, 4), vec![3, 3, 2, 2]);
        assert_eq!(ants_per_worker(5, 5), vec![1, 1, 1, 1, 1]);
    }
}

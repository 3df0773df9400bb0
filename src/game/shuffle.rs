use rand::seq::SliceRandom;

/// Source of the initial layout of pieces, cards and words
pub trait Shuffler: Send + Sync {
    /// A permutation of `0..len`
    fn permutation(&self, len: usize) -> Vec<usize>;
}

/// Uniform Fisher-Yates shuffle over the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShuffler;

impl Shuffler for RandomShuffler {
    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rand::rng());
        order
    }
}

/// Deterministic layouts for tests and demos.
///
/// Returns the configured order when it is a permutation of the requested
/// length and the identity order otherwise.
#[derive(Debug, Default, Clone)]
pub struct FixedShuffler {
    order: Vec<usize>,
}

impl FixedShuffler {
    pub fn new(order: Vec<usize>) -> Self {
        Self { order }
    }

    pub fn identity() -> Self {
        Self::default()
    }
}

impl Shuffler for FixedShuffler {
    fn permutation(&self, len: usize) -> Vec<usize> {
        if is_permutation(&self.order, len) {
            self.order.clone()
        } else {
            (0..len).collect()
        }
    }
}

pub(crate) fn arrange<T: Clone>(items: &[T], order: &[usize]) -> Vec<T> {
    order.iter().filter_map(|&i| items.get(i).cloned()).collect()
}

fn is_permutation(order: &[usize], len: usize) -> bool {
    if order.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    order.iter().all(|&i| i < len && !std::mem::replace(&mut seen[i], true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_shuffle_is_a_permutation() {
        let mut order = RandomShuffler.permutation(16);
        order.sort();
        assert_eq!(order, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn random_shuffle_reaches_every_permutation() {
        let seen: HashSet<Vec<usize>> = (0..2000).map(|_| RandomShuffler.permutation(3)).collect();
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn fixed_shuffler_falls_back_to_identity() {
        let shuffler = FixedShuffler::new(vec![2, 0, 1]);
        assert_eq!(shuffler.permutation(3), vec![2, 0, 1]);
        assert_eq!(shuffler.permutation(4), vec![0, 1, 2, 3]);
        assert_eq!(FixedShuffler::new(vec![0, 0, 1]).permutation(3), vec![0, 1, 2]);
    }

    #[test]
    fn arrange_follows_order() {
        assert_eq!(arrange(&['a', 'b', 'c'], &[2, 0, 1]), vec!['c', 'a', 'b']);
    }
}

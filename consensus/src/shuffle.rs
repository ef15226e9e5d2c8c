//! Deterministic shuffle for producer schedule assembly.
//!
//! Every node seeds from the same head-block time, so all nodes derive the
//! identical permutation without exchanging any randomness.

use helix_types::AccountName;

/// xorshift64* generator. Not cryptographic; only cross-node agreement
/// matters here.
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            // xorshift has a fixed point at zero.
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle(&mut self, names: &mut [AccountName]) {
        for i in (1..names.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            names.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<AccountName> {
        (0..n)
            .map(|i| AccountName::new(format!("producer{i:03}")))
            .collect()
    }

    #[test]
    fn same_seed_same_permutation() {
        let mut a = names(60);
        let mut b = names(60);
        DeterministicRng::from_seed(12345).shuffle(&mut a);
        DeterministicRng::from_seed(12345).shuffle(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seed_different_permutation() {
        let mut a = names(60);
        let mut b = names(60);
        DeterministicRng::from_seed(1).shuffle(&mut a);
        DeterministicRng::from_seed(2).shuffle(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let original = names(20);
        let mut shuffled = original.clone();
        DeterministicRng::from_seed(777).shuffle(&mut shuffled);
        let mut sorted = shuffled.clone();
        sorted.sort();
        let mut expected = original;
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn zero_seed_does_not_stall() {
        let mut rng = DeterministicRng::from_seed(0);
        assert_ne!(rng.next_u64(), rng.next_u64());
    }

    #[test]
    fn tiny_inputs_are_fine() {
        let mut empty: Vec<AccountName> = vec![];
        DeterministicRng::from_seed(5).shuffle(&mut empty);
        let mut one = names(1);
        DeterministicRng::from_seed(5).shuffle(&mut one);
        assert_eq!(one, names(1));
    }
}

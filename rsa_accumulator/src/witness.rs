//! Per-member witnesses. A member's witness is the accumulator over every other member, so the
//! membership check is one modular exponentiation. The whole mapping is rebuilt after a removal
//! with a divide-and-conquer pass that shares partial products between members.

use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{accumulator::Accumulator, hashing::hash_to_prime};
use digest::Digest;

/// Witness per member, keyed by the member's decimal rendering, together with the accumulator
/// value the witnesses were computed against. Every mutation of the accumulator patches or
/// rebuilds the mapping as one unit.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct WitnessList {
    pub value: BigUint,
    pub witnesses: BTreeMap<String, BigUint>,
}

impl WitnessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds every witness against the accumulator's current member set. The member range is
    /// split in half; each half's prime product is folded into the base carried by the other
    /// half before recursing, giving all `n` witnesses in `O(n log n)` exponentiations instead
    /// of the `O(n^2)` of computing each witness on its own. The fresh mapping is swapped in
    /// only once complete.
    pub fn precompute<D: Digest>(&mut self, accumulator: &Accumulator) {
        let primes = accumulator
            .members
            .iter()
            .map(|member| hash_to_prime::<D>(&member.to_bytes_be()))
            .collect::<Vec<_>>();
        let mut witnesses = BTreeMap::new();
        if !accumulator.members.is_empty() {
            debug!("precomputing witnesses for {} members", accumulator.members.len());
            Self::precompute_range(
                accumulator.generator.clone(),
                &accumulator.members,
                &primes,
                0,
                accumulator.members.len(),
                &accumulator.modulus,
                &mut witnesses,
            );
        }
        self.witnesses = witnesses;
        self.value = accumulator.value.clone();
    }

    /// `base` carries the accumulated primes of every member outside `lo..hi`. Each branch
    /// writes disjoint keys.
    fn precompute_range(
        base: BigUint,
        members: &[BigUint],
        primes: &[BigUint],
        lo: usize,
        hi: usize,
        modulus: &BigUint,
        witnesses: &mut BTreeMap<String, BigUint>,
    ) {
        if hi - lo == 1 {
            witnesses.insert(members[lo].to_string(), base);
            return;
        }
        let mid = lo + (hi - lo) / 2;
        let upper_product: BigUint = primes[mid..hi].iter().product();
        let lower_product: BigUint = primes[lo..mid].iter().product();
        Self::precompute_range(
            base.modpow(&upper_product, modulus),
            members,
            primes,
            lo,
            mid,
            modulus,
            witnesses,
        );
        Self::precompute_range(
            base.modpow(&lower_product, modulus),
            members,
            primes,
            mid,
            hi,
            modulus,
            witnesses,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::RsaKey;
    use blake2::Blake2b512;

    // witness for one member computed directly, folding in every other member's prime
    fn naive_witness(accumulator: &Accumulator, member: &BigUint) -> BigUint {
        let mut witness = accumulator.generator.clone();
        for other in &accumulator.members {
            if other != member {
                witness = witness.modpow(
                    &hash_to_prime::<Blake2b512>(&other.to_bytes_be()),
                    &accumulator.modulus,
                );
            }
        }
        witness
    }

    #[test]
    fn precompute_agrees_with_naive_computation() {
        let key = RsaKey::generate(512).unwrap();
        for n in [1usize, 2, 3, 7, 8] {
            let members = (0..n).map(|i| BigUint::from(1000 + i as u32)).collect();
            let accumulator = Accumulator::new::<Blake2b512>(&key, members);
            let mut witnesses = WitnessList::new();
            witnesses.precompute::<Blake2b512>(&accumulator);
            assert_eq!(witnesses.witnesses.len(), n);
            for member in &accumulator.members {
                assert_eq!(
                    witnesses.witnesses[&member.to_string()],
                    naive_witness(&accumulator, member)
                );
            }
        }
    }

    #[test]
    fn empty_set_has_no_witnesses() {
        let key = RsaKey::generate(512).unwrap();
        let accumulator = Accumulator::new::<Blake2b512>(&key, vec![]);
        let mut witnesses = WitnessList::new();
        witnesses.precompute::<Blake2b512>(&accumulator);
        assert!(witnesses.witnesses.is_empty());
        assert_eq!(witnesses.value, accumulator.value);
    }

    #[test]
    fn serialization() {
        let key = RsaKey::generate(512).unwrap();
        let accumulator =
            Accumulator::new::<Blake2b512>(&key, vec![BigUint::from(3u32), BigUint::from(4u32)]);
        let mut witnesses = WitnessList::new();
        witnesses.precompute::<Blake2b512>(&accumulator);
        let ser = serde_json::to_string(&witnesses).unwrap();
        let deser: WitnessList = serde_json::from_str(&ser).unwrap();
        assert_eq!(witnesses, deser);
    }
}

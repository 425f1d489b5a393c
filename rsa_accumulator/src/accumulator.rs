//! The accumulator itself: a single group element `G^(product of member primes) mod N`
//! together with the member set it commits to.

use log::debug;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    error::RsaAccumulatorError, hashing::hash_to_prime, setup::RsaKey, witness::WitnessList,
};
use digest::Digest;

/// Accumulator value over the current member set. One instance per revocation epoch; additions
/// and removals mutate it in place together with the member list.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Accumulator {
    pub value: BigUint,
    pub members: Vec<BigUint>,
    pub modulus: BigUint,
    pub generator: BigUint,
}

impl Accumulator {
    /// Accumulate `members` under `key`: `value = G^(product of Hprime(u)) mod N`
    pub fn new<D: Digest>(key: &RsaKey, members: Vec<BigUint>) -> Self {
        let mut value = key.generator.clone();
        for member in &members {
            value = value.modpow(&hash_to_prime::<D>(&member.to_bytes_be()), &key.modulus);
        }
        Self {
            value,
            members,
            modulus: key.modulus.clone(),
            generator: key.generator.clone(),
        }
    }

    /// Add `member` and patch `witnesses` in place: every stored witness is raised to the new
    /// member's prime and the pre-update accumulator value becomes the new member's witness.
    /// With no witnesses computed yet, a full precomputation runs instead. The new state is
    /// swapped in only once every exponentiation is done.
    pub fn add<D: Digest>(
        &mut self,
        member: BigUint,
        witnesses: &mut WitnessList,
    ) -> Result<(), RsaAccumulatorError> {
        if self.members.contains(&member) {
            return Err(RsaAccumulatorError::ElementPresent);
        }
        let exponent = hash_to_prime::<D>(&member.to_bytes_be());
        let previous = self.value.clone();
        let value = self.value.modpow(&exponent, &self.modulus);
        debug!("adding member to accumulator of {} members", self.members.len());

        if witnesses.witnesses.is_empty() {
            self.members.push(member);
            self.value = value;
            witnesses.precompute::<D>(self);
        } else {
            let mut updated = witnesses
                .witnesses
                .iter()
                .map(|(key, witness)| (key.clone(), witness.modpow(&exponent, &self.modulus)))
                .collect::<BTreeMap<_, _>>();
            updated.insert(member.to_string(), previous);
            self.members.push(member);
            self.value = value;
            witnesses.witnesses = updated;
            witnesses.value = self.value.clone();
        }
        Ok(())
    }

    /// Remove `member`. Its stored witness already excludes it, so that witness becomes the new
    /// accumulator value; every remaining witness is then rebuilt from scratch.
    pub fn remove<D: Digest>(
        &mut self,
        member: &BigUint,
        witnesses: &mut WitnessList,
    ) -> Result<(), RsaAccumulatorError> {
        let position = self
            .members
            .iter()
            .position(|m| m == member)
            .ok_or(RsaAccumulatorError::ElementAbsent)?;
        let witness = witnesses
            .witnesses
            .get(&member.to_string())
            .ok_or(RsaAccumulatorError::WitnessMissing)?
            .clone();
        debug!("removing member from accumulator of {} members", self.members.len());
        self.members.remove(position);
        self.value = witness;
        witnesses.precompute::<D>(self);
        Ok(())
    }

    pub fn verify_membership<D: Digest>(&self, member: &BigUint, witness: &BigUint) -> bool {
        verify::<D>(member, witness, &self.value, &self.modulus)
    }
}

/// Membership holds iff `witness^Hprime(member) mod N == accumulated`
pub fn verify<D: Digest>(
    member: &BigUint,
    witness: &BigUint,
    accumulated: &BigUint,
    modulus: &BigUint,
) -> bool {
    witness.modpow(&hash_to_prime::<D>(&member.to_bytes_be()), modulus) == *accumulated
}

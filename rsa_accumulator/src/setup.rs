//! Revocation-authority key generation.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::RsaAccumulatorError;

/// RSA modulus and a random quadratic-residue generator. The modulus factors are dropped right
/// after generation and never retained.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct RsaKey {
    pub modulus: BigUint,
    pub generator: BigUint,
}

impl RsaKey {
    /// Generates a modulus of roughly `bit_size` bits from two distinct primes and a generator
    /// `F^2 mod N` for a random `F` coprime to `N`
    pub fn generate(bit_size: usize) -> Result<Self, RsaAccumulatorError> {
        let mut rng = OsRng;
        let p = glass_pumpkin::prime::new(bit_size / 2)?;
        let mut q = glass_pumpkin::prime::new(bit_size / 2)?;
        while q == p {
            q = glass_pumpkin::prime::new(bit_size / 2)?;
        }
        let modulus = &p * &q;

        let f = loop {
            let f = rng.gen_biguint_below(&modulus);
            if !f.is_zero() && f.gcd(&modulus).is_one() {
                break f;
            }
        };
        let generator = f.modpow(&BigUint::from(2u32), &modulus);
        Ok(Self { modulus, generator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_generation() {
        let key = RsaKey::generate(512).unwrap();
        assert!(key.modulus.bits() >= 500);
        assert!(key.generator < key.modulus);
        assert!(key.generator.gcd(&key.modulus).is_one());

        let ser = serde_json::to_string(&key).unwrap();
        let deser: RsaKey = serde_json::from_str(&ser).unwrap();
        assert_eq!(key, deser);
    }
}

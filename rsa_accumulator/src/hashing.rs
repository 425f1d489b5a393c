//! Collision-resistant mapping from arbitrary bytes to primes. Prime exponents commute under
//! the group order, which is what makes witness maintenance and membership proofs sound.

use digest::Digest;
use num_bigint::BigUint;

/// Bit length of every hashed prime
pub const PRIME_BITS: u64 = 256;

/// Maps `bytes` to an odd probable prime. The digest output is truncated to [`PRIME_BITS`] with
/// the top bit forced, then stepped by 2 until the candidate passes the primality check, so the
/// result is deterministic for a given input.
pub fn hash_to_prime<D: Digest>(bytes: &[u8]) -> BigUint {
    let digest = D::digest(bytes);
    let truncated = &digest[..digest.len().min((PRIME_BITS / 8) as usize)];
    let mut candidate = BigUint::from_bytes_be(truncated);
    candidate.set_bit(PRIME_BITS - 1, true);
    candidate.set_bit(0, true);
    while !glass_pumpkin::prime::check(&candidate) {
        candidate += 2u32;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use blake2::Blake2b512;
    use num_bigint::BigUint;

    #[test]
    fn deterministic_primes() {
        let p1 = hash_to_prime::<Blake2b512>(b"some member");
        let p2 = hash_to_prime::<Blake2b512>(b"some member");
        let p3 = hash_to_prime::<Blake2b512>(b"another member");
        assert_eq!(p1, p2);
        assert_ne!(p1, p3);
        assert!(glass_pumpkin::prime::check(&p1));
        assert!(glass_pumpkin::prime::check(&p3));
        assert!(p1.bits() >= PRIME_BITS);
    }

    #[test]
    fn primes_from_numeric_members() {
        for i in 0u32..20 {
            let member = BigUint::from(1000u32 + i);
            let p = hash_to_prime::<Blake2b512>(&member.to_bytes_be());
            assert!(glass_pumpkin::prime::check(&p));
        }
    }
}

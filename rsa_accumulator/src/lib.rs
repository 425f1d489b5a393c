//! # Dynamic RSA accumulator
//!
//! Constant-size commitment to a set of revocation members under an RSA modulus. Each member
//! owns a witness proving its inclusion; witnesses survive additions with a single modular
//! exponentiation each and are rebuilt in `O(n log n)` exponentiations after a removal.
//!
//! ## Modules
//!
//! 1. Revocation-authority key generation - [`setup`]
//! 2. The accumulator with add/remove/verify - [`accumulator`]
//! 3. Per-member witness maintenance - [`witness`]
//! 4. Mapping arbitrary bytes to prime exponents - [`hashing`]
//!
//! Mutations rewrite the accumulator value and the whole witness mapping together, so an
//! accumulator and its witness list must be updated by one writer at a time; both methods take
//! mutable references to enforce this.
//!
//! [`setup`]: crate::setup
//! [`accumulator`]: crate::accumulator
//! [`witness`]: crate::witness
//! [`hashing`]: crate::hashing

pub mod accumulator;
pub mod error;
pub mod hashing;
pub mod setup;
pub mod witness;

pub mod prelude {
    pub use crate::{
        accumulator::{verify, Accumulator},
        error::RsaAccumulatorError,
        hashing::hash_to_prime,
        setup::RsaKey,
        witness::WitnessList,
    };
}

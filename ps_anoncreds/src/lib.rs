#![cfg_attr(not(feature = "std"), no_std)]
#![allow(non_snake_case)]

//! # Pointcheval-Sanders anonymous credentials
//!
//! Multi-attribute credentials built on PS signatures over a bilinear pairing, issued blindly
//! and presented with selective disclosure.
//!
//! ## Modules
//!
//! 1. Signature parameters and issuer/user key generation - [`setup`]
//! 2. Credential request, a commitment to the attributes with a proof of knowledge - [`request`]
//! 3. Blind signing of a request and unblinding - [`blind_signature`]
//! 4. The unblinded, long-lived credential - [`credential`]
//! 5. Per-presentation selective-disclosure credentials - [`derive`]
//! 6. Combining several derived credentials under a user key - [`aggregate`]
//!
//! The issuance flow is request -> blind sign -> unblind. Each presentation derives a fresh,
//! unlinkable credential from the unblinded one; any number of derived credentials can then be
//! aggregated into a single signature verifiable against the user's public key.
//!
//! The implementation tries to use the same variable names as the protocol description and thus
//! violates Rust's naming conventions at places.
//!
//! [`setup`]: crate::setup
//! [`request`]: crate::request
//! [`blind_signature`]: crate::blind_signature
//! [`credential`]: crate::credential
//! [`derive`]: crate::derive
//! [`aggregate`]: crate::aggregate

extern crate alloc;

pub mod aggregate;
pub mod blind_signature;
pub mod credential;
pub mod derive;
pub mod error;
pub mod request;
pub mod setup;

pub mod prelude {
    pub use crate::{
        aggregate::AggregateCredential,
        blind_signature::BlindSignature,
        credential::PrimaryCredential,
        derive::DeriveCredential,
        error::AnonCredError,
        request::CredentialRequest,
        setup::*,
    };
}

#[cfg(test)]
#[macro_use]
pub mod tests {
    #[macro_export]
    macro_rules! test_serialization {
        ($obj_type:ty, $obj: ident) => {
            // Test ark serialization
            let mut serz = vec![];
            CanonicalSerialize::serialize_compressed(&$obj, &mut serz).unwrap();
            let deserz: $obj_type =
                CanonicalDeserialize::deserialize_compressed(&serz[..]).unwrap();
            assert_eq!(deserz, $obj);

            let mut serz = vec![];
            $obj.serialize_uncompressed(&mut serz).unwrap();
            let deserz: $obj_type =
                CanonicalDeserialize::deserialize_uncompressed(&serz[..]).unwrap();
            assert_eq!(deserz, $obj);

            // Test JSON serialization
            let ser = serde_json::to_string(&$obj).unwrap();
            let deser = serde_json::from_str::<$obj_type>(&ser).unwrap();
            assert_eq!($obj, deser);

            // Test Message Pack serialization
            let ser = rmp_serde::to_vec_named(&$obj).unwrap();
            let deser = rmp_serde::from_slice::<$obj_type>(&ser).unwrap();
            assert_eq!($obj, deser);
        };
    }
}

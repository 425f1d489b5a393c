//! Issuer-side blind signing. The issuer signs the commitment carried by a verified credential
//! request without ever seeing the attribute values: its secret `x` enters homomorphically as
//! `g_tilde * x`. The user then strips its own blinding to obtain the long-lived
//! [`PrimaryCredential`].

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{rand::RngCore, UniformRand};
use dock_crypto_utils::serde_utils::ArkObjectBytes;
use log::trace;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    credential::PrimaryCredential,
    error::AnonCredError,
    request::CredentialRequest,
    setup::{IssuerSecretKey, SignatureParams},
};

/// Signature over a blinded commitment. Does not verify against the attribute values until the
/// user removes its blinding.
#[serde_as]
#[derive(
    Clone,
    PartialEq,
    Eq,
    Debug,
    CanonicalSerialize,
    CanonicalDeserialize,
    Serialize,
    Deserialize,
    Zeroize,
    ZeroizeOnDrop,
)]
pub struct BlindSignature<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub H: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub S: E::G2Affine,
}

impl<E: Pairing> BlindSignature<E> {
    /// Sign the commitment of `request` with fresh randomness `u`: `H = g_tilde * u`,
    /// `S = (C + g_tilde * x) * u`. The request's proof of knowledge must have been verified
    /// before calling this.
    pub fn new<R: RngCore>(
        rng: &mut R,
        request: &CredentialRequest<E>,
        secret_key: &IssuerSecretKey<E::ScalarField>,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        if request.commitment.is_zero() {
            return Err(AnonCredError::InvalidCredentialRequest);
        }
        let mut u = E::ScalarField::rand(rng);
        while u.is_zero() {
            u = E::ScalarField::rand(rng);
        }
        let H = params.g_tilde * u;
        let S = (params.g_tilde * secret_key.x + request.commitment) * u;
        let affine = E::G2::normalize_batch(&[H, S]);
        trace!("blind-signed a credential request");
        Ok(Self {
            H: affine[0],
            S: affine[1],
        })
    }

    /// Remove the blinding the user chose when building its credential request,
    /// yielding the reusable credential
    pub fn unblind(self, blinding: &E::ScalarField) -> PrimaryCredential<E> {
        let S = (self.S.into_group() - self.H * *blinding).into_affine();
        PrimaryCredential { H: self.H, S }
    }
}

//! Combining derived credentials under the user's key. Each member credential contributes a
//! hash of its canonical encoding weighted by one of the user's secret `w` scalars; the result
//! verifies with a single pairing equation against the user's public key, provided every member
//! still verifies on its own.

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{rand::RngCore, vec, vec::Vec, UniformRand};
use digest::Digest;
use dock_crypto_utils::{hashing_utils::field_elem_from_try_and_incr, serde_utils::ArkObjectBytes};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{
    derive::DeriveCredential,
    error::AnonCredError,
    setup::{IssuerPublicKey, SignatureParams, UserPublicKey, UserSecretKey},
};

/// One signature over a batch of derived credentials. Valid iff every member independently
/// verifies and the combined pairing equation holds.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct AggregateCredential<E: Pairing> {
    /// `g_tilde * k` for fresh `k`
    #[serde_as(as = "ArkObjectBytes")]
    pub sigma_1: E::G2Affine,
    /// `g_tilde * ((b + sum(w_i * h_i)) * k)` with `h_i` the hash of the i-th member
    #[serde_as(as = "ArkObjectBytes")]
    pub sigma_2: E::G2Affine,
    pub credentials: Vec<DeriveCredential<E>>,
}

impl<E: Pairing> AggregateCredential<E> {
    /// Combine `credentials` under the user's secret key. Every member is verified first and an
    /// invalid one aborts the aggregation.
    pub fn new<R: RngCore, D: Digest>(
        rng: &mut R,
        user_secret_key: &UserSecretKey<E::ScalarField>,
        ipk: &IssuerPublicKey<E>,
        credentials: Vec<DeriveCredential<E>>,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        if credentials.is_empty() {
            return Err(AnonCredError::NoCredentialGiven);
        }
        if credentials.len() > user_secret_key.supported_message_count() {
            return Err(AnonCredError::CredentialCountIncompatibleWithKey(
                credentials.len(),
                user_secret_key.supported_message_count(),
            ));
        }
        for credential in &credentials {
            credential.verify(ipk, params)?;
        }

        let mut k = E::ScalarField::rand(rng);
        while k.is_zero() {
            k = E::ScalarField::rand(rng);
        }
        let mut exponent = user_secret_key.b;
        for (credential, w) in credentials.iter().zip(&user_secret_key.w) {
            exponent += *w * credential_hash::<E, D>(credential)?;
        }
        let sigma = E::G2::normalize_batch(&[params.g_tilde * k, params.g_tilde * (exponent * k)]);
        trace!("aggregated {} derived credentials", credentials.len());
        Ok(Self {
            sigma_1: sigma[0],
            sigma_2: sigma[1],
            credentials,
        })
    }

    /// Check e(B + sum(W_i * h_i), sigma_1) == e(g, sigma_2) after re-verifying every member
    /// credential against the issuer key
    pub fn verify<D: Digest>(
        &self,
        upk: &UserPublicKey<E>,
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Result<(), AnonCredError> {
        if self.credentials.is_empty() {
            return Err(AnonCredError::NoCredentialGiven);
        }
        if self.credentials.len() > upk.supported_message_count() {
            return Err(AnonCredError::CredentialCountIncompatibleWithKey(
                self.credentials.len(),
                upk.supported_message_count(),
            ));
        }
        if self.sigma_1.is_zero() || self.sigma_2.is_zero() {
            return Err(AnonCredError::ZeroSignature);
        }
        for credential in &self.credentials {
            credential.verify(ipk, params)?;
        }

        let hashes = self
            .credentials
            .iter()
            .map(credential_hash::<E, D>)
            .collect::<Result<Vec<_>, _>>()?;
        let composite = upk.B.into_group()
            + E::G1::msm_unchecked(&upk.W[..hashes.len()], &hashes);
        if !E::multi_pairing(
            [
                E::G1Prepared::from(composite),
                E::G1Prepared::from(-params.g.into_group()),
            ],
            [
                E::G2Prepared::from(self.sigma_1),
                E::G2Prepared::from(self.sigma_2),
            ],
        )
        .is_zero()
        {
            return Err(AnonCredError::AggregatePairingCheckFailed);
        }
        Ok(())
    }
}

/// Hash of a member credential's canonical encoding, its contribution to the aggregate exponent
fn credential_hash<E: Pairing, D: Digest>(
    credential: &DeriveCredential<E>,
) -> Result<E::ScalarField, AnonCredError> {
    let mut bytes = vec![];
    credential.serialize_compressed(&mut bytes)?;
    Ok(field_elem_from_try_and_incr::<E::ScalarField, D>(&bytes))
}

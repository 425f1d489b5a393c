//! Credential request, the first message of the issuance protocol. The user commits to its
//! attribute vector under a fresh blinding and proves knowledge of the committed values with a
//! Schnorr proof made non-interactive via Fiat-Shamir. The issuer checks the proof before blind
//! signing; the challenge binds the issuer key's hash so a request cannot be replayed against a
//! different key.

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{rand::RngCore, vec::Vec, UniformRand};
use core::iter::once;
use digest::Digest;
use dock_crypto_utils::{expect_equality, misc::n_rand, serde_utils::ArkObjectBytes};
use log::trace;
use schnorr_pok::{compute_random_oracle_challenge, SchnorrCommitment, SchnorrResponse};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{
    error::AnonCredError,
    setup::{IssuerPublicKey, SignatureParams},
};

const CRED_REQUEST_LABEL: &[u8] = b"credential-request";

/// Commitment to the attribute vector plus a proof of knowledge of the committed values.
/// Single use, one per issuance session.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct CredentialRequest<E: Pairing> {
    /// `C = g_tilde * d + sum(Y_tilde_i * m_i)` for blinding `d`
    #[serde_as(as = "ArkObjectBytes")]
    pub commitment: E::G2Affine,
    /// Commitment to the proof randomness, step 1 of the Schnorr protocol
    #[serde_as(as = "ArkObjectBytes")]
    pub t: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub challenge: E::ScalarField,
    /// Responses for `d` followed by one per attribute
    pub response: SchnorrResponse<E::G2Affine>,
}

impl<E: Pairing> CredentialRequest<E> {
    /// Commit to `messages` and prove knowledge of them and of the blinding. Returns the
    /// request and the blinding, which the user needs again to unblind the signature.
    pub fn new<R: RngCore, D: Digest>(
        rng: &mut R,
        messages: &[E::ScalarField],
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Result<(Self, E::ScalarField), AnonCredError> {
        if messages.is_empty() {
            return Err(AnonCredError::NoMessageGiven);
        }
        expect_equality!(
            messages.len(),
            ipk.supported_message_count(),
            AnonCredError::MessageCountIncompatibleWithKey
        );
        let blinding = E::ScalarField::rand(rng);
        let bases = Self::commitment_bases(ipk, params);
        let witnesses = once(blinding)
            .chain(messages.iter().copied())
            .collect::<Vec<_>>();
        let commitment = E::G2::msm_unchecked(&bases, &witnesses).into_affine();

        let sc = SchnorrCommitment::new(&bases, n_rand(rng, bases.len()).collect());
        let challenge = Self::compute_challenge::<D>(&commitment, &sc.t, &ipk.hash, params)?;
        let response = sc.response(&witnesses, &challenge)?;
        trace!("created credential request over {} messages", messages.len());
        Ok((
            Self {
                commitment,
                t: sc.t,
                challenge,
                response,
            },
            blinding,
        ))
    }

    /// Issuer-side check before blind signing. Recomputes the Fiat-Shamir challenge and then
    /// verifies the Schnorr equation; any mismatch rejects the request.
    pub fn verify<D: Digest>(
        &self,
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Result<(), AnonCredError> {
        expect_equality!(
            self.response.len(),
            ipk.supported_message_count() + 1,
            AnonCredError::MessageCountIncompatibleWithKey
        );
        if self.commitment.is_zero() || self.t.is_zero() {
            return Err(AnonCredError::InvalidCredentialRequest);
        }
        let challenge = Self::compute_challenge::<D>(&self.commitment, &self.t, &ipk.hash, params)?;
        if challenge != self.challenge {
            return Err(AnonCredError::InvalidCredentialRequest);
        }
        let bases = Self::commitment_bases(ipk, params);
        self.response
            .is_valid(&bases, &self.commitment, &self.t, &self.challenge)
            .map_err(|_| AnonCredError::InvalidCredentialRequest)
    }

    fn commitment_bases(
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Vec<E::G2Affine> {
        let mut bases = Vec::with_capacity(ipk.supported_message_count() + 1);
        bases.push(params.g_tilde);
        bases.extend_from_slice(&ipk.Y_tilde);
        bases
    }

    fn compute_challenge<D: Digest>(
        commitment: &E::G2Affine,
        t: &E::G2Affine,
        issuer_key_hash: &E::ScalarField,
        params: &SignatureParams<E>,
    ) -> Result<E::ScalarField, AnonCredError> {
        let mut challenge_bytes = CRED_REQUEST_LABEL.to_vec();
        commitment.serialize_compressed(&mut challenge_bytes)?;
        t.serialize_compressed(&mut challenge_bytes)?;
        params.g_tilde.serialize_compressed(&mut challenge_bytes)?;
        issuer_key_hash.serialize_compressed(&mut challenge_bytes)?;
        Ok(compute_random_oracle_challenge::<E::ScalarField, D>(
            &challenge_bytes,
        ))
    }
}

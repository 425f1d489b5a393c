//! The unblinded credential. Long-lived and reusable: every presentation derives a fresh,
//! re-randomized credential from it instead of showing it directly.

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use dock_crypto_utils::{expect_equality, serde_utils::ArkObjectBytes};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{
    error::AnonCredError,
    setup::{IssuerPublicKey, SignatureParams},
};

/// Credential obtained by unblinding a blind signature, valid for the full attribute vector.
/// Satisfies `e(X + sum(Y_i * m_i), H) == e(g, S)`.
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
pub struct PrimaryCredential<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub H: E::G2Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub S: E::G2Affine,
}

impl<E: Pairing> PrimaryCredential<E> {
    pub fn verify(
        &self,
        messages: &[E::ScalarField],
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Result<(), AnonCredError> {
        if messages.is_empty() {
            return Err(AnonCredError::NoMessageGiven);
        }
        expect_equality!(
            messages.len(),
            ipk.supported_message_count(),
            AnonCredError::MessageCountIncompatibleWithKey
        );
        if !self.is_non_zero() {
            return Err(AnonCredError::ZeroSignature);
        }
        // Check e(X + sum(Y_i * m_i), H) == e(g, S)
        // => e(X + sum(Y_i * m_i), H) + e(-g, S) == 0
        let composite = ipk.X.into_group() + E::G1::msm_unchecked(&ipk.Y, messages);
        if !E::multi_pairing(
            [
                E::G1Prepared::from(composite),
                E::G1Prepared::from(-params.g.into_group()),
            ],
            [
                E::G2Prepared::from(self.H),
                E::G2Prepared::from(self.S),
            ],
        )
        .is_zero()
        {
            return Err(AnonCredError::InvalidCredential);
        }
        Ok(())
    }

    pub fn is_non_zero(&self) -> bool {
        !(self.H.is_zero() || self.S.is_zero())
    }
}

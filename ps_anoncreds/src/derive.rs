//! Per-presentation credentials with selective disclosure. Deriving re-randomizes the primary
//! credential so two presentations cannot be linked, discloses the attribute values the caller's
//! mask selects and binds the hidden ones through the issuer key's cross terms.
//!
//! Verification checks two pairing equations: one ties the re-randomized signature to the
//! disclosed values and the hidden-attribute commitment, the other ties that commitment to the
//! cross-term sum so hidden contributions cannot be swapped between attribute slots.

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_ff::Zero;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{collections::BTreeMap, rand::RngCore, vec::Vec, UniformRand};
use dock_crypto_utils::{expect_equality, serde_utils::ArkObjectBytes};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Same};

use crate::{
    credential::PrimaryCredential,
    error::AnonCredError,
    setup::{IssuerPublicKey, SignatureParams},
};

/// Unlinkable credential disclosing a subset of the signed attributes. Ephemeral, one per
/// presentation.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct DeriveCredential<E: Pairing> {
    /// `H * r` for fresh `r`
    #[serde_as(as = "ArkObjectBytes")]
    pub H_prime: E::G2Affine,
    /// `S * r + H_prime * t` for fresh `t`
    #[serde_as(as = "ArkObjectBytes")]
    pub S_prime: E::G2Affine,
    /// `g * t + sum(Y_j * m_j)` over hidden indices `j`
    #[serde_as(as = "ArkObjectBytes")]
    pub sigma_1: E::G1Affine,
    /// `(sum of disclosed Y_i) * t + sum(Z_ij * m_j)` over disclosed `i`, hidden `j`
    #[serde_as(as = "ArkObjectBytes")]
    pub sigma_2: E::G1Affine,
    /// Cleartext values at the disclosed indices. Hidden indices are absent.
    #[serde_as(as = "BTreeMap<Same, ArkObjectBytes>")]
    pub disclosed_messages: BTreeMap<usize, E::ScalarField>,
}

impl<E: Pairing> DeriveCredential<E> {
    /// Derive a fresh presentation credential from `credential`. `disclosure_mask[i]` decides
    /// whether attribute `i` is disclosed (`true`) or stays hidden. Fails if `credential` does
    /// not verify over the full message vector. Every mask is legal, including all-hidden and
    /// all-disclosed.
    pub fn new<R: RngCore>(
        rng: &mut R,
        messages: &[E::ScalarField],
        disclosure_mask: &[bool],
        credential: &PrimaryCredential<E>,
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        credential.verify(messages, ipk, params)?;
        expect_equality!(
            disclosure_mask.len(),
            messages.len(),
            AnonCredError::MaskLengthIncompatibleWithMessageCount
        );
        let (disclosed, hidden): (Vec<usize>, Vec<usize>) =
            (0..disclosure_mask.len()).partition(|i| disclosure_mask[*i]);

        let mut r = E::ScalarField::rand(rng);
        while r.is_zero() {
            r = E::ScalarField::rand(rng);
        }
        let mut t = E::ScalarField::rand(rng);
        while t.is_zero() {
            t = E::ScalarField::rand(rng);
        }

        let H_prime = credential.H * r;
        let S_prime = credential.S * r + H_prime * t;

        let hidden_bases = hidden.iter().map(|j| ipk.Y[*j]).collect::<Vec<_>>();
        let hidden_scalars = hidden.iter().map(|j| messages[*j]).collect::<Vec<_>>();
        let sigma_1 = params.g * t + E::G1::msm_unchecked(&hidden_bases, &hidden_scalars);

        let disclosed_sum = disclosed
            .iter()
            .map(|i| ipk.Y[*i].into_group())
            .sum::<E::G1>();
        let mut cross_bases = Vec::with_capacity(disclosed.len() * hidden.len());
        let mut cross_scalars = Vec::with_capacity(disclosed.len() * hidden.len());
        for i in &disclosed {
            for j in &hidden {
                cross_bases.push(*ipk.Z.get(*i, *j)?);
                cross_scalars.push(messages[*j]);
            }
        }
        let sigma_2 = disclosed_sum * t + E::G1::msm_unchecked(&cross_bases, &cross_scalars);

        let g2 = E::G2::normalize_batch(&[H_prime, S_prime]);
        let g1 = E::G1::normalize_batch(&[sigma_1, sigma_2]);
        trace!(
            "derived credential disclosing {} of {} attributes",
            disclosed.len(),
            messages.len()
        );
        Ok(Self {
            H_prime: g2[0],
            S_prime: g2[1],
            sigma_1: g1[0],
            sigma_2: g1[1],
            disclosed_messages: disclosed.into_iter().map(|i| (i, messages[i])).collect(),
        })
    }

    /// Both pairing equations must hold; any mismatch is a hard failure.
    pub fn verify(
        &self,
        ipk: &IssuerPublicKey<E>,
        params: &SignatureParams<E>,
    ) -> Result<(), AnonCredError> {
        if self.H_prime.is_zero() || self.S_prime.is_zero() {
            return Err(AnonCredError::ZeroSignature);
        }
        let message_count = ipk.supported_message_count();
        if let Some((&highest, _)) = self.disclosed_messages.last_key_value() {
            if highest >= message_count {
                return Err(AnonCredError::MessageIndexOutOfBounds(
                    highest,
                    message_count,
                ));
            }
        }
        let (disclosed_bases, disclosed_scalars): (Vec<_>, Vec<_>) = self
            .disclosed_messages
            .iter()
            .map(|(i, m)| (ipk.Y[*i], *m))
            .unzip();

        // Check e(X + sigma_1 + sum(Y_i * m_i), H_prime) == e(g, S_prime)
        let composite = ipk.X.into_group()
            + self.sigma_1
            + E::G1::msm_unchecked(&disclosed_bases, &disclosed_scalars);
        if !E::multi_pairing(
            [
                E::G1Prepared::from(composite),
                E::G1Prepared::from(-params.g.into_group()),
            ],
            [
                E::G2Prepared::from(self.H_prime),
                E::G2Prepared::from(self.S_prime),
            ],
        )
        .is_zero()
        {
            return Err(AnonCredError::RandomizedPairingCheckFailed);
        }

        // Check e(sigma_1, sum of disclosed Y_tilde_i) == e(sigma_2, g_tilde)
        let disclosed_tilde_sum = self
            .disclosed_messages
            .keys()
            .map(|i| ipk.Y_tilde[*i].into_group())
            .sum::<E::G2>();
        if !E::multi_pairing(
            [
                E::G1Prepared::from(self.sigma_1),
                E::G1Prepared::from(-self.sigma_2.into_group()),
            ],
            [
                E::G2Prepared::from(disclosed_tilde_sum),
                E::G2Prepared::from(params.g_tilde),
            ],
        )
        .is_zero()
        {
            return Err(AnonCredError::HiddenAttributesCheckFailed);
        }
        Ok(())
    }

    pub fn disclosed_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.disclosed_messages.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blind_signature::BlindSignature, request::CredentialRequest, setup::IssuerKeypair,
        test_serialization,
    };
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use blake2::Blake2b512;

    fn issued_credential(
        rng: &mut StdRng,
        message_count: u32,
    ) -> (
        SignatureParams<Bls12_381>,
        IssuerKeypair<Bls12_381>,
        Vec<Fr>,
        PrimaryCredential<Bls12_381>,
    ) {
        let params = SignatureParams::<Bls12_381>::new::<Blake2b512>(b"test");
        let keypair =
            IssuerKeypair::generate_using_rng::<_, Blake2b512>(rng, message_count, &params)
                .unwrap();
        let messages = (0..message_count)
            .map(|_| Fr::rand(rng))
            .collect::<Vec<_>>();
        let (request, blinding) =
            CredentialRequest::new::<_, Blake2b512>(rng, &messages, &keypair.public_key, &params)
                .unwrap();
        let credential = BlindSignature::new(rng, &request, &keypair.secret_key, &params)
            .unwrap()
            .unblind(&blinding);
        (params, keypair, messages, credential)
    }

    #[test]
    fn every_mask_verifies() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let (params, keypair, messages, credential) = issued_credential(&mut rng, 4);

        for bits in 0u32..16 {
            let mask = (0..4).map(|i| (bits >> i) & 1 == 1).collect::<Vec<_>>();
            let derived = DeriveCredential::new(
                &mut rng,
                &messages,
                &mask,
                &credential,
                &keypair.public_key,
                &params,
            )
            .unwrap();
            derived.verify(&keypair.public_key, &params).unwrap();

            for (i, disclose) in mask.iter().enumerate() {
                if *disclose {
                    assert_eq!(derived.disclosed_messages[&i], messages[i]);
                } else {
                    assert!(!derived.disclosed_messages.contains_key(&i));
                }
            }
        }
    }

    #[test]
    fn derivations_are_unlinkable() {
        let mut rng = StdRng::seed_from_u64(1u64);
        let (params, keypair, messages, credential) = issued_credential(&mut rng, 4);
        let mask = [true, false, true, false];

        let d1 = DeriveCredential::new(
            &mut rng,
            &messages,
            &mask,
            &credential,
            &keypair.public_key,
            &params,
        )
        .unwrap();
        let d2 = DeriveCredential::new(
            &mut rng,
            &messages,
            &mask,
            &credential,
            &keypair.public_key,
            &params,
        )
        .unwrap();
        assert_ne!(d1.H_prime, d2.H_prime);
        assert_ne!(d1.S_prime, d2.S_prime);
        assert_ne!(d1.sigma_1, d2.sigma_1);
        assert_eq!(d1.disclosed_messages, d2.disclosed_messages);
    }

    #[test]
    fn tampering_is_rejected() {
        let mut rng = StdRng::seed_from_u64(2u64);
        let (params, keypair, messages, credential) = issued_credential(&mut rng, 4);
        let mask = [true, false, true, false];
        let derived = DeriveCredential::new(
            &mut rng,
            &messages,
            &mask,
            &credential,
            &keypair.public_key,
            &params,
        )
        .unwrap();

        let mut tampered = derived.clone();
        tampered.disclosed_messages.insert(0, Fr::rand(&mut rng));
        assert!(tampered.verify(&keypair.public_key, &params).is_err());

        let mut tampered = derived.clone();
        tampered.sigma_1 = (tampered.sigma_1 * Fr::from(2u64)).into_affine();
        assert!(tampered.verify(&keypair.public_key, &params).is_err());

        let mut tampered = derived.clone();
        tampered.sigma_2 = (tampered.sigma_2 * Fr::from(2u64)).into_affine();
        assert!(tampered.verify(&keypair.public_key, &params).is_err());

        let mut tampered = derived.clone();
        tampered.H_prime = (tampered.H_prime * Fr::from(2u64)).into_affine();
        assert!(tampered.verify(&keypair.public_key, &params).is_err());

        let mut tampered = derived.clone();
        tampered.S_prime = (tampered.S_prime * Fr::from(2u64)).into_affine();
        assert!(tampered.verify(&keypair.public_key, &params).is_err());

        // moving a disclosed value to another index must break the cross-term equation
        let mut tampered = derived;
        let value = tampered.disclosed_messages.remove(&0).unwrap();
        tampered.disclosed_messages.insert(1, value);
        assert!(tampered.verify(&keypair.public_key, &params).is_err());
    }

    #[test]
    fn primary_credential_is_checked_before_deriving() {
        let mut rng = StdRng::seed_from_u64(3u64);
        let (params, keypair, messages, credential) = issued_credential(&mut rng, 4);
        let mut wrong = messages.clone();
        wrong[0] = Fr::rand(&mut rng);
        assert!(DeriveCredential::new(
            &mut rng,
            &wrong,
            &[true, false, true, false],
            &credential,
            &keypair.public_key,
            &params,
        )
        .is_err());
        assert!(DeriveCredential::new(
            &mut rng,
            &messages,
            &[true, false],
            &credential,
            &keypair.public_key,
            &params,
        )
        .is_err());
    }

    #[test]
    fn serialization() {
        let mut rng = StdRng::seed_from_u64(4u64);
        let (params, keypair, messages, credential) = issued_credential(&mut rng, 4);
        let derived = DeriveCredential::new(
            &mut rng,
            &messages,
            &[true, true, false, false],
            &credential,
            &keypair.public_key,
            &params,
        )
        .unwrap();
        derived.verify(&keypair.public_key, &params).unwrap();
        test_serialization!(DeriveCredential<Bls12_381>, derived);
    }
}

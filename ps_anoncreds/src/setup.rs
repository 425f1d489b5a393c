//! Signature parameters and issuer/user keys.
//!
//! The issuer key certifies attribute vectors: secret `(x, y_1, .., y_n)` with public mirror
//! `X = g * x`, `Y_i = g * y_i`, `Y_tilde_i = g_tilde * y_i` plus cross terms
//! `Z_ij = g * (y_i * y_j)` consumed during selective disclosure. The user key `(b, w_1, .., w_n)`
//! is a second signing identity used when aggregating derived credentials. Both public keys carry
//! a digest of their own serialization that is bound into Fiat-Shamir challenges.

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::{cfg_into_iter, cfg_iter, rand::RngCore, vec, vec::Vec, UniformRand};
use digest::Digest;
use dock_crypto_utils::{
    concat_slices,
    hashing_utils::{affine_group_elem_from_try_and_incr, field_elem_from_try_and_incr},
    join,
    misc::{n_rand, points},
    serde_utils::ArkObjectBytes,
};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AnonCredError;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Public parameters shared by the issuer, users and verifiers. One generator per source group.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct SignatureParams<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub g: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub g_tilde: E::G2Affine,
}

impl<E: Pairing> SignatureParams<E> {
    /// Generate params by hashing a known string. The hash function is vulnerable to timing
    /// attack but since all this is public data, it is fine.
    pub fn new<D: Digest>(label: &[u8]) -> Self {
        let g =
            affine_group_elem_from_try_and_incr::<E::G1Affine, D>(&concat_slices![label, b" : g"]);
        let g_tilde = affine_group_elem_from_try_and_incr::<E::G2Affine, D>(&concat_slices![
            label,
            b" : g_tilde"
        ]);
        Self { g, g_tilde }
    }

    pub fn generate_using_rng<R: RngCore>(rng: &mut R) -> Self {
        Self {
            g: E::G1::rand(rng).into(),
            g_tilde: E::G2::rand(rng).into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !(self.g.is_zero() || self.g_tilde.is_zero())
    }
}

/// Secret key of the issuer, supporting `y.len()` attributes per credential
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
pub struct IssuerSecretKey<F: PrimeField> {
    #[serde_as(as = "ArkObjectBytes")]
    pub x: F,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub y: Vec<F>,
}

impl<F: PrimeField> IssuerSecretKey<F> {
    pub fn new<R: RngCore>(rng: &mut R, message_count: u32) -> Self {
        Self {
            x: F::rand(rng),
            y: n_rand(rng, message_count).collect(),
        }
    }

    pub fn supported_message_count(&self) -> usize {
        self.y.len()
    }
}

/// Cross terms `Z_ij = g * (y_i * y_j)` for `i != j`. A derived credential folds these into its
/// second signature component so a verifier can tie disclosed and hidden attributes to the same
/// key without learning the hidden values. Stored as a dense table whose main diagonal is unused
/// and kept at identity.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct CrossTerms<G: AffineRepr> {
    pub message_count: u32,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub terms: Vec<G>,
}

impl<G: AffineRepr> CrossTerms<G> {
    pub fn new(y: &[G::ScalarField], g: &G) -> Self {
        let n = y.len();
        let terms = cfg_into_iter!(0..n * n)
            .map(|k| {
                let (i, j) = (k / n, k % n);
                if i == j {
                    G::Group::zero()
                } else {
                    g.into_group() * (y[i] * y[j])
                }
            })
            .collect::<Vec<_>>();
        Self {
            message_count: n as u32,
            terms: G::Group::normalize_batch(&terms),
        }
    }

    /// Term for the index pair `(i, j)`. Only distinct, in-bounds pairs have a term.
    pub fn get(&self, i: usize, j: usize) -> Result<&G, AnonCredError> {
        if i == j {
            return Err(AnonCredError::CrossTermIndexPairNotDistinct(i));
        }
        let n = self.message_count as usize;
        if i >= n || j >= n {
            return Err(AnonCredError::MessageIndexOutOfBounds(i.max(j), n));
        }
        Ok(&self.terms[i * n + j])
    }

    pub fn is_valid(&self) -> bool {
        let n = self.message_count as usize;
        self.terms.len() == n * n
            && cfg_into_iter!(0..n * n).all(|k| (k / n == k % n) == self.terms[k].is_zero())
    }
}

/// Public key of the issuer. `hash` is a digest of all other fields and must be recomputed
/// whenever any of them changes; credential requests bind their challenge to it so a proof
/// cannot be replayed against a different issuer key.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct IssuerPublicKey<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub X: E::G1Affine,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub Y: Vec<E::G1Affine>,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub Y_tilde: Vec<E::G2Affine>,
    pub Z: CrossTerms<E::G1Affine>,
    #[serde_as(as = "ArkObjectBytes")]
    pub hash: E::ScalarField,
}

impl<E: Pairing> IssuerPublicKey<E> {
    pub fn new<D: Digest>(
        secret_key: &IssuerSecretKey<E::ScalarField>,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        let (X, Y, Y_tilde, Z) = join!(
            (params.g * secret_key.x).into_affine(),
            points(&params.g, &secret_key.y),
            points(&params.g_tilde, &secret_key.y),
            CrossTerms::new(&secret_key.y, &params.g)
        );
        let mut pk = Self {
            X,
            Y,
            Y_tilde,
            Z,
            hash: E::ScalarField::zero(),
        };
        pk.hash = pk.compute_hash::<D>()?;
        Ok(pk)
    }

    /// Digest of every field except `hash` itself
    pub fn compute_hash<D: Digest>(&self) -> Result<E::ScalarField, AnonCredError> {
        let mut bytes = vec![];
        self.X.serialize_compressed(&mut bytes)?;
        self.Y.serialize_compressed(&mut bytes)?;
        self.Y_tilde.serialize_compressed(&mut bytes)?;
        self.Z.serialize_compressed(&mut bytes)?;
        Ok(field_elem_from_try_and_incr::<E::ScalarField, D>(&bytes))
    }

    pub fn supported_message_count(&self) -> usize {
        self.Y.len()
    }

    pub fn is_valid(&self) -> bool {
        self.Y.len() == self.Y_tilde.len()
            && self.Z.message_count as usize == self.Y.len()
            && !self.X.is_zero()
            && !cfg_iter!(self.Y).any(|p| p.is_zero())
            && !cfg_iter!(self.Y_tilde).any(|p| p.is_zero())
            && self.Z.is_valid()
    }

    /// Structural validity plus re-derivation of the hash binding
    pub fn validate<D: Digest>(&self) -> Result<(), AnonCredError> {
        if !self.is_valid() {
            return Err(AnonCredError::InvalidPublicKey);
        }
        if self.hash != self.compute_hash::<D>()? {
            return Err(AnonCredError::PublicKeyHashMismatch);
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize)]
pub struct IssuerKeypair<E: Pairing> {
    pub secret_key: IssuerSecretKey<E::ScalarField>,
    pub public_key: IssuerPublicKey<E>,
}

impl<E: Pairing> IssuerKeypair<E> {
    pub fn generate_using_rng<R: RngCore, D: Digest>(
        rng: &mut R,
        message_count: u32,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        let secret_key = IssuerSecretKey::new(rng, message_count);
        let public_key = IssuerPublicKey::new::<D>(&secret_key, params)?;
        Ok(Self {
            secret_key,
            public_key,
        })
    }
}

/// Secret key of the user: `b` plus one weight `w_i` per aggregated credential slot
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
pub struct UserSecretKey<F: PrimeField> {
    #[serde_as(as = "ArkObjectBytes")]
    pub b: F,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub w: Vec<F>,
}

impl<F: PrimeField> UserSecretKey<F> {
    pub fn new<R: RngCore>(rng: &mut R, message_count: u32) -> Self {
        Self {
            b: F::rand(rng),
            w: n_rand(rng, message_count).collect(),
        }
    }

    pub fn supported_message_count(&self) -> usize {
        self.w.len()
    }
}

/// Public key of the user. Mirrors the issuer key without cross terms.
#[serde_as]
#[derive(
    Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
pub struct UserPublicKey<E: Pairing> {
    #[serde_as(as = "ArkObjectBytes")]
    pub B: E::G1Affine,
    #[serde_as(as = "ArkObjectBytes")]
    pub B_tilde: E::G2Affine,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub W: Vec<E::G1Affine>,
    #[serde_as(as = "Vec<ArkObjectBytes>")]
    pub W_tilde: Vec<E::G2Affine>,
    #[serde_as(as = "ArkObjectBytes")]
    pub hash: E::ScalarField,
}

impl<E: Pairing> UserPublicKey<E> {
    pub fn new<D: Digest>(
        secret_key: &UserSecretKey<E::ScalarField>,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        let (B, B_tilde, W, W_tilde) = join!(
            (params.g * secret_key.b).into_affine(),
            (params.g_tilde * secret_key.b).into_affine(),
            points(&params.g, &secret_key.w),
            points(&params.g_tilde, &secret_key.w)
        );
        let mut pk = Self {
            B,
            B_tilde,
            W,
            W_tilde,
            hash: E::ScalarField::zero(),
        };
        pk.hash = pk.compute_hash::<D>()?;
        Ok(pk)
    }

    /// Digest of every field except `hash` itself
    pub fn compute_hash<D: Digest>(&self) -> Result<E::ScalarField, AnonCredError> {
        let mut bytes = vec![];
        self.B.serialize_compressed(&mut bytes)?;
        self.B_tilde.serialize_compressed(&mut bytes)?;
        self.W.serialize_compressed(&mut bytes)?;
        self.W_tilde.serialize_compressed(&mut bytes)?;
        Ok(field_elem_from_try_and_incr::<E::ScalarField, D>(&bytes))
    }

    pub fn supported_message_count(&self) -> usize {
        self.W.len()
    }

    pub fn is_valid(&self) -> bool {
        self.W.len() == self.W_tilde.len()
            && !self.B.is_zero()
            && !self.B_tilde.is_zero()
            && !cfg_iter!(self.W).any(|p| p.is_zero())
            && !cfg_iter!(self.W_tilde).any(|p| p.is_zero())
    }

    pub fn validate<D: Digest>(&self) -> Result<(), AnonCredError> {
        if !self.is_valid() {
            return Err(AnonCredError::InvalidPublicKey);
        }
        if self.hash != self.compute_hash::<D>()? {
            return Err(AnonCredError::PublicKeyHashMismatch);
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Eq, Debug, CanonicalSerialize, CanonicalDeserialize)]
pub struct UserKeypair<E: Pairing> {
    pub secret_key: UserSecretKey<E::ScalarField>,
    pub public_key: UserPublicKey<E>,
}

impl<E: Pairing> UserKeypair<E> {
    pub fn generate_using_rng<R: RngCore, D: Digest>(
        rng: &mut R,
        message_count: u32,
        params: &SignatureParams<E>,
    ) -> Result<Self, AnonCredError> {
        let secret_key = UserSecretKey::new(rng, message_count);
        let public_key = UserPublicKey::new::<D>(&secret_key, params)?;
        Ok(Self {
            secret_key,
            public_key,
        })
    }
}

/// Deterministic encoding of an attribute's raw bytes as a scalar, big-endian reduction mod
/// the field order
pub fn message_from_bytes<F: PrimeField>(bytes: &[u8]) -> F {
    F::from_be_bytes_mod_order(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_serialization;
    use ark_bls12_381::{Bls12_381, Fr};
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use blake2::Blake2b512;

    #[test]
    fn issuer_keypair_generation() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let params = SignatureParams::<Bls12_381>::new::<Blake2b512>(b"test");
        assert!(params.is_valid());

        let keypair =
            IssuerKeypair::<Bls12_381>::generate_using_rng::<_, Blake2b512>(&mut rng, 4, &params)
                .unwrap();
        let sk = &keypair.secret_key;
        let pk = &keypair.public_key;
        assert_eq!(sk.supported_message_count(), 4);
        assert_eq!(pk.supported_message_count(), 4);
        pk.validate::<Blake2b512>().unwrap();

        assert_eq!(pk.X, (params.g * sk.x).into_affine());
        for i in 0..4 {
            assert_eq!(pk.Y[i], (params.g * sk.y[i]).into_affine());
            assert_eq!(pk.Y_tilde[i], (params.g_tilde * sk.y[i]).into_affine());
            for j in 0..4 {
                if i == j {
                    assert!(pk.Z.get(i, j).is_err());
                } else {
                    assert_eq!(
                        *pk.Z.get(i, j).unwrap(),
                        (params.g * (sk.y[i] * sk.y[j])).into_affine()
                    );
                }
            }
        }
        assert!(pk.Z.get(0, 5).is_err());
    }

    #[test]
    fn issuer_public_key_hash_binding() {
        let mut rng = StdRng::seed_from_u64(1u64);
        let params = SignatureParams::<Bls12_381>::new::<Blake2b512>(b"test");
        let keypair =
            IssuerKeypair::<Bls12_381>::generate_using_rng::<_, Blake2b512>(&mut rng, 3, &params)
                .unwrap();

        let mut tampered = keypair.public_key.clone();
        tampered.X = (params.g * Fr::rand(&mut rng)).into_affine();
        assert!(tampered.validate::<Blake2b512>().is_err());

        // hash must change with the key material
        tampered.hash = tampered.compute_hash::<Blake2b512>().unwrap();
        assert_ne!(tampered.hash, keypair.public_key.hash);
    }

    #[test]
    fn user_keypair_generation() {
        let mut rng = StdRng::seed_from_u64(2u64);
        let params = SignatureParams::<Bls12_381>::new::<Blake2b512>(b"test");
        let keypair =
            UserKeypair::<Bls12_381>::generate_using_rng::<_, Blake2b512>(&mut rng, 4, &params)
                .unwrap();
        let sk = &keypair.secret_key;
        let pk = &keypair.public_key;
        pk.validate::<Blake2b512>().unwrap();
        assert_eq!(pk.B, (params.g * sk.b).into_affine());
        assert_eq!(pk.B_tilde, (params.g_tilde * sk.b).into_affine());
        for i in 0..4 {
            assert_eq!(pk.W[i], (params.g * sk.w[i]).into_affine());
            assert_eq!(pk.W_tilde[i], (params.g_tilde * sk.w[i]).into_affine());
        }
    }

    #[test]
    fn message_encoding_is_deterministic() {
        let m: Fr = message_from_bytes(b"companyA");
        let m1: Fr = message_from_bytes(b"companyA");
        let m2: Fr = message_from_bytes(b"companyB");
        assert_eq!(m, m1);
        assert_ne!(m, m2);
    }

    #[test]
    fn serialization() {
        let mut rng = StdRng::seed_from_u64(3u64);
        let params = SignatureParams::<Bls12_381>::new::<Blake2b512>(b"test");
        let issuer =
            IssuerKeypair::<Bls12_381>::generate_using_rng::<_, Blake2b512>(&mut rng, 2, &params)
                .unwrap();
        let user =
            UserKeypair::<Bls12_381>::generate_using_rng::<_, Blake2b512>(&mut rng, 2, &params)
                .unwrap();

        let (issuer_sk, issuer_pk) = (issuer.secret_key, issuer.public_key);
        let (user_sk, user_pk) = (user.secret_key, user.public_key);
        test_serialization!(SignatureParams<Bls12_381>, params);
        test_serialization!(IssuerSecretKey<Fr>, issuer_sk);
        test_serialization!(IssuerPublicKey<Bls12_381>, issuer_pk);
        test_serialization!(UserSecretKey<Fr>, user_sk);
        test_serialization!(UserPublicKey<Bls12_381>, user_pk);
    }
}

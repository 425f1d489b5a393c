use ark_serialize::SerializationError;
use schnorr_pok::error::SchnorrError;

#[derive(Debug)]
pub enum AnonCredError {
    NoMessageGiven,
    MessageCountIncompatibleWithKey(usize, usize),
    MaskLengthIncompatibleWithMessageCount(usize, usize),
    MessageIndexOutOfBounds(usize, usize),
    /// Cross terms exist only for distinct index pairs
    CrossTermIndexPairNotDistinct(usize),
    InvalidPublicKey,
    PublicKeyHashMismatch,
    InvalidCredentialRequest,
    ZeroSignature,
    InvalidCredential,
    RandomizedPairingCheckFailed,
    HiddenAttributesCheckFailed,
    NoCredentialGiven,
    CredentialCountIncompatibleWithKey(usize, usize),
    AggregatePairingCheckFailed,
    Serialization(SerializationError),
    SchnorrError(SchnorrError),
}

impl From<SchnorrError> for AnonCredError {
    fn from(e: SchnorrError) -> Self {
        Self::SchnorrError(e)
    }
}

impl From<SerializationError> for AnonCredError {
    fn from(e: SerializationError) -> Self {
        Self::Serialization(e)
    }
}

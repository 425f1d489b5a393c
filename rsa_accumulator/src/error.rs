use glass_pumpkin::error::Error as PrimeError;

#[derive(Debug)]
pub enum RsaAccumulatorError {
    /// Element is already present in the accumulator
    ElementPresent,
    /// Element is already absent from the accumulator
    ElementAbsent,
    /// No witness stored for a member that should have one
    WitnessMissing,
    PrimeGeneration(PrimeError),
}

impl From<PrimeError> for RsaAccumulatorError {
    fn from(e: PrimeError) -> Self {
        Self::PrimeGeneration(e)
    }
}

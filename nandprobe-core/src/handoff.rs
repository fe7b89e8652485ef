//! Parameter handoff to the next boot stage
//!
//! The derived parameters and bank order are serialized with postcard so a
//! later stage can pick them up without probing the controller again.

use serde::{Deserialize, Serialize};

use crate::bank::BankTable;
use crate::params::DeviceParameters;

/// Largest encoded record
pub const MAX_HANDOFF_SIZE: usize = 192;

/// Handoff encoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandoffError {
    /// Output buffer cannot hold the record
    BufferTooSmall,
    /// Input is truncated or not a handoff record
    Corrupted,
}

/// Record passed between boot stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub params: DeviceParameters,
    pub banks: BankTable,
}

/// Encode a handoff record into `buffer`
///
/// Returns the used prefix of `buffer`.
pub fn encode<'a>(handoff: &Handoff, buffer: &'a mut [u8]) -> Result<&'a mut [u8], HandoffError> {
    postcard::to_slice(handoff, buffer).map_err(|e| match e {
        postcard::Error::SerializeBufferFull => HandoffError::BufferTooSmall,
        _ => HandoffError::Corrupted,
    })
}

/// Decode a handoff record
///
/// Records whose bank table does not match a probing pass, or whose bank
/// count disagrees with the parameters, are rejected.
pub fn decode(bytes: &[u8]) -> Result<Handoff, HandoffError> {
    let handoff: Handoff = postcard::from_bytes(bytes).map_err(|_| HandoffError::Corrupted)?;
    if !handoff.banks.is_consistent()
        || handoff.banks.valid_count() as u32 != handoff.params.banks_total()
    {
        return Err(HandoffError::Corrupted);
    }
    Ok(handoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::timing::EccSelection;

    fn sample() -> Handoff {
        let device = catalog::lookup(0xBA95_D798).unwrap();
        let mut banks = BankTable::identity(8);
        banks.record_valid(0);
        banks.record_valid(1);
        Handoff {
            params: DeviceParameters::derive(device, 2, 103_500_000, EccSelection::default()),
            banks,
        }
    }

    #[test]
    fn test_handoff_survives_encoding() {
        let handoff = sample();
        let mut buffer = [0u8; MAX_HANDOFF_SIZE];
        let used = encode(&handoff, &mut buffer).unwrap().len();
        assert_eq!(decode(&buffer[..used]).unwrap(), handoff);
    }

    #[test]
    fn test_small_buffer_rejected() {
        let mut buffer = [0u8; 8];
        assert_eq!(encode(&sample(), &mut buffer), Err(HandoffError::BufferTooSmall));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let handoff = sample();
        let mut buffer = [0u8; MAX_HANDOFF_SIZE];
        let used = encode(&handoff, &mut buffer).unwrap().len();
        assert_eq!(decode(&buffer[..used / 2]), Err(HandoffError::Corrupted));
    }

    #[test]
    fn test_tampered_bank_count_rejected() {
        let mut buffer = [0u8; MAX_HANDOFF_SIZE];
        let used = encode(&sample(), &mut buffer).unwrap().len();
        // Bank table ends the record with its valid count
        buffer[used - 1] = 200;
        assert_eq!(decode(&buffer[..used]), Err(HandoffError::Corrupted));
    }

    #[test]
    fn test_bank_count_must_match_parameters() {
        let mut handoff = sample();
        handoff.banks.record_valid(2);
        let mut buffer = [0u8; MAX_HANDOFF_SIZE];
        let used = encode(&handoff, &mut buffer).unwrap().len();
        assert_eq!(decode(&buffer[..used]), Err(HandoffError::Corrupted));
    }
}

use thiserror::Error;

use crate::domain::PHONE_NUMBER_MAX_LEN;

/// Why a phone-number keystroke was not forwarded to the draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneInputError {
    #[error("phone number is {len} characters long; at most {max} allowed", max = PHONE_NUMBER_MAX_LEN)]
    TooLong { len: usize },
    #[error("phone number has invalid character '{ch}' at position {index}")]
    InvalidCharacter { ch: char, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort order '{value}'; expected first-name, last-name or phone-number")]
pub struct SortTypeParseError {
    pub value: String,
}

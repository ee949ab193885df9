use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{PhoneInputError, SortTypeParseError};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ContactId);

pub const PHONE_NUMBER_MAX_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Option<ContactId>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: String,
}

impl Contact {
    /// Builds an unsaved contact. A blank last name is stored as absent.
    pub fn new(
        first_name: impl Into<String>,
        last_name: Option<String>,
        phone_number: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.filter(|name| !name.trim().is_empty()),
            phone_number: phone_number.into(),
        }
    }

    pub fn with_id(mut self, id: ContactId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn display_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last) if !last.trim().is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }

    pub fn initials(&self) -> String {
        let first = self.first_name.chars().next();
        let last = self.last_name.as_deref().and_then(|name| name.chars().next());
        first
            .into_iter()
            .chain(last)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    FirstName,
    LastName,
    PhoneNumber,
}

impl SortType {
    pub const ALL: [SortType; 3] = [Self::FirstName, Self::LastName, Self::PhoneNumber];

    pub fn label(self) -> &'static str {
        match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::PhoneNumber => "phone number",
        }
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortType {
    type Err = SortTypeParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|sort| sort.label() == normalized)
            .ok_or_else(|| SortTypeParseError {
                value: raw.to_string(),
            })
    }
}

/// Checks a phone-number field value against `^\+?[0-9]*$` and the length cap.
///
/// Input that fails is dropped by the caller instead of being forwarded as an
/// intent, so the draft never holds a malformed number.
pub fn accept_phone_input(input: &str) -> Result<(), PhoneInputError> {
    let len = input.chars().count();
    if len > PHONE_NUMBER_MAX_LEN {
        return Err(PhoneInputError::TooLong { len });
    }

    for (index, ch) in input.chars().enumerate() {
        let allowed = ch.is_ascii_digit() || (ch == '+' && index == 0);
        if !allowed {
            return Err(PhoneInputError::InvalidCharacter { ch, index });
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::EntryId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("invalid loan inputs: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Conflict(ConflictError),

    #[error("calculation error: {message}")]
    Computation {
        message: String,
    },

    #[error("invalid share state value for `{key}`: {value}")]
    InvalidShareState {
        key: String,
        value: String,
    },
}

impl CalculatorError {
    pub(crate) fn computation(message: impl Into<String>) -> Self {
        CalculatorError::Computation {
            message: message.into(),
        }
    }

    /// field errors carried by this error, if any
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            CalculatorError::Validation(errors) => &errors.errors,
            CalculatorError::Conflict(conflict) => &conflict.field_errors,
            _ => &[],
        }
    }
}

/// input field a validation message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LoanAmount,
    InterestRate,
    LoanPeriod,
    StartDate,
    FirstPaymentDate,
    Amount,
    Count,
    CustomTotal,
    LumpAmount,
    LumpDate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::LoanAmount => "loan_amount",
            Field::InterestRate => "interest_rate",
            Field::LoanPeriod => "loan_period",
            Field::StartDate => "start_date",
            Field::FirstPaymentDate => "first_payment_date",
            Field::Amount => "amount",
            Field::Count => "count",
            Field::CustomTotal => "custom_total",
            Field::LumpAmount => "lump_amount",
            Field::LumpDate => "lump_date",
        };
        f.write_str(name)
    }
}

/// a single field-scoped validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    /// set when the field belongs to an extra payment entry
    pub entry: Option<EntryId>,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            entry: None,
            message: message.into(),
        }
    }

    pub fn for_entry(entry: EntryId, field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            entry: Some(entry),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry {
            Some(entry) => write!(f, "{}[{}]: {}", self.field, entry, self.message),
            None => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

/// every field error found in one validation pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// first message reported for a field
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_result(self) -> std::result::Result<(), CalculatorError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CalculatorError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}

/// recurring and custom-total extra payments requested together
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConflictError {
    /// loan field errors collected before the conflict was found
    pub field_errors: Vec<FieldError>,
}

impl ConflictError {
    pub const MESSAGE: &'static str =
        "Cannot have both recurring and custom total payment types. Please remove one type before calculating.";
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

pub type Result<T> = std::result::Result<T, CalculatorError>;

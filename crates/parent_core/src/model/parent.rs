//! Parent domain model.
//!
//! # Responsibility
//! - Define the validated shape of a parent record.
//! - Describe the field-to-column mapping used by the repository boundary.
//! - Provide copy-with-one-field-changed helpers for update flows.
//!
//! # Invariants
//! - `id` is `None` until the store assigns one on insert.
//! - `first_name` and `last_name` are never blank once validated.
//! - Decoding does not enforce ranges; `validate()` does.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identity of a persisted parent.
pub type ParentId = i64;

pub const FIRST_NAME_MAX_LEN: usize = 40;
pub const LAST_NAME_MAX_LEN: usize = 60;
pub const AGE_MIN: i32 = 0;
pub const AGE_MAX: i32 = 60;

/// Table backing the `Parent` entity.
pub const PARENT_TABLE: &str = "parent";

/// One mapped field of the `parent` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column name, identical to the interchange field name.
    pub column: &'static str,
    pub nullable: bool,
    /// Maximum length in characters for text columns.
    pub max_len: Option<usize>,
}

/// Explicit field-to-column mapping for `Parent`.
pub const PARENT_COLUMNS: &[ColumnMapping] = &[
    ColumnMapping {
        column: "id",
        nullable: false,
        max_len: None,
    },
    ColumnMapping {
        column: "first_name",
        nullable: false,
        max_len: Some(FIRST_NAME_MAX_LEN),
    },
    ColumnMapping {
        column: "last_name",
        nullable: false,
        max_len: Some(LAST_NAME_MAX_LEN),
    },
    ColumnMapping {
        column: "age",
        nullable: false,
        max_len: None,
    },
];

/// Looks up the mapping for `column`.
pub fn column_mapping(column: &str) -> Option<&'static ColumnMapping> {
    PARENT_COLUMNS.iter().find(|mapping| mapping.column == column)
}

/// Validation errors for parent field constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentValidationError {
    BlankField {
        field: &'static str,
    },
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    AgeOutOfRange {
        age: i32,
        min: i32,
        max: i32,
    },
}

impl Display for ParentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { field } => write!(f, "{field} must not be blank"),
            Self::FieldTooLong { field, max, actual } => {
                write!(f, "{field} length {actual} exceeds maximum {max}")
            }
            Self::AgeOutOfRange { age, min, max } => {
                write!(f, "age ({age}) must be within {min}..={max}")
            }
        }
    }
}

impl Error for ParentValidationError {}

/// A parent record mapped one-to-one to a row of the `parent` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Assigned by the store on insert; omitted from JSON while unsaved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ParentId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub age: i32,
}

impl Parent {
    /// Creates an unsaved parent with the default age of 0.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            age: 0,
        }
    }

    /// Starts a builder accepting every field.
    pub fn builder() -> ParentBuilder {
        ParentBuilder::default()
    }

    /// Returns whether the store has assigned an identity.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks field constraints declared in `PARENT_COLUMNS` and the age range.
    ///
    /// # Errors
    /// - `BlankField` when a name is empty or whitespace-only.
    /// - `FieldTooLong` when a name exceeds its column length.
    /// - `AgeOutOfRange` when `age` is outside `AGE_MIN..=AGE_MAX`.
    pub fn validate(&self) -> Result<(), ParentValidationError> {
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;

        if !(AGE_MIN..=AGE_MAX).contains(&self.age) {
            return Err(ParentValidationError::AgeOutOfRange {
                age: self.age,
                min: AGE_MIN,
                max: AGE_MAX,
            });
        }

        Ok(())
    }

    pub fn with_id(&self, id: ParentId) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    pub fn with_first_name(&self, first_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            ..self.clone()
        }
    }

    pub fn with_last_name(&self, last_name: impl Into<String>) -> Self {
        Self {
            last_name: last_name.into(),
            ..self.clone()
        }
    }

    pub fn with_age(&self, age: i32) -> Self {
        Self { age, ..self.clone() }
    }
}

/// Builder for `Parent`; `age` defaults to 0 and `id` to unsaved.
#[derive(Debug, Clone, Default)]
pub struct ParentBuilder {
    id: Option<ParentId>,
    first_name: String,
    last_name: String,
    age: i32,
}

impl ParentBuilder {
    pub fn id(mut self, id: ParentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = last_name.into();
        self
    }

    pub fn age(mut self, age: i32) -> Self {
        self.age = age;
        self
    }

    /// Finishes the builder without validating; call `Parent::validate()`
    /// or let the repository do it on write.
    pub fn build(self) -> Parent {
        Parent {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
        }
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<(), ParentValidationError> {
    if value.trim().is_empty() {
        return Err(ParentValidationError::BlankField { field });
    }

    let Some(max) = column_mapping(field).and_then(|mapping| mapping.max_len) else {
        return Ok(());
    };
    let actual = value.chars().count();
    if actual > max {
        return Err(ParentValidationError::FieldTooLong { field, max, actual });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{column_mapping, Parent, ParentValidationError, PARENT_COLUMNS};

    #[test]
    fn column_mapping_covers_every_serialized_field() {
        let parent = Parent::new("Trula", "Bischof").with_id(1);
        let json = serde_json::to_value(&parent).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), PARENT_COLUMNS.len());
        for mapping in PARENT_COLUMNS {
            assert!(object.contains_key(mapping.column), "{}", mapping.column);
        }
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        let parent = Parent::new("é".repeat(40), "Bischof");
        assert!(parent.validate().is_ok());

        let err = parent.with_first_name("é".repeat(41)).validate().unwrap_err();
        assert_eq!(
            err,
            ParentValidationError::FieldTooLong {
                field: "first_name",
                max: 40,
                actual: 41,
            }
        );
    }

    #[test]
    fn name_limits_come_from_column_mapping() {
        let base = Parent::new("Trula", "Bischof");

        for field in ["first_name", "last_name"] {
            let max = column_mapping(field).and_then(|m| m.max_len).unwrap();
            let at_limit = "x".repeat(max);
            let over_limit = "x".repeat(max + 1);
            let (ok, too_long) = match field {
                "first_name" => (
                    base.with_first_name(at_limit),
                    base.with_first_name(over_limit),
                ),
                _ => (base.with_last_name(at_limit), base.with_last_name(over_limit)),
            };

            assert!(ok.validate().is_ok(), "{field}");
            assert_eq!(
                too_long.validate().unwrap_err(),
                ParentValidationError::FieldTooLong {
                    field,
                    max,
                    actual: max + 1,
                }
            );
        }
    }

    #[test]
    fn unknown_column_has_no_mapping() {
        assert!(column_mapping("nickname").is_none());
        assert!(!column_mapping("first_name").unwrap().nullable);
    }
}

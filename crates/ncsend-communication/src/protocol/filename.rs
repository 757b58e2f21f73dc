//! Program name validation
//!
//! The controller stores uploaded programs under an `O`-number such as
//! `O1234`. The name comes from the file's base name, so a file has to be
//! called something like `O1234.NC` to be accepted.

use ncsend_core::ValidationError;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Maximum program name length accepted by the controller
pub const MAX_PROGRAM_NAME_LEN: usize = 8;

const NC_EXTENSION: &str = "NC";

static PROGRAM_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[Oo][0-9]+").expect("program name pattern is a valid regex")
});

/// A validated program name
///
/// Only [`validate`] constructs one, so holding a `ProgramName` means the
/// name starts with `O<digits>` and is at most [`MAX_PROGRAM_NAME_LEN`]
/// characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramName(String);

impl ProgramName {
    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Always false; a valid name has at least two characters
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProgramName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate a program file path and derive its program name.
///
/// Checks run in a fixed order and the first failure is returned:
/// 1. the extension must be `.NC`, any case
/// 2. the base name must start with `O` (any case) followed by digits
/// 3. the base name must be at most [`MAX_PROGRAM_NAME_LEN`] characters
pub fn validate(path: impl AsRef<Path>) -> Result<ProgramName, ValidationError> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let extension_ok = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NC_EXTENSION));
    if !extension_ok {
        return Err(ValidationError::InvalidExtension { name });
    }

    if !PROGRAM_NAME_PATTERN.is_match(&name) {
        return Err(ValidationError::BadFormat { name });
    }

    if name.chars().count() > MAX_PROGRAM_NAME_LEN {
        return Err(ValidationError::TooLong {
            name,
            max: MAX_PROGRAM_NAME_LEN,
        });
    }

    Ok(ProgramName(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_simple_name() {
        let name = validate("O1234.NC").unwrap();
        assert_eq!(name.as_str(), "O1234");
        assert_eq!(name.len(), 5);
    }

    #[test]
    fn test_validate_strips_directory() {
        let name = validate("/home/user/programs/O0001.nc").unwrap();
        assert_eq!(name.as_str(), "O0001");
    }

    #[test]
    fn test_validate_extension_case_insensitive() {
        assert!(validate("O1.nc").is_ok());
        assert!(validate("O1.Nc").is_ok());
        assert!(validate("O1.NC").is_ok());
    }

    #[test]
    fn test_validate_lowercase_prefix() {
        assert_eq!(validate("o42.NC").unwrap().as_str(), "o42");
    }

    #[test]
    fn test_validate_trailing_characters_allowed() {
        assert_eq!(validate("O12-AB.NC").unwrap().as_str(), "O12-AB");
    }

    #[test]
    fn test_validate_max_length() {
        assert_eq!(validate("O1234567.NC").unwrap().len(), 8);
        assert_eq!(
            validate("O12345678.NC"),
            Err(ValidationError::TooLong {
                name: "O12345678".to_string(),
                max: 8,
            })
        );
    }

    #[test]
    fn test_validate_invalid_extension() {
        assert!(matches!(
            validate("O1234.txt"),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validate("O1234"),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validate("O1234.NC.bak"),
            Err(ValidationError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_validate_bad_format() {
        for path in ["1234.NC", "program.NC", "O.NC", "OA12.NC", "P1234.NC"] {
            assert!(
                matches!(validate(path), Err(ValidationError::BadFormat { .. })),
                "{} should fail the format check",
                path
            );
        }
    }

    #[test]
    fn test_validate_rejects_non_ascii_digits() {
        assert!(matches!(
            validate("O١٢٣.NC"),
            Err(ValidationError::BadFormat { .. })
        ));
    }

    #[test]
    fn test_validate_extension_checked_before_format_and_length() {
        let err = validate("badprogramname.txt").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidExtension {
                name: "badprogramname".to_string()
            }
        );
    }

    #[test]
    fn test_validate_format_checked_before_length() {
        let err = validate("toolong123.NC").unwrap_err();
        assert_eq!(
            err,
            ValidationError::BadFormat {
                name: "toolong123".to_string()
            }
        );
    }
}

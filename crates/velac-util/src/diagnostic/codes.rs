//! Diagnostic codes.
//!
//! A code uniquely identifies a diagnostic kind (`E3104`, `W3101`) so users
//! can look up documentation or suppress a specific warning. The semantic
//! phase assigns its own code block; this module only defines the type.

use std::fmt;

/// A unique code identifying a diagnostic kind.
///
/// Codes follow the format `{prefix}{number}` where the prefix is typically
/// "E" for errors or "W" for warnings and the number is rendered with four
/// digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode {
    /// The prefix (e.g., "E" for error, "W" for warning)
    pub prefix: &'static str,
    /// The numeric identifier
    pub number: u32,
}

impl DiagnosticCode {
    /// Create a new diagnostic code.
    #[inline]
    pub const fn new(prefix: &'static str, number: u32) -> Self {
        Self { prefix, number }
    }

    /// The full code string, e.g. "E3104".
    pub fn as_str(&self) -> String {
        format!("{}{:04}", self.prefix, self.number)
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:04}", self.prefix, self.number)
    }
}

impl fmt::Debug for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiagnosticCode({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_formatting() {
        let code = DiagnosticCode::new("E", 3104);
        assert_eq!(code.as_str(), "E3104");
        assert_eq!(format!("{code}"), "E3104");
    }

    #[test]
    fn test_code_pads_to_four_digits() {
        let code = DiagnosticCode::new("W", 7);
        assert_eq!(code.as_str(), "W0007");
    }

    #[test]
    fn test_code_equality() {
        assert_eq!(DiagnosticCode::new("E", 1), DiagnosticCode::new("E", 1));
        assert_ne!(DiagnosticCode::new("E", 1), DiagnosticCode::new("W", 1));
    }
}

//! Success patterns for provider result codes.
//!
//! Gateway result codes are dotted triples such as `000.100.110`. A code
//! counts as successful when it matches any pattern in the table below.
//! Matching is a pure function over a fixed literal table and has no
//! knowledge of the backend's own status flag; see
//! [`settlement_verdict`] for how the two are combined.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Families of result codes treated as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeCategory {
    /// Transaction approved.
    Approved,
    /// 3-D Secure authentication succeeded.
    ThreeDSecure,
    /// Pending or under review, accepted as success.
    PendingAccepted,
    /// Issuer-specific approval codes.
    BankApproval,
}

impl CodeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeCategory::Approved => "approved",
            CodeCategory::ThreeDSecure => "three_d_secure",
            CodeCategory::PendingAccepted => "pending_accepted",
            CodeCategory::BankApproval => "bank_approval",
        }
    }
}

const SUCCESS_PATTERNS: &[(CodeCategory, &str)] = &[
    (CodeCategory::Approved, r"^(000\.000\.|000\.100\.1|000\.[36])"),
    (CodeCategory::ThreeDSecure, r"^000\.400\.[1][12]0"),
    (CodeCategory::PendingAccepted, r"^(000\.200)"),
    (CodeCategory::PendingAccepted, r"^(800\.400\.5|100\.400\.500)"),
    (
        CodeCategory::PendingAccepted,
        r"^(000\.400\.0[^3]|000\.400\.100)",
    ),
    (CodeCategory::BankApproval, r"^000\.100\.20[0-3]$"),
];

// The table is literal; a pattern that fails to compile is a programming
// error caught by the tests below.
static SUCCESS_CODES: LazyLock<Vec<(CodeCategory, Regex)>> = LazyLock::new(|| {
    SUCCESS_PATTERNS
        .iter()
        .filter_map(|(category, pattern)| Regex::new(pattern).ok().map(|re| (*category, re)))
        .collect()
});

/// Returns the first success category the code falls into, if any.
pub fn match_success_code(code: &str) -> Option<CodeCategory> {
    let code = code.trim();
    SUCCESS_CODES
        .iter()
        .find(|(_, re)| re.is_match(code))
        .map(|(category, _)| *category)
}

/// Returns true if the code matches any success pattern.
pub fn is_success_code(code: &str) -> bool {
    match_success_code(code).is_some()
}

/// Combines the backend's boolean flag with the result-code match.
///
/// Either signal alone is enough: the two come from different layers and
/// either may lag behind the other.
pub fn settlement_verdict(backend_status: bool, code: &str) -> bool {
    backend_status || is_success_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pattern_compiles() {
        assert_eq!(SUCCESS_CODES.len(), SUCCESS_PATTERNS.len());
    }

    #[test]
    fn test_category_table() {
        let cases = [
            ("000.000.000", Some(CodeCategory::Approved)),
            ("000.100.110", Some(CodeCategory::Approved)),
            ("000.100.112", Some(CodeCategory::Approved)),
            ("000.300.000", Some(CodeCategory::Approved)),
            ("000.600.000", Some(CodeCategory::Approved)),
            ("000.400.110", Some(CodeCategory::ThreeDSecure)),
            ("000.400.120", Some(CodeCategory::ThreeDSecure)),
            ("000.200.000", Some(CodeCategory::PendingAccepted)),
            ("000.200.100", Some(CodeCategory::PendingAccepted)),
            ("800.400.500", Some(CodeCategory::PendingAccepted)),
            ("100.400.500", Some(CodeCategory::PendingAccepted)),
            ("000.400.000", Some(CodeCategory::PendingAccepted)),
            ("000.400.100", Some(CodeCategory::PendingAccepted)),
            ("000.100.201", Some(CodeCategory::BankApproval)),
            ("000.100.203", Some(CodeCategory::BankApproval)),
        ];
        for (code, expected) in cases {
            assert_eq!(match_success_code(code), expected, "code: {code}");
        }
    }

    #[test]
    fn test_non_success_codes() {
        for code in [
            "000.400.030",
            "000.100.204",
            "100.396.101",
            "800.100.151",
            "200.300.404",
            "900.100.300",
            "",
            "garbage",
            "x000.000.000",
        ] {
            assert!(!is_success_code(code), "code: {code}");
        }
    }

    #[test]
    fn test_codes_are_trimmed() {
        assert!(is_success_code("  000.100.110 "));
    }

    #[test]
    fn test_verdict_is_or_of_both_signals() {
        assert!(settlement_verdict(true, "800.100.151"));
        assert!(settlement_verdict(false, "000.100.110"));
        assert!(settlement_verdict(true, "000.000.000"));
        assert!(!settlement_verdict(false, "800.100.151"));
        assert!(!settlement_verdict(false, ""));
    }
}

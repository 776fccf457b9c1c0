//! Exit codes for the `sup` binary.
//!
//! Codes follow the BSD sysexits.h conventions where one fits; remote and
//! credential failures get their own codes above 100 so scripts can tell them
//! apart from local mistakes.

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupExitCode {
    /// Success (0)
    Success = 0,

    /// Command line usage error (64)
    UsageError = 64,

    /// Data format error (65) - input or response data could not be processed
    DataError = 65,

    /// Cannot open input file (66)
    NoInput = 66,

    /// Addressee unknown (67) - workspace or Superset resource not found
    NotFound = 67,

    /// Internal software error (70)
    SoftwareError = 70,

    /// Cannot create output file (73)
    CantCreate = 73,

    /// Configuration error (78)
    ConfigError = 78,

    /// Authentication error (100) - login, token or CSRF failure
    AuthError = 100,

    /// Network error (101) - no response from the server
    NetworkError = 101,

    /// API error (102) - Superset answered with an error status
    ApiError = 102,
}

impl SupExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn message(&self) -> &'static str {
        match self {
            SupExitCode::Success => "Success",
            SupExitCode::UsageError => "Command line usage error",
            SupExitCode::DataError => "Data format error",
            SupExitCode::NoInput => "Cannot open input file",
            SupExitCode::NotFound => "Resource not found",
            SupExitCode::SoftwareError => "Internal software error",
            SupExitCode::CantCreate => "Cannot create output file",
            SupExitCode::ConfigError => "Configuration error",
            SupExitCode::AuthError => "Authentication error",
            SupExitCode::NetworkError => "Network communication error",
            SupExitCode::ApiError => "Remote API error",
        }
    }
}

impl From<SupExitCode> for i32 {
    fn from(code: SupExitCode) -> Self {
        code.code()
    }
}

//! Parameter types handed to the core by the argument-parsing layer.
//!
//! # Design
//! `CreateParams` and `ReadParams` are built once per invocation and passed by
//! value. Range and membership checks (`ExpireToken`, `TRIES_RANGE`) live here
//! so the parsing layer and the tests share one definition, but the core
//! itself trusts what it is given.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Failed attempts the server tolerates before deleting a secret.
pub const DEFAULT_TRIES: u8 = 5;
pub const TRIES_RANGE: RangeInclusive<u8> = 3..=10;

/// How long the server keeps a secret before expiring it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpireToken {
    TenMinutes,
    ThirtyMinutes,
    OneHour,
    ThreeHours,
    SixHours,
    OneDay,
    TwoDays,
    #[default]
    ThreeDays,
    FiveDays,
    SevenDays,
}

impl ExpireToken {
    pub const ALL: [ExpireToken; 10] = [
        ExpireToken::TenMinutes,
        ExpireToken::ThirtyMinutes,
        ExpireToken::OneHour,
        ExpireToken::ThreeHours,
        ExpireToken::SixHours,
        ExpireToken::OneDay,
        ExpireToken::TwoDays,
        ExpireToken::ThreeDays,
        ExpireToken::FiveDays,
        ExpireToken::SevenDays,
    ];

    /// Wire form sent as `expire`.
    pub fn as_str(self) -> &'static str {
        match self {
            ExpireToken::TenMinutes => "10m",
            ExpireToken::ThirtyMinutes => "30m",
            ExpireToken::OneHour => "1h",
            ExpireToken::ThreeHours => "3h",
            ExpireToken::SixHours => "6h",
            ExpireToken::OneDay => "1d",
            ExpireToken::TwoDays => "2d",
            ExpireToken::ThreeDays => "3d",
            ExpireToken::FiveDays => "5d",
            ExpireToken::SevenDays => "7d",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            ExpireToken::TenMinutes => 10,
            ExpireToken::ThirtyMinutes => 30,
            ExpireToken::OneHour => 60,
            ExpireToken::ThreeHours => 3 * 60,
            ExpireToken::SixHours => 6 * 60,
            ExpireToken::OneDay => 24 * 60,
            ExpireToken::TwoDays => 2 * 24 * 60,
            ExpireToken::ThreeDays => 3 * 24 * 60,
            ExpireToken::FiveDays => 5 * 24 * 60,
            ExpireToken::SevenDays => 7 * 24 * 60,
        }
    }

    /// Whole days for the legacy `days` field, rounded up, never below one.
    pub fn days(self) -> u32 {
        self.minutes().div_ceil(24 * 60).max(1)
    }
}

impl fmt::Display for ExpireToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseExpireError(String);

impl fmt::Display for ParseExpireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accepted: Vec<&str> = ExpireToken::ALL.iter().map(|t| t.as_str()).collect();
        write!(
            f,
            "unknown expire window {:?}, expected one of: {}",
            self.0,
            accepted.join(", ")
        )
    }
}

impl std::error::Error for ParseExpireError {}

impl FromStr for ExpireToken {
    type Err = ParseExpireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ExpireToken::ALL
            .into_iter()
            .find(|token| token.as_str() == trimmed)
            .ok_or_else(|| ParseExpireError(s.to_string()))
    }
}

/// Inputs for the create flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub secret: String,
    pub passphrase: String,
    pub expire: ExpireToken,
    pub tries: u8,
    pub check_breached: bool,
}

impl CreateParams {
    /// Params with the documented defaults for everything but the secret and
    /// passphrase.
    pub fn new(secret: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            passphrase: passphrase.into(),
            expire: ExpireToken::default(),
            tries: DEFAULT_TRIES,
            check_breached: false,
        }
    }
}

/// Inputs for the read flow. The link decides the target server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadParams {
    pub link: String,
    pub passphrase: String,
}

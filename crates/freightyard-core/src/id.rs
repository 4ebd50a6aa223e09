use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::job::JobType;

/// One of the fixed stations of the rail network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum StationId {
    Csw,
    Cm,
    Ff,
    Fm,
    Frc,
    Frs,
    Gf,
    Hb,
    Hmb,
    Ime,
    Imw,
    Mf,
    Mb,
    Owc,
    Own,
    Sw,
    Sm,
}

impl StationId {
    /// Every station, in id order.
    pub const ALL: [StationId; 17] = [
        StationId::Csw,
        StationId::Cm,
        StationId::Ff,
        StationId::Fm,
        StationId::Frc,
        StationId::Frs,
        StationId::Gf,
        StationId::Hb,
        StationId::Hmb,
        StationId::Ime,
        StationId::Imw,
        StationId::Mf,
        StationId::Mb,
        StationId::Owc,
        StationId::Own,
        StationId::Sw,
        StationId::Sm,
    ];

    /// The short code used in job ids, track names and on the wire.
    pub fn code(self) -> &'static str {
        match self {
            StationId::Csw => "CSW",
            StationId::Cm => "CM",
            StationId::Ff => "FF",
            StationId::Fm => "FM",
            StationId::Frc => "FRC",
            StationId::Frs => "FRS",
            StationId::Gf => "GF",
            StationId::Hb => "HB",
            StationId::Hmb => "HMB",
            StationId::Ime => "IME",
            StationId::Imw => "IMW",
            StationId::Mf => "MF",
            StationId::Mb => "MB",
            StationId::Owc => "OWC",
            StationId::Own => "OWN",
            StationId::Sw => "SW",
            StationId::Sm => "SM",
        }
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StationId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StationId::ALL
            .into_iter()
            .find(|id| id.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseIdError::UnknownStation(s.to_string()))
    }
}

/// Errors from parsing identifiers supplied at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    #[error("unknown station code '{0}'")]
    UnknownStation(String),
}

/// Identifies a job: `<station>-<type-code>-<n>`.
///
/// The number is a per-station counter, so ids are unique network-wide and
/// deterministic for a given sequence of operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(station: StationId, job_type: JobType, number: u32) -> Self {
        Self(format!("{}-{}-{}", station, job_type.code(), number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A validated user identity. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

/// Rejected user identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("user name must not be empty")]
    Empty,
}

impl Username {
    pub fn new(name: impl AsRef<str>) -> Result<Self, IdentityError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Username::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

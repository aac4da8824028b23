//! Entity identity system using type-prefixed ULIDs, plus tenant scoping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityPrefix {
    /// Non-conformance report
    Ncr,
    /// Corrective/preventive action record
    Capa,
    /// Action item inside a CAPA
    Act,
    /// Containment action inside an NCR
    Cnt,
    /// Root cause analysis record
    Rca,
    /// CAPA verification record
    Ver,
    /// Effectiveness check
    Eff,
    /// Supplier qualification
    Sq,
    /// Quality inspection
    Qi,
    /// Check line inside an inspection
    Chk,
    /// Defect recorded during an inspection
    Def,
    /// Inspection checklist template
    Qcl,
    /// Defect code catalog entry
    Dfc,
    /// Certification
    Cert,
    /// Certification audit record
    Aud,
    /// Certification renewal record
    Rnw,
    /// Controlled quality document
    Doc,
    /// Supplier audit
    Sa,
    /// Supplier evaluation
    Eval,
    /// Certificate held by a supplier
    Scert,
    /// Supplier audit finding
    Fnd,
}

impl EntityPrefix {
    /// Get the string representation of the prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Ncr => "NCR",
            EntityPrefix::Capa => "CAPA",
            EntityPrefix::Act => "ACT",
            EntityPrefix::Cnt => "CNT",
            EntityPrefix::Rca => "RCA",
            EntityPrefix::Ver => "VER",
            EntityPrefix::Eff => "EFF",
            EntityPrefix::Sq => "SQ",
            EntityPrefix::Qi => "QI",
            EntityPrefix::Chk => "CHK",
            EntityPrefix::Def => "DEF",
            EntityPrefix::Qcl => "QCL",
            EntityPrefix::Dfc => "DFC",
            EntityPrefix::Cert => "CERT",
            EntityPrefix::Aud => "AUD",
            EntityPrefix::Rnw => "RNW",
            EntityPrefix::Doc => "DOC",
            EntityPrefix::Sa => "SA",
            EntityPrefix::Eval => "EVAL",
            EntityPrefix::Scert => "SCERT",
            EntityPrefix::Fnd => "FND",
        }
    }

    /// Get all valid prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[
            EntityPrefix::Ncr,
            EntityPrefix::Capa,
            EntityPrefix::Act,
            EntityPrefix::Cnt,
            EntityPrefix::Rca,
            EntityPrefix::Ver,
            EntityPrefix::Eff,
            EntityPrefix::Sq,
            EntityPrefix::Qi,
            EntityPrefix::Chk,
            EntityPrefix::Def,
            EntityPrefix::Qcl,
            EntityPrefix::Dfc,
            EntityPrefix::Cert,
            EntityPrefix::Aud,
            EntityPrefix::Rnw,
            EntityPrefix::Doc,
            EntityPrefix::Sa,
            EntityPrefix::Eval,
            EntityPrefix::Scert,
            EntityPrefix::Fnd,
        ]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        EntityPrefix::all()
            .iter()
            .copied()
            .find(|prefix| prefix.as_str() == upper)
            .ok_or_else(|| IdParseError::InvalidPrefix(s.to_string()))
    }
}

/// A unique entity identifier combining a type prefix and ULID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Create a new EntityId with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// Get the entity prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Parse an EntityId from a string
    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix_str, ulid_str) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::MissingDelimiter(s.to_string()))?;

        let prefix = prefix_str.parse()?;
        let ulid = Ulid::from_string(ulid_str)
            .map_err(|e| IdParseError::InvalidUlid(ulid_str.to_string(), e.to_string()))?;

        Ok(Self { prefix, ulid })
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Tenant (organization) scope. Every entity and counter is partitioned by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant id, rejecting blank values
    pub fn new(value: impl Into<String>) -> Result<Self, IdParseError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(IdParseError::EmptyTenant);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TenantId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TenantId::new(s)
    }
}

/// Errors that can occur when parsing entity IDs
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("invalid entity prefix: '{0}'")]
    InvalidPrefix(String),

    #[error("missing '-' delimiter in entity ID: '{0}'")]
    MissingDelimiter(String),

    #[error("invalid ULID '{0}': {1}")]
    InvalidUlid(String, String),

    #[error("tenant id must not be empty")]
    EmptyTenant,
}

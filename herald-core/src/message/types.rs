use std::fmt;

use derive_more::{AsRef, Display, From, Into};
use the_newtype::Newtype;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

/// Qualifier used by the agency owned protocol families
pub const AGENCY_QUALIFIER: &str = "did:sov:123456789abcdefghi1234";

/// Qualifier used by the community maintained protocol families
pub const COMMUNITY_QUALIFIER: &str = "did:sov:BzCbsNYhMrjHiqZDTUASHg";

/// Separator between the qualifier and the `family/version/name` path
pub const TYPE_DELIMITER: &str = ";spec/";

pub const MSG_STATUS_REPORT: &str = "status-report";
pub const MSG_PROBLEM_REPORT: &str = "problem-report";

pub const FIELD_TYPE: &str = "@type";
pub const FIELD_ID: &str = "@id";
pub const FIELD_THREAD: &str = "~thread";
pub const FIELD_THREAD_ID: &str = "thid";
pub const FIELD_FOR_RELATIONSHIP: &str = "~for_relationship";

/// MessageError is a base error types for the `message` module
#[derive(Debug, PartialEq, Error, Serialize, Deserialize, Clone)]
#[serde(crate = "self::serde")]
pub enum MessageError {
    #[error("invalid family: {0}")]
    InvalidFamily(String),

    #[error("malformed message type: {0}")]
    MalformedType(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("json error: {0}")]
    JSONError(String),
}

/// `Qualifier` is the namespace prefix of every message type string
///
/// The two well known values are fixed by the agent service, any other value is kept
/// as [`Qualifier::Custom`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    Agency,
    Community,
    Custom(String),
}

impl Qualifier {
    pub fn as_str(&self) -> &str {
        match self {
            Qualifier::Agency => AGENCY_QUALIFIER,
            Qualifier::Community => COMMUNITY_QUALIFIER,
            Qualifier::Custom(value) => value.as_str(),
        }
    }
}

impl From<&str> for Qualifier {
    fn from(value: &str) -> Self {
        match value {
            AGENCY_QUALIFIER => Qualifier::Agency,
            COMMUNITY_QUALIFIER => Qualifier::Community,
            _ => Qualifier::Custom(value.to_string()),
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation identifier shared by a request and all of its responses
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Newtype, From, Into, AsRef, Display,
)]
#[serde(crate = "self::serde")]
pub struct ThreadID(String);

impl ThreadID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ThreadID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

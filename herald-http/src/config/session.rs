use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

const DEFAULT_EXCHANGE_TIMEOUT_SECS: u64 = 60;

fn default_exchange_timeout() -> u64 {
    DEFAULT_EXCHANGE_TIMEOUT_SECS
}

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Session {
    /// Persisted context json, as written by provisioning
    pub(super) context_path: String,

    #[serde(default = "default_exchange_timeout")]
    pub(super) exchange_timeout_secs: u64,
}

impl Session {
    pub fn context_path(&self) -> String {
        self.context_path.to_owned()
    }

    pub fn exchange_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange_timeout_secs)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            context_path: "".to_string(),
            exchange_timeout_secs: DEFAULT_EXCHANGE_TIMEOUT_SECS,
        }
    }
}

impl ToValidate for Session {
    fn validate(&self) -> Result<(), CommonError> {
        if self.context_path.is_empty() {
            return Err(CommonError::ValidationError(
                "config: session:context_path is missing".to_string(),
            ));
        }

        if self.exchange_timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: session:exchange_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

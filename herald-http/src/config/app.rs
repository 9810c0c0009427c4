use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct App {
    pub(super) host: String,
    pub(super) port: String,

    /// Public url the agent posts its messages to, registered on startup when set
    #[serde(default)]
    pub(super) endpoint_url: Option<String>,
}

impl App {
    pub fn get_app_config(&self) -> (String, String) {
        (self.host.to_owned(), self.port.to_owned())
    }

    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint_url.to_owned()
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: "8080".to_string(),
            endpoint_url: None,
        }
    }
}

impl ToValidate for App {
    fn validate(&self) -> Result<(), CommonError> {
        if self.host.is_empty() {
            return Err(CommonError::ValidationError(
                "config: app:host is missing".to_string(),
            ));
        }

        if self.port.parse::<u16>().is_err() {
            return Err(CommonError::ValidationError(format!(
                "config: app:port is invalid: {}",
                self.port
            )));
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            if !endpoint_url.starts_with("http://") && !endpoint_url.starts_with("https://") {
                return Err(CommonError::ValidationError(format!(
                    "config: app:endpoint_url must be an http url: {}",
                    endpoint_url
                )));
            }
        }

        Ok(())
    }
}

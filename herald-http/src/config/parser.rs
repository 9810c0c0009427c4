use std::fs;

use crate::common::types::{CommonError, ToValidate};

use super::Config;

pub struct Parser {
    conf_file: String,
}

impl Parser {
    pub fn new(conf_file: String) -> Self {
        Self { conf_file }
    }

    /// Read, parse and validate the toml config file
    pub fn parse(&self) -> Result<Config, CommonError> {
        let raw = fs::read_to_string(&self.conf_file).map_err(|err| {
            CommonError::ConfigError(format!("unable to read {}: {}", self.conf_file, err))
        })?;

        let config: Config =
            toml::from_str(&raw).map_err(|err| CommonError::ConfigError(err.to_string()))?;

        config.validate()?;
        Ok(config)
    }
}

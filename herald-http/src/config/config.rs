use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{App, Session};

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) app: App,
    pub(super) session: Session,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        self.app.validate()?;
        self.session.validate()?;

        Ok(())
    }
}

use uuid::Uuid;

use crate::{Error, STUB_UUID};

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewSession {
    pub username: String,
    pub password: String,
}

impl NewSession {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.username)?;
        crate::validate_string(&self.password)?;
        Ok(())
    }
}

/// Opaque bearer token handed out by the server on login
#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken {
    pub token: String,
}

impl AuthToken {
    pub fn generate() -> AuthToken {
        AuthToken {
            token: Uuid::new_v4().to_string(),
        }
    }

    pub fn stub() -> AuthToken {
        AuthToken {
            token: STUB_UUID.to_string(),
        }
    }
}

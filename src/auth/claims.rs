use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;
use uuid::Uuid;

/// Refresh tokens share the signing key but never unlock meal data.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[cfg_attr(test, derive(Serialize))]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// Bearer token payload. Only verified here; `sub` owns every meal the
/// request touches.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct Claims {
    pub sub: Uuid,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

impl Claims {
    pub fn grants_meal_access(&self) -> bool {
        self.kind == TokenKind::Access
    }
}

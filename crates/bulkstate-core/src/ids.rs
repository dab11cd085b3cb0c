use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::MalformedIdentifier;
use crate::types::IdentifierSyntax;

/// A record identifier that passed the syntax check. Keeps the raw cell text
/// so outcomes can be matched back to dataset rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn parse(raw: &str, syntax: IdentifierSyntax) -> Result<Self, MalformedIdentifier> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(MalformedIdentifier {
                raw: raw.to_string(),
                reason: "identifier is blank".to_string(),
            });
        }
        if syntax == IdentifierSyntax::Uuid {
            Uuid::parse_str(token).map_err(|e| MalformedIdentifier {
                raw: raw.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical UUID form, when the token is one.
    pub fn as_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(self.0.trim()).ok()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

//! # Route Modules
//!
//! Each module exposes `router() -> Router<AppState>`; [`crate::app`]
//! merges them.

pub mod anchors;
pub mod commitments;

use serde::Deserialize;
use utoipa::IntoParams;

use crate::extractors::Validate;

/// `?identifier=...` query shared by the lookup routes.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdentifierQuery {
    /// Credential identifier, compared byte for byte.
    pub identifier: String,
}

impl Validate for IdentifierQuery {
    fn validate(&self) -> Result<(), String> {
        validate_identifier(&self.identifier)
    }
}

/// Identifiers are opaque; the only constraint is that they are non-empty.
pub(crate) fn validate_identifier(identifier: &str) -> Result<(), String> {
    if identifier.is_empty() {
        return Err("identifier must not be empty".to_string());
    }
    Ok(())
}

use tracing::{debug, warn};

use super::token::TokenConfig;
use crate::shared::AppError;

const MAX_NAME_LEN: usize = 32;

/// Who is behind a new connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Verified account id; `None` for guests.
    pub user_id: Option<String>,
    pub display_name: String,
}

pub struct IdentityService {
    tokens: TokenConfig,
    allow_guests: bool,
}

impl IdentityService {
    pub fn new(tokens: TokenConfig, allow_guests: bool) -> Self {
        Self {
            tokens,
            allow_guests,
        }
    }

    pub fn tokens(&self) -> &TokenConfig {
        &self.tokens
    }

    /// Verifies a presented token, or falls back to a guest identity.
    /// A name requested by the client only applies to guests.
    pub fn resolve(
        &self,
        token: Option<&str>,
        requested_name: Option<&str>,
    ) -> Result<Identity, AppError> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let claims = self.tokens.validate_token(token).map_err(|e| {
                warn!(error = %e, "Rejected player token");
                AppError::Unauthorized("Invalid token".to_string())
            })?;
            return Ok(Identity {
                user_id: Some(claims.sub),
                display_name: claims.name,
            });
        }

        if !self.allow_guests {
            return Err(AppError::Unauthorized(
                "Missing authentication token".to_string(),
            ));
        }

        let display_name = requested_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.chars().take(MAX_NAME_LEN).collect())
            .unwrap_or_else(|| petname::Petnames::default().generate_one(2, "-"));
        debug!(name = %display_name, "Guest identity issued");

        Ok(Identity {
            user_id: None,
            display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(allow_guests: bool) -> IdentityService {
        IdentityService::new(TokenConfig::new("secret".to_string(), 1), allow_guests)
    }

    #[test]
    fn test_token_identity() {
        let service = service(false);
        let token = service
            .tokens()
            .create_token("u-42".to_string(), "Dara".to_string())
            .unwrap();

        let identity = service.resolve(Some(&token), Some("ignored")).unwrap();
        assert_eq!(identity.user_id.as_deref(), Some("u-42"));
        assert_eq!(identity.display_name, "Dara");
    }

    #[test]
    fn test_bad_token_is_unauthorized_even_with_guests() {
        let result = service(true).resolve(Some("garbage"), None);
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_guest_names() {
        let service = service(true);
        let named = service.resolve(None, Some("  Nima ")).unwrap();
        assert_eq!(named.display_name, "Nima");
        assert!(named.user_id.is_none());

        let generated = service.resolve(None, None).unwrap();
        assert!(generated.display_name.contains('-'));
    }

    #[test]
    fn test_guests_disallowed() {
        assert!(matches!(
            service(false).resolve(None, Some("Nima")),
            Err(AppError::Unauthorized(_))
        ));
    }
}

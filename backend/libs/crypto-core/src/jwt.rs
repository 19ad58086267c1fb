/// JWT validation for the photo backend
///
/// Tokens are issued by the external identity service and signed with RS256.
/// This module only ever holds the public key: it verifies signatures and
/// expiry and hands back the claims.
///
/// ## Usage
///
/// ```rust,no_run
/// use crypto_core::jwt;
///
/// let public_key = jwt::load_validation_key().expect("JWT public key required");
/// jwt::initialize_jwt_validation_only(&public_key).expect("valid RSA public key");
///
/// let claims = jwt::validate_token("eyJ...").map(|data| data.claims);
/// ```
use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// JWT algorithm. Symmetric algorithms are never accepted.
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Token type accepted for API access
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by identity-service access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type: "access" or "refresh"
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub username: String,
}

fn default_token_type() -> String {
    ACCESS_TOKEN_TYPE.to_string()
}

static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Read the RS256 public key from `JWT_PUBLIC_KEY_PEM`, or from the file
/// named by `JWT_PUBLIC_KEY_FILE`.
pub fn load_validation_key() -> Result<String> {
    if let Ok(pem) = std::env::var("JWT_PUBLIC_KEY_PEM") {
        if !pem.trim().is_empty() {
            // Env files often carry the PEM with escaped newlines
            return Ok(pem.replace("\\n", "\n"));
        }
    }

    let path = std::env::var("JWT_PUBLIC_KEY_FILE")
        .map_err(|_| anyhow!("neither JWT_PUBLIC_KEY_PEM nor JWT_PUBLIC_KEY_FILE is set"))?;

    std::fs::read_to_string(&path)
        .map_err(|e| anyhow!("Failed to read JWT public key from {path}: {e}"))
}

/// Initialize the process-wide decoding key.
///
/// Can only be called once; subsequent calls return an error.
pub fn initialize_jwt_validation_only(public_key_pem: &str) -> Result<()> {
    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    tracing::debug!("JWT validation key initialized");
    Ok(())
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_validation_only() during startup.")
    })
}

/// Validate signature and expiry of a token (without the "Bearer " prefix).
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, decoding_key, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Validate a token and require it to be an access token.
pub fn validate_access_token(token: &str) -> Result<Claims> {
    let claims = validate_token(token)?.claims;
    if claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(anyhow!(
            "Expected an access token, got '{}'",
            claims.token_type
        ));
    }
    Ok(claims)
}

/// Authentication and authorization utilities
///
/// This module provides the security primitives for Taskboard:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`token`]: Opaque bearer token generation
/// - [`middleware`]: Axum middleware resolving bearer tokens to an
///   [`middleware::AuthContext`]
/// - [`policy`]: The authorization policy set: the predicates gating every
///   object-scoped operation, and the static table mapping each
///   (resource, action) pair to its rule
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::token::generate_token;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = generate_token();
/// assert_eq!(token.len(), 40);
/// # Ok(())
/// # }
/// ```

pub mod middleware;
pub mod password;
pub mod policy;
pub mod token;

use crate::models::User;

/// Identity attached to the request by the auth middleware. Carries the
/// token hash so logout can revoke exactly the presented token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token_hash: String,
}

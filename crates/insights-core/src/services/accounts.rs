use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{SignupInput, SignupOutcome, User};
use crate::error::{DomainError, RepoError, ValidationErrors};
use crate::ports::{PasswordService, UserRepository};

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Account signup and credential checks.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, passwords: Arc<dyn PasswordService>) -> Self {
        Self { users, passwords }
    }

    /// Register a new account.
    ///
    /// Stops at the first failing check. Duplicates found by the pre-flight
    /// lookups and duplicates reported by the store on insert both come back
    /// as validation errors.
    pub async fn signup(&self, input: SignupInput) -> Result<SignupOutcome, DomainError> {
        let username = input.username.trim().to_string();
        let email = input.email.as_deref().unwrap_or_default().trim().to_string();
        let password = input.password.unwrap_or_default();

        if username.chars().count() < USERNAME_MIN_LEN {
            return Err(invalid("username", "Username must be at least 3 characters."));
        }
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(invalid("password", "Password must be at least 8 characters."));
        }

        if self.users.exists_by_username(&username).await? {
            return Err(invalid("username", "Username is already taken."));
        }
        if !email.is_empty() && self.users.exists_by_email(&email).await? {
            return Err(invalid("email", "Email is already registered."));
        }

        let password_hash = self
            .passwords
            .hash(&password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let email = (!email.is_empty()).then_some(email);
        let created = match self.users.insert(User::new(username, email, password_hash)).await {
            Ok(user) => user,
            Err(RepoError::Duplicate(_)) => {
                return Err(invalid("detail", "User already exists."));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(SignupOutcome {
            id: created.id,
            username: created.username,
            email: created.email.unwrap_or_default(),
        })
    }

    /// Resolve a username/password pair to its account.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        if valid { Ok(user) } else { Err(DomainError::Unauthorized) }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users.find_by_id(id).await?.ok_or(DomainError::NotFound {
            entity_type: "User",
            id,
        })
    }
}

fn invalid(field: &str, message: &str) -> DomainError {
    DomainError::Validation(ValidationErrors::single(field, message))
}

//! `tallyboard-identity` — identity collaborator boundary.
//!
//! The contracts the session core consumes when establishing a session via
//! login: the user repository (signup + email lookup) with its unit-of-work
//! abstraction, the password hashing contract, and the credential
//! authentication flow. The session core never sees raw SQL or hashing
//! parameters; only records and booleans cross this boundary.

pub mod authenticate;
pub mod password;
pub mod repository;
pub mod unit_of_work;
pub mod user;

pub use authenticate::{AuthError, Authenticator};
pub use password::{Argon2Hasher, CredentialHasher, PasswordError};
pub use repository::{InMemoryUserRepository, RepositoryError, UserRepository};
pub use unit_of_work::{UnitOfWork, with_transaction};
pub use user::{NewUser, PasswordHashString, UserRecord};

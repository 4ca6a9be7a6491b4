pub mod credential_provider;

pub use credential_provider::{AuthError, CaseLogin, Credential, CredentialProvider};

// Credential check used by the login form

pub trait CredentialVerifier: Send + Sync {
    /// Exact, case-sensitive match of both fields.
    fn verify(&self, username: &str, password: &str) -> bool;
}

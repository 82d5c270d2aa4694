//! Credential verification seam
//!
//! The stored scheme is a verbatim comparison against the legacy
//! `usuarios` table. Swapping in a salted-hash scheme only requires a new
//! `CredentialScheme` implementation; no call site changes.

/// How a supplied password is checked against the stored credential.
pub trait CredentialScheme: Send + Sync {
    fn verify(&self, supplied: &str, stored: &str) -> bool;
}

/// Verbatim comparison against plaintext storage (known weakness of the
/// legacy user table, isolated here on purpose).
pub struct PlaintextScheme;

impl CredentialScheme for PlaintextScheme {
    fn verify(&self, supplied: &str, stored: &str) -> bool {
        supplied == stored
    }
}

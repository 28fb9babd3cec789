use crate::config::GradingScheme;
use sha2::{Digest, Sha256};

/// Decides whether a session may be unlocked with a credential.
pub trait AccessPolicy {
    /// Whether new sessions start locked.
    fn requires_credential(&self) -> bool;
    fn verify(&self, credential: &str) -> bool;
}

/// No gate: sessions open unlocked and every credential passes.
pub struct OpenAccess;

impl AccessPolicy for OpenAccess {
    fn requires_credential(&self) -> bool {
        false
    }

    fn verify(&self, _credential: &str) -> bool {
        true
    }
}

/// Shared credential known only by its SHA-256 digest.
pub struct DigestPolicy {
    digest: [u8; 32],
}

impl DigestPolicy {
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        if hex.len() != 64 {
            return None;
        }
        let mut digest = [0u8; 32];
        for (i, byte) in digest.iter_mut().enumerate() {
            *byte = u8::from_str_radix(hex.get(2 * i..2 * i + 2)?, 16).ok()?;
        }
        Some(Self { digest })
    }
}

impl AccessPolicy for DigestPolicy {
    fn requires_credential(&self) -> bool {
        true
    }

    fn verify(&self, credential: &str) -> bool {
        let actual = Sha256::digest(credential.as_bytes());
        // Constant-time compare.
        actual
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

pub fn policy_for(scheme: &GradingScheme) -> Box<dyn AccessPolicy> {
    match scheme
        .credential_sha256
        .as_deref()
        .and_then(DigestPolicy::from_hex)
    {
        Some(p) => Box::new(p),
        None => Box::new(OpenAccess),
    }
}

//! Ticket and access-code credentials.
//!
//! A report is located by its public **ticket** and unlocked by its secret
//! **access code**. Both are minted from the OS CSPRNG; only the Argon2id
//! hash of the code is ever persisted.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, Rng};
use tipline_common::{AppError, AppResult, CodePolicy, CredentialConfig};

/// Ticket alphabet. Excludes 0/O and 1/I/L so a ticket survives being read
/// aloud or copied by hand.
pub const TICKET_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Alphabet for alphanumeric access codes.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Alphabet for numeric access codes.
const DIGITS: &[u8] = b"0123456789";

/// Mints tickets and access codes.
///
/// Generation is pure: characters are drawn independently and uniformly from
/// the OS entropy source, so an identifier carries no counter, timestamp, or
/// other information about the report it will name.
#[derive(Debug, Clone)]
pub struct CredentialMinter {
    ticket_length: usize,
    code_policy: CodePolicy,
    code_length: usize,
}

impl CredentialMinter {
    /// Create a minter from validated credential configuration.
    #[must_use]
    pub const fn new(config: &CredentialConfig) -> Self {
        Self {
            ticket_length: config.ticket_length,
            code_policy: config.code_policy,
            code_length: config.code_length,
        }
    }

    /// Mint a public ticket identifier.
    #[must_use]
    pub fn mint_ticket(&self) -> String {
        Self::draw(TICKET_ALPHABET, self.ticket_length)
    }

    /// Mint a secret access code.
    #[must_use]
    pub fn mint_access_code(&self) -> String {
        match self.code_policy {
            CodePolicy::Alphanumeric => Self::draw(CODE_ALPHABET, self.code_length),
            CodePolicy::Numeric => Self::draw(DIGITS, self.code_length),
        }
    }

    /// Check that a presented ticket has the shape this minter produces.
    ///
    /// Lets the boundary reject malformed tickets as validation errors
    /// without a store round-trip.
    #[must_use]
    pub fn ticket_shape_ok(&self, ticket: &str) -> bool {
        ticket.len() == self.ticket_length
            && ticket.bytes().all(|b| TICKET_ALPHABET.contains(&b))
    }

    fn draw(alphabet: &[u8], length: usize) -> String {
        let mut rng = OsRng;
        (0..length)
            .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
            .collect()
    }
}

/// One-way hasher for access codes.
///
/// Argon2id with per-call random salts; cost parameters come from
/// configuration and travel inside the PHC string, so they can be retuned
/// without touching stored rows.
#[derive(Debug, Clone)]
pub struct CodeHasher {
    argon2: Argon2<'static>,
}

impl CodeHasher {
    /// Create a hasher from configured Argon2 parameters.
    pub fn new(config: &CredentialConfig) -> AppResult<Self> {
        let params = Params::new(
            config.argon2.memory_kib,
            config.argon2.time_cost,
            config.argon2.parallelism,
            None,
        )
        .map_err(|e| AppError::Config(format!("Invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash an access code for storage.
    pub fn hash(&self, code: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);

        self.argon2
            .hash_password(code.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash access code: {e}")))
    }

    /// Verify a presented code against a stored hash.
    ///
    /// A stored hash that fails to parse is a verification failure, not an
    /// error: a corrupt row must not abort the caller's flow, and the
    /// response stays identical to a wrong code. Comparison is the
    /// algorithm's own constant-time check.
    #[must_use]
    pub fn verify(&self, code: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };

        self.argon2
            .verify_password(code.as_bytes(), &parsed)
            .is_ok()
    }
}

use crate::error::PasswordError;
use aws_lc_rs::pbkdf2;
use std::fmt::{Debug, Display};
use std::num::NonZeroU32;
use std::str::FromStr;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = 32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;

///
/// One-way salted hash of a record access password.
///
/// Stored as `pbkdf2-sha256${iterations}${salt hex}${hash hex}`.
/// The clear password is never kept after hashing.
///
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    iterations: NonZeroU32,
    salt: Vec<u8>,
    credential: Vec<u8>,
}

impl PasswordHash {
    pub fn new(password: &str) -> PasswordHash {
        let salt: [u8; SALT_LEN] = rand::random();
        let iterations = NonZeroU32::new(ITERATIONS).unwrap_or(NonZeroU32::MIN);

        let mut credential = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            ALGORITHM,
            iterations,
            &salt,
            password.as_bytes(),
            &mut credential,
        );

        PasswordHash {
            iterations,
            salt: salt.to_vec(),
            credential: credential.to_vec(),
        }
    }

    ///
    /// Constant-time comparison of a supplied password against this hash
    ///
    pub fn verify(&self, password: &str) -> bool {
        pbkdf2::verify(
            ALGORITHM,
            self.iterations,
            &self.salt,
            password.as_bytes(),
            &self.credential,
        )
        .is_ok()
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(&self.salt),
            hex::encode(&self.credential)
        )
    }
}

///
/// Hash is NEVER displayed in debug output
///
impl Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PasswordHash({SCHEME}, ..)")
    }
}

impl FromStr for PasswordHash {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('$');

        let (Some(SCHEME), Some(iterations), Some(salt), Some(credential), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(PasswordError::Malformed);
        };

        let iterations = iterations
            .parse::<NonZeroU32>()
            .map_err(|_| PasswordError::Malformed)?;
        let salt = hex::decode(salt).map_err(|_| PasswordError::Malformed)?;
        let credential = hex::decode(credential).map_err(|_| PasswordError::Malformed)?;

        if salt.is_empty() || credential.len() != CREDENTIAL_LEN {
            return Err(PasswordError::Malformed);
        }

        Ok(PasswordHash {
            iterations,
            salt,
            credential,
        })
    }
}

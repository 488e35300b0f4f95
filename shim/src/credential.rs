//! Static access token for the release host.
//!
//! The token is stored ROT13-encoded so it does not appear verbatim in the
//! binary's string table. This is obfuscation only: anyone holding the binary
//! can recover the token, so it must be a narrowly scoped, read-only token.
//!
//! The checked-in value is a placeholder. Release builds bake in the real
//! encoded token through the `MINIMAL_SHIM_OBFUSCATED_TOKEN` variable at
//! compile time; nothing is read from the environment at run time.

use secrecy::{ExposeSecret, SecretString};

/// ROT13 encoding of `ghp_placeholder`.
const PLACEHOLDER_TOKEN: &str = "tuc_cynprubyqre";

/// The obfuscated token compiled into this binary.
const OBFUSCATED_TOKEN: &str = match option_env!("MINIMAL_SHIM_OBFUSCATED_TOKEN") {
    Some(token) => token,
    None => PLACEHOLDER_TOKEN,
};

/// Rotates ASCII letters by 13 positions, leaving every other character as is.
///
/// The transform is its own inverse.
///
/// # Examples
///
/// ```
/// use minimal_shim::credential::rot13;
///
/// assert_eq!(rot13("Uryyb, Jbeyq! 123"), "Hello, World! 123");
/// assert_eq!(rot13(&rot13("token")), "token");
/// ```
#[must_use]
pub fn rot13(input: &str) -> String {
    input.chars().map(rotate_char).collect()
}

fn rotate_char(c: char) -> char {
    let base = match c {
        'a'..='z' => b'a',
        'A'..='Z' => b'A',
        _ => return c,
    };
    let offset = (c as u8 - base + 13) % 26;
    char::from(base + offset)
}

/// Bearer token used for every call to the release host.
///
/// Built once in the entry point and handed to the release API client, so
/// tests can run the pipeline without one.
#[derive(Clone)]
pub struct Credential {
    token: SecretString,
}

impl Credential {
    /// Decodes the token compiled into this binary.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_obfuscated(OBFUSCATED_TOKEN)
    }

    /// Decodes a ROT13-obfuscated token.
    #[must_use]
    pub fn from_obfuscated(obfuscated: &str) -> Self {
        Self {
            token: SecretString::from(rot13(obfuscated)),
        }
    }

    /// Value for the `Authorization` header.
    ///
    /// The result contains the secret; never log it.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

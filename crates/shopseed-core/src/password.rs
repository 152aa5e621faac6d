use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

const ALGORITHM: &str = "pbkdf2_sha256";

/// PBKDF2 rounds used by Django 5.2's default hasher.
pub const DEFAULT_ITERATIONS: u32 = 1_000_000;

/// Encode a password in Django's `pbkdf2_sha256` format:
/// `pbkdf2_sha256$<iterations>$<salt>$<base64 digest>`.
///
/// `salt` must not contain `$`.
pub fn hash_password(password: &str, salt: &str, iterations: u32) -> String {
    let mut digest = [0_u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut digest);
    format!("{ALGORITHM}${iterations}${salt}${}", STANDARD.encode(digest))
}

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;

/// Key holding the per-environment credential encryption key.
pub const ENCRYPTION_KEY: &str = "ENCRYPTION_KEY";

/// Number of random bytes behind [`ENCRYPTION_KEY`].
pub const ENCRYPTION_KEY_BYTES: usize = 32;

/// Optional third-party API keys the operator may supply at start.
pub const OPTIONAL_API_KEYS: &[&str] = &["OPENAI_API_KEY", "MISTRAL_API_KEY"];

/// 32 bytes from the OS CSPRNG, base64 encoded (44 characters).
pub fn generate_encryption_key() -> String {
    let mut bytes = [0u8; ENCRYPTION_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Show only enough of a secret to recognise it in output.
pub fn mask_value(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Hashes a PIN with a random salt, stored as `<hex salt>$<hex digest>`.
pub fn hash_pin(pin: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex_encode(&salt), digest_hex(&salt, pin))
}

/// Checks a PIN against a stored `salt$digest` pair. Malformed stored values
/// never match.
pub fn verify_pin(stored: &str, pin: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = hex_decode(salt_hex) else {
        return false;
    };
    let actual = digest_hex(&salt, pin);

    // Comparison does not short-circuit.
    actual.len() == expected.len()
        && actual
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest_hex(salt: &[u8], pin: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt)
        .chain_update(pin.as_bytes())
        .finalize();
    hex_encode(&digest)
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

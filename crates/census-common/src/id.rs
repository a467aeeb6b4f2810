//! Installation identity.
//!
//! Every submission carries a pseudonymous identifier so the receiving side
//! can deduplicate without learning who submitted. The identifier is the
//! lowercase hex SHA-256 of the host machine id salted with the current
//! username: stable for one installation, different per user on shared
//! machines, and not reversible to either input.

use sha2::{Digest, Sha256};
use std::env;
use std::fs;

const MACHINE_ID_PATH: &str = "/etc/machine-id";
const DBUS_MACHINE_ID_PATH: &str = "/var/lib/dbus/machine-id";
const HOSTNAME_PATH: &str = "/etc/hostname";

/// Derive an installation identifier from host-specific data and a salt.
///
/// Pure function: same inputs, same identifier. Inputs are trimmed so that
/// trailing newlines from `/etc/machine-id` do not change the digest.
pub fn derive_identifier(machine_id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(machine_id.trim().as_bytes());
    hasher.update(salt.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Read the host machine id.
///
/// Falls back from `/etc/machine-id` to the legacy D-Bus location, then to
/// the hostname. An empty string is the last resort; the identifier is then
/// only as unique as the salt, which is still a valid (if weak) pseudonym.
pub fn machine_id() -> String {
    for path in [MACHINE_ID_PATH, DBUS_MACHINE_ID_PATH, HOSTNAME_PATH] {
        if let Ok(contents) = fs::read_to_string(path) {
            let contents = contents.trim();
            if !contents.is_empty() {
                return contents.to_string();
            }
        }
    }
    String::new()
}

/// The installation identifier for the current host and user.
pub fn installation_id() -> String {
    let user = env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .unwrap_or_default();
    derive_identifier(&machine_id(), &user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_deterministic() {
        let a = derive_identifier("8f0cdd9c35f44a1f9a2c7d6b3e581c70", "alice");
        let b = derive_identifier("8f0cdd9c35f44a1f9a2c7d6b3e581c70", "alice");
        assert_eq!(a, b);
    }

    #[test]
    fn identifier_is_hex_sha256() {
        let id = derive_identifier("8f0cdd9c35f44a1f9a2c7d6b3e581c70", "alice");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, id.to_lowercase());
    }

    #[test]
    fn salt_changes_identifier() {
        let machine = "8f0cdd9c35f44a1f9a2c7d6b3e581c70";
        assert_ne!(
            derive_identifier(machine, "alice"),
            derive_identifier(machine, "bob")
        );
    }

    #[test]
    fn machine_id_changes_identifier() {
        assert_ne!(
            derive_identifier("8f0cdd9c35f44a1f9a2c7d6b3e581c70", "alice"),
            derive_identifier("11f3b7a0d4e24c6bb0a1558e9d7f2c03", "alice")
        );
    }

    #[test]
    fn trailing_newline_is_ignored() {
        assert_eq!(
            derive_identifier("8f0cdd9c35f44a1f9a2c7d6b3e581c70\n", "alice"),
            derive_identifier("8f0cdd9c35f44a1f9a2c7d6b3e581c70", "alice")
        );
    }

    #[test]
    fn installation_id_is_stable_within_a_run() {
        assert_eq!(installation_id(), installation_id());
    }
}

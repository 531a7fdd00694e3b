//! Opaque per-login device identifiers.

use uuid::Uuid;

/// Mint a fresh device id: 32 lowercase hex characters from a random UUID.
///
/// Never derived from client input; every login gets a new one.
pub fn new_device_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn device_ids_are_hex_and_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_device_id()).collect();
        assert_eq!(ids.len(), 1000);
        for id in &ids {
            assert_eq!(id.len(), 32);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }
}

//! OTAA root identifiers for new end devices
//!
//! A device joining over the air needs three values provisioned both in its
//! firmware and on the network:
//! - DevEUI: random, unique per device
//! - JoinEUI (AppEUI): fixed for every device of this product
//! - AppKey: random AES-128 root key

use rand::RngCore;
use std::fmt;

/// JoinEUI shared by every device this tool registers
pub const JOIN_EUI: Eui64 = Eui64([0xBE, 0xEF, 0xBE, 0xEF, 0xF0, 0x0D, 0xF0, 0x0D]);

/// 64-bit Extended Unique Identifier (DevEUI / JoinEUI)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eui64(pub [u8; 8]);

impl Eui64 {
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 8];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

/// Uppercase hex, the form the TTN API expects
impl fmt::Display for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}

/// LoRaWAN 1.0.x AppKey (AES-128)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AppKey(pub [u8; 16]);

impl AppKey {
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex_upper(&self) -> String {
        hex::encode_upper(self.0)
    }
}

// Keep the key out of debug logs of surrounding structs
impl fmt::Debug for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppKey(..)")
    }
}

/// Freshly generated identity of one end device
#[derive(Debug, Clone)]
pub struct DeviceKeys {
    pub dev_eui: Eui64,
    pub join_eui: Eui64,
    pub app_key: AppKey,
}

impl DeviceKeys {
    /// Draw a new DevEUI and AppKey; the JoinEUI is always [`JOIN_EUI`].
    pub fn generate<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let dev_eui = Eui64::random(rng);
        let app_key = AppKey::random(rng);
        Self {
            dev_eui,
            join_eui: JOIN_EUI,
            app_key,
        }
    }

    /// Device id used when no name was given: lowercase hex DevEUI
    pub fn default_device_id(&self) -> String {
        hex::encode(self.dev_eui.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_eui_constant() {
        assert_eq!(JOIN_EUI.to_string(), "BEEFBEEFF00DF00D");
        assert_eq!(
            JOIN_EUI.as_bytes().to_vec(),
            hex::decode("BEEFBEEFF00DF00D").unwrap()
        );
    }

    #[test]
    fn test_generate_sizes_and_fixed_join_eui() {
        let mut rng = rand::thread_rng();
        let keys = DeviceKeys::generate(&mut rng);

        assert_eq!(keys.dev_eui.as_bytes().len(), 8);
        assert_eq!(keys.app_key.as_bytes().len(), 16);
        assert_eq!(keys.join_eui, JOIN_EUI);
        assert_eq!(keys.dev_eui.to_string().len(), 16);
        assert_eq!(keys.app_key.to_hex_upper().len(), 32);
    }

    #[test]
    fn test_generate_is_random() {
        let mut rng = rand::thread_rng();
        let a = DeviceKeys::generate(&mut rng);
        let b = DeviceKeys::generate(&mut rng);

        assert_ne!(a.dev_eui, b.dev_eui);
        assert_ne!(a.app_key, b.app_key);
        assert_eq!(a.join_eui, b.join_eui);
    }

    #[test]
    fn test_default_device_id_is_lowercase_hex() {
        let keys = DeviceKeys {
            dev_eui: Eui64([0x00, 0x11, 0x22, 0x33, 0xAA, 0xBB, 0xCC, 0xDD]),
            join_eui: JOIN_EUI,
            app_key: AppKey([0u8; 16]),
        };
        assert_eq!(keys.default_device_id(), "00112233aabbccdd");
        assert_eq!(keys.dev_eui.to_string(), "00112233AABBCCDD");
    }

    #[test]
    fn test_app_key_debug_is_redacted() {
        let key = AppKey([0xAB; 16]);
        assert_eq!(format!("{:?}", key), "AppKey(..)");
    }
}

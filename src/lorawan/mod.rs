pub mod keys;

pub use keys::DeviceKeys;

/// Render bytes as C array literal items, e.g. `[0x01, 0xAB]` → `"0x01, 0xab, "`.
///
/// Every byte is followed by `", "` so the output can be pasted straight into
/// a firmware initializer such as `static const u1_t DEVEUI[8] = { ... };`.
pub fn c_hex_literals(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("0x{:02x}, ", b)).collect()
}

/// Generate an opaque password-reset token: 32 random bytes (256 bits of
/// entropy), hex encoded. The bearer of this string is the reset capability.
pub fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

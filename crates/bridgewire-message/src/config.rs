/// Controls message encoding behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// When true, encoding fails with `MessageError::ReservedString` if a
    /// genuine string value matches the placeholder grammar (`@` + digits).
    /// When false such strings are sent as-is and a receiver may substitute
    /// a blob into them.
    pub reject_reserved_strings: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            reject_reserved_strings: true,
        }
    }
}

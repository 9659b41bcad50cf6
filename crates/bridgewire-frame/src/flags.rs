//! Part header flags.

/// Another part of the same unit follows this one.
pub const MORE: u16 = 0x0001;

/// Every flag bit this version understands.
pub const KNOWN_FLAGS: u16 = MORE;

/// Flag word for a part.
pub fn for_part(more: bool) -> u16 {
    if more {
        MORE
    } else {
        0
    }
}

/// Returns true if the flag word marks a continuation.
pub fn has_more(flags: u16) -> bool {
    flags & MORE != 0
}

/// Returns the bits outside [`KNOWN_FLAGS`], if any.
pub fn unknown_bits(flags: u16) -> Option<u16> {
    let unknown = flags & !KNOWN_FLAGS;
    (unknown != 0).then_some(unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn more_flag_roundtrip() {
        assert!(has_more(for_part(true)));
        assert!(!has_more(for_part(false)));
    }

    #[test]
    fn unknown_bits_detected() {
        assert_eq!(unknown_bits(MORE), None);
        assert_eq!(unknown_bits(0), None);
        assert_eq!(unknown_bits(0x0102), Some(0x0100));
    }
}

//! Single-byte (ISO-8859-1) text encoding for chart files

/// Byte written for characters outside the codepage
pub const SUBSTITUTE: u8 = b'?';

/// Encoded bytes and the number of substituted characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub substituted: usize,
}

/// Encode to ISO-8859-1, replacing unmappable characters
pub fn encode(text: &str) -> Encoded {
    let mut bytes = Vec::with_capacity(text.len());
    let mut substituted = 0;
    for c in text.chars() {
        match u8::try_from(c as u32) {
            Ok(b) => bytes.push(b),
            Err(_) => {
                bytes.push(SUBSTITUTE);
                substituted += 1;
            }
        }
    }
    Encoded { bytes, substituted }
}

/// Decode ISO-8859-1 bytes; every byte maps to one character
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let enc = encode("#00113: 0A00\n");
        assert_eq!(enc.bytes, b"#00113: 0A00\n");
        assert_eq!(enc.substituted, 0);
    }

    #[test]
    fn test_latin1_kept() {
        let enc = encode("Caf\u{e9}");
        assert_eq!(enc.bytes, vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(decode(&enc.bytes), "Caf\u{e9}");
    }

    #[test]
    fn test_substitution() {
        let enc = encode("\u{66f2}A\u{1F941}");
        assert_eq!(enc.bytes, b"?A?");
        assert_eq!(enc.substituted, 2);
    }
}

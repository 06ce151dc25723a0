//! Fixed-width radix-36 numbers used for sample indices

/// Digits in upper case, as players write them
const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest value that fits in two digits
pub const MAX_PAIR: u16 = 36 * 36 - 1;

/// Value of one base-36 digit (either case)
pub fn digit_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u32),
        b'A'..=b'Z' => Some((c - b'A') as u32 + 10),
        b'a'..=b'z' => Some((c - b'a') as u32 + 10),
        _ => None,
    }
}

/// Encode as exactly two zero-padded digits, `None` above `MAX_PAIR`
pub fn encode_pair(value: u16) -> Option<[u8; 2]> {
    if value > MAX_PAIR {
        return None;
    }
    Some([
        DIGITS[(value / 36) as usize],
        DIGITS[(value % 36) as usize],
    ])
}

/// Append the two-digit form of `value` to `out`
pub fn push_pair(out: &mut String, value: u16) -> bool {
    match encode_pair(value) {
        Some(pair) => {
            out.push(pair[0] as char);
            out.push(pair[1] as char);
            true
        }
        None => false,
    }
}

/// Two-digit string form, used in declaration names such as `#WAV0A`
pub fn pair_string(value: u16) -> Option<String> {
    let mut out = String::with_capacity(2);
    push_pair(&mut out, value).then_some(out)
}

/// Decode a base-36 string of any length
pub fn decode(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.bytes().try_fold(0u32, |acc, c| {
        let digit = digit_value(c)?;
        acc.checked_mul(36)?.checked_add(digit)
    })
}

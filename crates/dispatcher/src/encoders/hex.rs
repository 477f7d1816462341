//! Hex helpers for identifiers and raw packets

pub(crate) fn decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err(format!("odd-length hex string '{s}'"));
    }
    s.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = nibble(pair[0]);
            let lo = nibble(pair[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                _ => Err(format!("invalid hex string '{s}'")),
            }
        })
        .collect()
}

pub(crate) fn encode(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(DIGITS[(b >> 4) as usize] as char);
        out.push(DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_case_decodes_to_lowercase() {
        let bytes = decode("FEe150BADA55").unwrap();
        assert_eq!(bytes, vec![0xfe, 0xe1, 0x50, 0xba, 0xda, 0x55]);
        assert_eq!(encode(&bytes), "fee150bada55");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(decode("abc").is_err());
        assert!(decode("zz").is_err());
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }
}

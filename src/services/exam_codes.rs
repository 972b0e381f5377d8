use rand::Rng;

// No 0/O/1/I to keep codes readable when dictated.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 8;

/// Short shareable exam code, e.g. "EX-7KQWM2RT".
pub(crate) fn generate_unique_code() -> String {
    let mut rng = rand::thread_rng();
    let mut suffix = String::with_capacity(CODE_LEN);
    for _ in 0..CODE_LEN {
        let index = rng.gen_range(0..ALPHABET.len());
        suffix.push(ALPHABET[index] as char);
    }
    format!("EX-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_expected_shape() {
        let code = generate_unique_code();
        assert!(code.starts_with("EX-"));
        assert_eq!(code.len(), 3 + CODE_LEN);
        assert!(code[3..].bytes().all(|byte| ALPHABET.contains(&byte)));
    }
}

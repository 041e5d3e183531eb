//! Bounded string helpers.

use heapless::String;

/// Copies as many whole chars of `text` as fit into `N` bytes.
pub fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    push_truncated(&mut out, text);
    out
}

/// Appends whole chars of `text` until `out` is full. Returns `false` if
/// anything was cut.
pub fn push_truncated<const N: usize>(out: &mut String<N>, text: &str) -> bool {
    for ch in text.chars() {
        if out.push(ch).is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuts_before_multibyte_char() {
        let out = truncated::<4>("abcé");
        assert_eq!(out.as_str(), "abc");
    }

    #[test]
    fn reports_when_text_was_cut() {
        let mut out = String::<8>::new();
        assert!(push_truncated(&mut out, "Maison"));
        assert!(!push_truncated(&mut out, " ok"));
        assert_eq!(out.as_str(), "Maison o");
    }
}

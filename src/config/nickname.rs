//! Fallback nickname for configs that do not set one.

use rand::RngExt;

/// `ferric` plus three random digits, e.g. `ferric042`. Nine characters, the
/// traditional IRC nick limit.
pub fn fallback_nickname() -> String {
    let mut rng = rand::rng();
    let num: u16 = rng.random_range(0..1000);
    format!("ferric{:03}", num)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_nickname_shape() {
        let nick = fallback_nickname();
        assert_eq!(nick.len(), 9);
        assert!(nick.starts_with("ferric"));
        assert!(nick[6..].bytes().all(|b| b.is_ascii_digit()));
    }
}

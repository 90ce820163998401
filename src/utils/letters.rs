use rand::Rng;

/// Letters used for puzzle content and filler cells
pub const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Pick a filler letter, uniformly over the alphabet
pub fn random_letter(rng: &mut impl Rng) -> char {
    ALPHABET[rng.random_range(0..ALPHABET.len())] as char
}

pub fn is_puzzle_letter(letter: char) -> bool {
    letter.is_ascii_uppercase()
}

/// Turn a raw word-list entry into puzzle form: spaces removed, upper-cased.
/// Returns `None` when anything other than ASCII letters remains.
pub fn normalize_word(raw: &str) -> Option<String> {
    let word: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if word.is_empty() || !word.chars().all(is_puzzle_letter) {
        return None;
    }

    Some(word)
}

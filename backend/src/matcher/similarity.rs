//! Scoring helpers for the fuzzy fallback. Every score is in `[0, 1]`.

/// Normalised Levenshtein similarity over the uppercase letters of both
/// names, so "O'Brien" and "OBRIEN" compare equal.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = letters(a);
    let b: Vec<char> = letters(b);
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

/// Positional agreement of two equally long strings, such as two canonical
/// URNs. One mistyped digit in a canonical URN still scores 0.9375.
pub fn sequence_similarity(a: &str, b: &str) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let same = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    same as f64 / a.chars().count() as f64
}

fn letters(s: &str) -> Vec<char> {
    s.chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(|c| c.to_uppercase())
        .collect()
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_score_one() {
        assert_eq!(name_similarity("Smith", "SMITH"), 1.0);
        assert_eq!(name_similarity("O'Brien", "obrien"), 1.0);
    }

    #[test]
    fn one_typo_in_five_letters() {
        let score = name_similarity("Smith", "Smyth");
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn empty_names_never_match() {
        assert_eq!(name_similarity("", ""), 0.0);
        assert_eq!(name_similarity("", "Smith"), 0.0);
    }

    #[test]
    fn levenshtein_distances() {
        let kitten: Vec<char> = "kitten".chars().collect();
        let sitting: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&kitten, &sitting), 3);
        assert_eq!(levenshtein(&kitten, &[]), 6);
    }

    #[test]
    fn sequence_similarity_counts_positions() {
        assert_eq!(sequence_similarity("1234567", "1234567"), 1.0);
        assert!((sequence_similarity("1234567", "1234568") - 6.0 / 7.0).abs() < 1e-9);
        assert_eq!(sequence_similarity("1234567", "12345"), 0.0);
    }
}

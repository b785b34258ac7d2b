use hashbrown::HashMap;
use ndarray::Array1;
use ndarray_stats::DeviationExt;
use unicode_normalization::UnicodeNormalization;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Relative letter frequencies of English texts.
const ENGLISH: [f64; 26] = [
    0.08167, 0.01492, 0.02782, 0.04253, 0.12702, 0.02228, 0.02015,
    0.06094, 0.06966, 0.00253, 0.01772, 0.04025, 0.02406, 0.06749,
    0.07507, 0.01929, 0.00950, 0.05987, 0.06327, 0.09056, 0.02758,
    0.00978, 0.02360, 0.00250, 0.01974, 0.00074,
];

#[inline]
fn frequencies(text: &str) -> HashMap<char, u64> {
    text.nfc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| ALPHABET.contains(*c))
        .fold(HashMap::new(), |mut freqs, value| {
            freqs
                .entry(value)
                .and_modify(|entry| *entry += 1)
                .or_insert(1);
            freqs
        })
}

/// Returns the euclidean distance between the letter distribution of
/// the text and the distribution of English texts.
///
/// Only the letters `a` to `z` are taken into account; a text without
/// any of them has no distance.
pub(crate) fn english_distance(text: &str) -> Option<f64> {
    let freqs = frequencies(text);
    let n = freqs.values().sum::<u64>() as f64;
    if n <= 0.0 {
        return None;
    }

    let x = Array1::from_iter(
        ALPHABET
            .chars()
            .map(|c| *freqs.get(&c).unwrap_or(&0) as f64 / n),
    );

    let y = Array1::from_vec(ENGLISH.to_vec());
    x.l2_dist(&y).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequencies() {
        let freqs = super::frequencies("Abca 1!");

        assert_eq!(freqs.get(&'a').unwrap(), &2);
        assert_eq!(freqs.get(&'b').unwrap(), &1);
        assert_eq!(freqs.get(&'c').unwrap(), &1);
        assert_eq!(freqs.len(), 3);
    }

    #[test]
    fn english_distance_of_texts() {
        let english = english_distance(
            "This is a lovely sunny day and I am so happy to be here \
                with all of my friends at the beach",
        )
        .unwrap();

        let spanish = english_distance(
            "Hoy es un día muy bonito y estoy feliz en la playa con \
                mis amigos de siempre",
        )
        .unwrap();

        assert!(english < 0.11);
        assert!(spanish > 0.11);
        assert!(english_distance("123 !!!").is_none());
    }
}

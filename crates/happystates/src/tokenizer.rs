use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Splits the text of a post into words.
///
/// The text is normalized (NFC) and lowercased. URLs and user
/// mentions are removed and hashtags are reduced to their word. A word
/// is a run of word characters and apostrophes; a run of two or more
/// equal characters is shortened to two ("sooooo" becomes "soo"). Each
/// word is cut at its first apostrophe ("don't" becomes "don").
/// Words starting with a digit are dropped.
#[derive(Debug)]
pub(crate) struct Tokenizer {
    noise: Regex,
    word: Regex,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self {
            noise: Regex::new(r"https?://\S+|www\.\S+|@\S+")
                .expect("valid regex"),
            word: Regex::new(r"[\w']+").expect("valid regex"),
        }
    }

    pub(crate) fn tokenize(&self, text: &str) -> Vec<String> {
        let text = text.nfc().collect::<String>().to_lowercase();
        let text = self.noise.replace_all(&text, " ");
        let text = text.replace('#', " ");

        self.word
            .find_iter(&text)
            .filter_map(|m| {
                let word = m.as_str().trim_matches('\'');
                let word = word.split('\'').next().unwrap_or_default();
                let first = word.chars().next()?;

                if first.is_numeric() {
                    return None;
                }

                Some(squeeze(word))
            })
            .collect()
    }
}

/// Shortens runs of equal characters to a length of two.
fn squeeze(word: &str) -> String {
    let mut result = String::with_capacity(word.len());
    let mut last = None;
    let mut run = 0;

    for c in word.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            last = Some(c);
            run = 1;
        }

        if run <= 2 {
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(text: &str) -> Vec<String> {
        Tokenizer::new().tokenize(text)
    }

    #[test]
    fn tokenize_words() {
        assert_eq!(
            tokenize("I love sunny California!"),
            ["i", "love", "sunny", "california"]
        );

        assert_eq!(
            tokenize("Great day,  isn't it?!"),
            ["great", "day", "isn", "it"]
        );
    }

    #[test]
    fn tokenize_noise() {
        assert_eq!(
            tokenize("@alice look http://t.co/xyz and www.example.com #happy"),
            ["look", "and", "happy"]
        );
    }

    #[test]
    fn tokenize_repetitions() {
        assert_eq!(tokenize("Sooooo goooood"), ["soo", "good"]);
        assert_eq!(squeeze("aaabbbccc"), "aabbcc");
        assert_eq!(squeeze("book"), "book");
    }

    #[test]
    fn tokenize_apostrophes_and_digits() {
        assert_eq!(tokenize("'quoted' don't 2day 4ever ok"), [
            "quoted", "don", "ok"
        ]);
    }

    #[test]
    fn tokenize_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("!!! ... 123 @bob").is_empty());
    }
}

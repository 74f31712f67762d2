//! Chunker - cut source text into overlapping windows.
//!
//! The text is first sliced into contiguous "small" chunks of
//! `chunk_length` characters. Each adjacent pair is then joined into one
//! "big" chunk, so an event straddling a small-chunk boundary is always
//! fully visible in at least one window. The price is that most text is
//! seen twice, which the deduplication stage cleans up.

use std::num::NonZeroUsize;

use crate::types::chunk::Chunk;

/// Split `text` into the windows submitted to the oracle.
///
/// - empty text yields no chunks
/// - text of at most `chunk_length` characters yields one chunk equal to it
/// - otherwise, for `n` small chunks, yields `n - 1` windows of up to
///   `2 * chunk_length` characters
pub fn split_text(text: &str, chunk_length: NonZeroUsize) -> Vec<Chunk> {
    let small = small_chunks(text, chunk_length.get());

    if small.len() <= 1 {
        return small;
    }

    small
        .windows(2)
        .map(|pair| {
            let mut joined = String::with_capacity(pair[0].text.len() + pair[1].text.len());
            joined.push_str(&pair[0].text);
            joined.push_str(&pair[1].text);
            Chunk::new(pair[0].start, joined)
        })
        .collect()
}

/// Contiguous, non-overlapping slices of `length` characters.
fn small_chunks(text: &str, length: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut chunk_start_byte = 0;
    let mut chunk_start_char = 0;

    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % length == 0 {
            chunks.push(Chunk::new(
                chunk_start_char,
                &text[chunk_start_byte..byte_idx],
            ));
            chunk_start_byte = byte_idx;
            chunk_start_char = count;
        }
    }

    if chunk_start_byte < text.len() {
        chunks.push(Chunk::new(chunk_start_char, &text[chunk_start_byte..]));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn len(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_text("", len(500)).is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let text = "Meeting on 2025-04-20 from 2pm to 3pm at Starbucks about project X.";
        let chunks = split_text(text, len(500));

        assert_eq!(chunks, vec![Chunk::new(0, text)]);
    }

    #[test]
    fn test_exact_length_is_one_chunk() {
        let chunks = split_text("abcd", len(4));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abcd");
    }

    #[test]
    fn test_adjacent_pairs_are_joined() {
        let chunks = split_text("aaabbbcccd", len(3));

        let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["aaabbb", "bbbccc", "cccd"]);

        let starts: Vec<usize> = chunks.iter().map(|c| c.start).collect();
        assert_eq!(starts, vec![0, 3, 6]);
    }

    #[test]
    fn test_two_small_chunks_make_one_window() {
        let chunks = split_text("abcde", len(3));
        assert_eq!(chunks, vec![Chunk::new(0, "abcde")]);
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let chunks = split_text("日本語のテキスト", len(3));

        let texts: Vec<&str> = chunks.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["日本語のテキ", "のテキスト"]);
        assert_eq!(chunks[1].start, 3);
    }

    proptest! {
        #[test]
        fn prop_chunk_count_matches_small_chunks(text in "\\PC{0,300}", n in 1usize..40) {
            let total = text.chars().count();
            let small = total.div_ceil(n);
            let chunks = split_text(&text, len(n));

            let expected = match small {
                0 => 0,
                1 => 1,
                k => k - 1,
            };
            prop_assert_eq!(chunks.len(), expected);
        }

        #[test]
        fn prop_chunks_are_bounded_and_non_empty(text in "\\PC{1,300}", n in 1usize..40) {
            for chunk in split_text(&text, len(n)) {
                prop_assert!(chunk.char_len() > 0);
                prop_assert!(chunk.char_len() <= 2 * n);
            }
        }

        #[test]
        fn prop_every_character_is_covered(text in "\\PC{1,300}", n in 1usize..40) {
            let total = text.chars().count();
            let chunks = split_text(&text, len(n));
            let chars: Vec<char> = text.chars().collect();

            let mut covered = vec![false; total];
            for chunk in &chunks {
                let expected: String = chars[chunk.start..chunk.end()].iter().collect();
                prop_assert_eq!(&chunk.text, &expected);
                for flag in &mut covered[chunk.start..chunk.end()] {
                    *flag = true;
                }
            }
            prop_assert!(covered.into_iter().all(|c| c));
        }
    }
}

//! Word-bounded fallback chunking for text without usable headings.

use docstruct_shared::{Chunk, ChunkingConfig, DetectionPayload, DetectionResult};

/// Confidence of the fallback-chunk signal.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Slice `text` into `Section N` chunks.
///
/// Below `min_words` the text stays a single chunk with its content
/// untouched. Otherwise the words are cut into runs of `max_words`, joined by
/// single spaces, so only the last chunk may be shorter.
pub fn fallback_chunks(text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.len() < config.min_words {
        return vec![Chunk {
            title: "Section 1".into(),
            content: text.to_string(),
        }];
    }

    let size = config.max_words.max(1);
    words
        .chunks(size)
        .enumerate()
        .map(|(i, run)| Chunk {
            title: format!("Section {}", i + 1),
            content: run.join(" "),
        })
        .collect()
}

/// The `fallback-chunks` detection signal.
pub fn generate_fallback_chunks(text: &str, config: &ChunkingConfig) -> DetectionResult {
    DetectionResult::found(
        FALLBACK_CONFIDENCE,
        DetectionPayload::FallbackChunks {
            chunks: fallback_chunks(text, config),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn short_text_is_one_chunk() {
        let text = "just a few words\nacross lines";
        let chunks = fallback_chunks(text, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].title, "Section 1");
        assert_eq!(chunks[0].content, text);
    }

    #[test]
    fn long_text_splits_by_max_words() {
        let text = words(2000);
        let chunks = fallback_chunks(&text, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].title, "Section 1");
        assert_eq!(chunks[1].title, "Section 2");
        assert_eq!(word_count(&chunks[0].content), 1200);
        assert_eq!(word_count(&chunks[1].content), 800);
    }

    #[test]
    fn chunks_cover_every_word_once() {
        let text = words(3601);
        let chunks = fallback_chunks(&text, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 4);

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace().map(str::to_string))
            .collect();
        let original: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        assert_eq!(rejoined, original);

        for chunk in &chunks[..chunks.len() - 1] {
            assert!(word_count(&chunk.content) <= 1200);
        }
    }

    #[test]
    fn signal_confidence() {
        let result = generate_fallback_chunks("tiny", &ChunkingConfig::default());
        assert!(result.found);
        assert_eq!(result.confidence, 0.6);
    }
}

use docqa_core::config::SplitterMode;
use docqa_core::types::{Chunk, ChunkConfig, Language};
use docqa_core::Error;
use docqa_text::{chunk, Chunker};

fn texts(chunks: &[Chunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

fn assert_chunk_contract(normalized: &str, chunks: &[Chunk]) {
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.ordinal, i, "ordinals are dense and ordered");
        assert_eq!(&normalized[c.char_span.start..c.char_span.end], c.text);
        assert!(!c.text.trim().is_empty());
        if i > 0 {
            assert!(chunks[i - 1].char_span.start <= c.char_span.start, "starts never go backwards");
        }
    }
    let mut covered = vec![false; normalized.len()];
    for c in chunks {
        covered[c.char_span.start..c.char_span.end].iter_mut().for_each(|b| *b = true);
    }
    for (i, ch) in normalized.char_indices() {
        if !ch.is_whitespace() {
            assert!(covered[i], "byte {i} ({ch:?}) not covered by any chunk");
        }
    }
}

#[test]
fn three_sentences_make_three_overlapping_chunks() {
    for mode in [SplitterMode::Basic, SplitterMode::Enhanced] {
        let chunker = Chunker::new(Language::English, ChunkConfig::new(5, 2).unwrap(), mode).unwrap();
        let chunks = chunker.chunk("The cat sat. The dog ran. Cats and dogs play.");
        assert_eq!(
            texts(&chunks),
            ["The cat sat.", "cat sat. The dog ran.", "dog ran. Cats and dogs play."],
            "mode {mode:?}"
        );
        assert_eq!(chunks[1].char_span.start, 4);
    }
}

#[test]
fn empty_and_blank_text_give_no_chunks() {
    assert!(chunk("", Language::English, 10, 2).unwrap().is_empty());
    assert!(chunk(" \n\t ", Language::Persian, 10, 2).unwrap().is_empty());
}

#[test]
fn chunking_is_pure() {
    let text = "One two three. Four five six seven. Eight nine.";
    let a = chunk(text, Language::English, 4, 2).unwrap();
    let b = chunk(text, Language::English, 4, 2).unwrap();
    assert_eq!(a, b);
    assert!(a.len() >= 2);
}

#[test]
fn every_word_lands_in_a_chunk() {
    let raw = "Alpha beta gamma.\n\nDelta   epsilon zeta eta! Theta iota? Kappa lambda mu nu xi omicron. Pi";
    let chunker = Chunker::new(Language::English, ChunkConfig::new(4, 1).unwrap(), SplitterMode::Basic).unwrap();
    let normalized = chunker.normalize(raw);
    let chunks = chunker.chunk_normalized(&normalized);
    assert_chunk_contract(&normalized, &chunks);
    assert_eq!(chunks.last().unwrap().text.split_whitespace().last(), Some("Pi"));
}

#[test]
fn long_sentence_becomes_one_oversized_chunk() {
    let text = "a b c d e f g h i j. Short one.";
    let chunks = chunk(text, Language::English, 3, 1).unwrap();
    assert_eq!(chunks[0].text, "a b c d e f g h i j.");
    assert_eq!(chunks[0].word_count(), 10);
    assert_eq!(chunks[1].text, "j. Short one.");
}

#[test]
fn invalid_window_is_rejected() {
    assert!(matches!(chunk("text", Language::English, 0, 0), Err(Error::InvalidConfig(_))));
    assert!(matches!(chunk("text", Language::English, 3, 5), Err(Error::InvalidConfig(_))));
}

#[test]
fn persian_text_splits_on_arabic_question_mark() {
    let text = "نوروز جشن سال نو است. تعطیلات چند روز است؟ مردم به سفر می‌روند.";
    let chunker = Chunker::new(Language::Persian, ChunkConfig::new(6, 1).unwrap(), SplitterMode::Basic).unwrap();
    let chunks = chunker.chunk(text);
    assert_eq!(chunks[0].text, "نوروز جشن سال نو است.");
    assert!(chunks.iter().all(|c| c.language == Language::Persian));
    assert_chunk_contract(&chunker.normalize(text), &chunks);
}

#[cfg(feature = "segmentation")]
#[test]
fn enhanced_persian_folds_arabic_letters() {
    let chunker =
        Chunker::new(Language::Persian, ChunkConfig::new(50, 5).unwrap(), SplitterMode::Enhanced).unwrap();
    assert_eq!(chunker.splitter_name(), "segmentation-fa");
    let chunks = chunker.chunk("كتاب علي را خواندم.");
    assert_eq!(chunks[0].text, "کتاب علی را خواندم.");
}

#[cfg(feature = "segmentation")]
#[test]
fn enhanced_english_does_not_break_after_titles() {
    let chunker =
        Chunker::new(Language::English, ChunkConfig::new(4, 0).unwrap(), SplitterMode::Enhanced).unwrap();
    let chunks = chunker.chunk("Dr. Smith arrived late. He apologized.");
    assert_eq!(texts(&chunks), ["Dr. Smith arrived late.", "He apologized."]);
}

use docqa_core::config::{HashingParams, SplitterMode};
use docqa_core::traits::Embedder;
use docqa_core::types::{
    Chunk, ChunkConfig, EmbedderState, EmbeddingBackend, HashingState, IndexConfig, Language, Span,
};
use docqa_core::Error;
use docqa_embed::{HashingEmbedder, TfidfEmbedder};
use docqa_text::Chunker;
use docqa_vector::{retrieve, Index};

fn cat_dog_index() -> Index {
    let chunker = Chunker::new(Language::English, ChunkConfig::new(5, 2).unwrap(), SplitterMode::Basic).unwrap();
    Index::build("The cat sat. The dog ran. Cats and dogs play.", "pets", &chunker, &TfidfEmbedder::default())
        .expect("build")
}

fn query(index: &Index, text: &str) -> Vec<f32> {
    TfidfEmbedder::default().transform(&[text], index.embedder_state()).unwrap().remove(0)
}

fn hand_built(vectors: Vec<Vec<f32>>) -> Index {
    let dimension = vectors.first().map_or(2, Vec::len);
    let chunks = (0..vectors.len())
        .map(|i| Chunk {
            text: format!("chunk {i}"),
            ordinal: i,
            char_span: Span { start: i * 8, end: i * 8 + 7 },
            language: Language::English,
        })
        .collect();
    let config = IndexConfig {
        language: Language::English,
        chunk_size: 10,
        overlap: 0,
        backend: EmbeddingBackend::Hashing,
        dimension,
        splitter: "punctuation-en".into(),
        source_name: None,
    };
    Index::new(config, chunks, vectors, EmbedderState::Hashing(HashingState { dimension, seed: 0 })).unwrap()
}

#[test]
fn cat_query_prefers_first_chunk_over_dog_chunk() {
    let index = cat_dog_index();
    assert_eq!(index.len(), 3);
    let hits = retrieve(&index, &query(&index, "cat"), 3).unwrap();
    let rank_of = |ordinal: usize| hits.iter().find(|h| h.chunk.ordinal == ordinal).unwrap().rank;
    assert!(rank_of(0) < rank_of(2), "the 'cat' chunk outranks the dogs-only chunk");
    assert!(hits[0].chunk.text.contains("cat"));
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), [1, 2, 3]);
}

#[test]
fn top_k_larger_than_index_returns_everything_ranked() {
    let index = cat_dog_index();
    let hits = retrieve(&index, &query(&index, "dogs play"), 50).unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn top_k_bounds_result_length() {
    let index = cat_dog_index();
    let q = query(&index, "the dog");
    for k in 1..=5 {
        assert_eq!(retrieve(&index, &q, k).unwrap().len(), k.min(index.len()));
    }
}

#[test]
fn scores_stay_within_cosine_bounds() {
    let index = cat_dog_index();
    for hit in retrieve(&index, &query(&index, "cat dog ran play sat"), 3).unwrap() {
        assert!((0.0..=1.0).contains(&hit.score), "tfidf weights are non-negative: {}", hit.score);
    }
    let signed = hand_built(vec![vec![1.0, 0.0], vec![-1.0, 0.0], vec![0.5, 0.5]]);
    for hit in retrieve(&signed, &[1.0, 0.0], 3).unwrap() {
        assert!((-1.0..=1.0).contains(&hit.score));
    }
}

#[test]
fn ties_break_by_source_order() {
    let index = hand_built(vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 2.0], vec![0.0, 1.0]]);
    let ordinals: Vec<usize> = retrieve(&index, &[0.0, 1.0], 4).unwrap().iter().map(|h| h.chunk.ordinal).collect();
    assert_eq!(ordinals, [0, 2, 3, 1]);
    let top2: Vec<usize> = retrieve(&index, &[0.0, 1.0], 2).unwrap().iter().map(|h| h.chunk.ordinal).collect();
    assert_eq!(top2, [0, 2]);
}

#[test]
fn zero_query_scores_zero() {
    let index = hand_built(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    let hits = retrieve(&index, &[0.0, 0.0], 2).unwrap();
    assert!(hits.iter().all(|h| h.score == 0.0));
    assert_eq!(hits[0].chunk.ordinal, 0);
}

#[test]
fn bad_arguments_are_rejected_before_scoring() {
    let index = cat_dog_index();
    let q = query(&index, "cat");
    assert!(matches!(retrieve(&index, &q, 0), Err(Error::InvalidConfig(_))));
    assert!(matches!(retrieve(&index, &[1.0, 2.0], 1), Err(Error::IndexConfigMismatch(_))));
}

#[test]
fn index_rejects_inconsistent_parts() {
    let ok = hand_built(vec![vec![1.0, 0.0]]);
    let err = Index::new(ok.config().clone(), ok.chunks().to_vec(), vec![vec![1.0, 0.0, 0.0]], ok.embedder_state().clone())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidIndex(_)));
    let err = Index::new(ok.config().clone(), ok.chunks().to_vec(), vec![], ok.embedder_state().clone()).unwrap_err();
    assert!(matches!(err, Error::InvalidIndex(_)));
}

#[test]
fn empty_source_is_rejected() {
    let chunker = Chunker::new(Language::English, ChunkConfig::new(5, 2).unwrap(), SplitterMode::Basic).unwrap();
    let embedder = HashingEmbedder::new(&HashingParams::default());
    let err = Index::build("  \n ", "blank.txt", &chunker, &embedder).unwrap_err();
    assert!(matches!(err, Error::EmptySource { ref source_name } if source_name == "blank.txt"));
}

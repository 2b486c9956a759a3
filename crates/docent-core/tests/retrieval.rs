//! End-to-end retrieval scenarios: ingest a document, then query it.

use docent_core::analyzer::Analyzer;
use docent_core::chunk::{chunk_text, ChunkConfig};
use docent_core::extract::DocumentFormat;
use docent_core::index::LexicalIndex;
use docent_core::ingest::{IngestPipeline, PipelineConfig};
use docent_core::normalize::normalize;
use docent_core::retriever::Retriever;
use docent_core::Error;

const GUIDE: &str = "\
Our flagship course covers digital marketing, funnels and paid ads.\r\n\r\n\
Pricing: the complete program costs 499 dollars with lifetime access.\n\
The free webinar runs every Saturday at 7 PM and explains the curriculum.\n\n\
Refunds are available within thirty days of purchase, no questions asked.\n\
Graduates report landing freelance clients within the first three months.";

fn small_chunk_pipeline() -> IngestPipeline {
    IngestPipeline::new(PipelineConfig {
        chunking: ChunkConfig::new(120, 30).unwrap(),
        ..PipelineConfig::default()
    })
}

#[test]
fn test_single_letter_document_matches_single_letter_query() {
    let text = "A".repeat(25);
    let doc = IngestPipeline::default()
        .ingest(text.as_bytes(), DocumentFormat::PlainText)
        .unwrap();
    assert_eq!(doc.chunk_count, 1);

    let results = doc.retriever.query("A", 3);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].ordinal, 0);
    assert_eq!(results[0].text, text);
    assert!(results[0].score > 0.0);
}

#[test]
fn test_empty_document_is_extraction_error() {
    let err = IngestPipeline::default()
        .ingest(b"", DocumentFormat::PlainText)
        .unwrap_err();
    assert!(matches!(err, Error::Extraction(_)));
}

#[test]
fn test_second_upload_replaces_first() {
    let pipeline = IngestPipeline::default();

    let mut session_retriever = Retriever::empty();
    assert!(session_retriever.query("pricing", 3).is_empty());

    let first = pipeline
        .ingest(
            b"Astronomy notes: telescopes, nebulae and the orbits of distant planets.",
            DocumentFormat::PlainText,
        )
        .unwrap();
    session_retriever = first.retriever;
    assert!(session_retriever.query("telescopes", 3)[0]
        .text
        .contains("telescopes"));

    let second = pipeline
        .ingest(GUIDE.as_bytes(), DocumentFormat::PlainText)
        .unwrap();
    let second_text = second.text.clone();
    session_retriever = second.retriever;

    for query in ["telescopes nebulae", "pricing", "planets orbits", "webinar"] {
        for result in session_retriever.query(query, 5) {
            assert!(
                second_text.contains(&result.text),
                "result {:?} did not come from the second document",
                result.text
            );
        }
    }
}

#[test]
fn test_relevant_chunk_ranks_first() {
    let doc = small_chunk_pipeline()
        .ingest(GUIDE.as_bytes(), DocumentFormat::PlainText)
        .unwrap();
    assert!(doc.chunk_count > 2);

    let results = doc.retriever.query("When is the free webinar?", 2);
    assert_eq!(results.len(), 2);
    assert!(results[0].text.contains("webinar"), "{:?}", results[0]);

    let results = doc.retriever.query("refund policy", 1);
    assert!(results[0].text.to_lowercase().contains("refund"));
}

#[test]
fn test_top_k_larger_than_corpus() {
    let doc = small_chunk_pipeline()
        .ingest(GUIDE.as_bytes(), DocumentFormat::PlainText)
        .unwrap();
    let n = doc.retriever.chunk_count();
    let results = doc.retriever.query("course", n + 10);
    assert_eq!(results.len(), n);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_query_without_shared_tokens_keeps_order() {
    let index = LexicalIndex::build(
        ["red apples", "green pears", "yellow bananas", "purple plums"],
        Analyzer::default(),
    )
    .unwrap();
    let retriever = Retriever::new(index);

    for query in ["?!?", "zzz qqq"] {
        let results = retriever.query(query, 4);
        let ordinals: Vec<usize> = results.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3], "query {:?}", query);
        assert!(results.iter().all(|r| r.score == 0.0));
    }
}

#[test]
fn test_chunks_of_normalized_2000_chars() {
    let text: String = (0..2000).map(|i| if i % 7 == 6 { ' ' } else { 'x' }).collect();
    let text = normalize(&text);
    let len = text.chars().count();

    let chunks = chunk_text(&text, 900, 150).unwrap();
    let mut offset = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(&text[offset..offset + chunk.len()], chunk.as_str(), "chunk {}", i);
        if i + 1 < chunks.len() {
            assert_eq!(chunk.chars().count(), 900);
            offset += 750;
        }
    }
    assert_eq!(offset + chunks.last().unwrap().len(), len);
}

#[test]
fn test_overlap_larger_than_size_fails_fast() {
    let err = chunk_text(&"y".repeat(1000), 100, 150).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn test_ingest_is_deterministic() {
    let a = small_chunk_pipeline()
        .ingest(GUIDE.as_bytes(), DocumentFormat::PlainText)
        .unwrap();
    let b = small_chunk_pipeline()
        .ingest(GUIDE.as_bytes(), DocumentFormat::PlainText)
        .unwrap();
    let ra = a.retriever.query("lifetime access pricing", 3);
    let rb = b.retriever.query("lifetime access pricing", 3);
    assert_eq!(ra, rb);
}

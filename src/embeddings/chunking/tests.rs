use super::*;

fn config(window: usize, overlap: usize) -> ChunkingConfig {
    ChunkingConfig { window, overlap }
}

#[test]
fn empty_text_produces_no_chunks() {
    let chunks = chunk_text("", &ChunkingConfig::default());
    assert!(chunks.is_empty());
}

#[test]
fn short_text_is_a_single_chunk() {
    let chunks = chunk_text("hello world", &ChunkingConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "hello world");
    assert_eq!(chunks[0].chunk_index, 0);
}

#[test]
fn window_offsets_advance_by_window_minus_overlap() {
    // 1000 chars with window 500 / overlap 100 starts chunks at 0, 400, 800
    let text = "a".repeat(1000);
    let chunks = chunk_text(&text, &config(500, 100));

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].content.chars().count(), 500);
    assert_eq!(chunks[1].content.chars().count(), 500);
    assert_eq!(chunks[2].content.chars().count(), 200);
}

#[test]
fn adjacent_chunks_share_the_overlap() {
    let text: String = ('a'..='z').cycle().take(120).collect();
    let chunks = chunk_text(&text, &config(50, 10));

    let first: Vec<char> = chunks[0].content.chars().collect();
    let second: Vec<char> = chunks[1].content.chars().collect();
    assert_eq!(&first[40..], &second[..10]);
}

#[test]
fn chunk_indices_are_sequential() {
    let text = "x".repeat(2000);
    let chunks = chunk_text(&text, &config(500, 100));

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.chunk_index, i);
    }
}

#[test]
fn exact_window_length_is_one_chunk() {
    let text = "b".repeat(500);
    let chunks = chunk_text(&text, &config(500, 100));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content.chars().count(), 500);
}

#[test]
fn multibyte_text_is_not_split_mid_scalar() {
    let text = "déjà vu ".repeat(100);
    let chunks = chunk_text(&text, &config(50, 10));

    let reassembled_len: usize = chunks[0].content.chars().count();
    assert_eq!(reassembled_len, 50);
    for chunk in &chunks {
        // Every chunk is valid UTF-8 by construction; verify lengths line up
        assert!(chunk.content.chars().count() <= 50);
    }
}

#[test]
fn final_shorter_chunk_is_kept() {
    let text = "c".repeat(450);
    let chunks = chunk_text(&text, &config(200, 50));

    // starts at 0, 150, 300; the last covers 300..450
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].content.chars().count(), 150);
}

#[test]
fn chunk_id_format() {
    assert_eq!(chunk_id(0, 0), "doc_0_chunk_0");
    assert_eq!(chunk_id(12, 3), "doc_12_chunk_3");
}

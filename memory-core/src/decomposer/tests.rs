use super::*;

fn text_of(span: &Span<'_>) -> &str {
    std::str::from_utf8(span.bytes).unwrap()
}

#[test]
fn s1_two_sentences_split_on_period() {
    let input = b"Alpha beta gamma. Delta epsilon.";
    let blocks = decompose(input);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].kind, BlockKind::Text);
    assert_eq!(blocks[0].statements.len(), 2);
    assert_eq!(text_of(&blocks[0].statements[0]), "Alpha beta gamma.");
    assert!(text_of(&blocks[0].statements[1]).starts_with("Delta"));
}

#[test]
fn s2_code_block_decomposition() {
    let input = b"intro\n\n```python\na=1\nb=2\n```\nafter";
    let blocks = decompose(input);
    assert_eq!(blocks.len(), 3);

    assert_eq!(blocks[0].kind, BlockKind::Text);
    assert_eq!(text_of(&blocks[0].content), "intro");

    assert_eq!(blocks[1].kind, BlockKind::Code);
    assert_eq!(blocks[1].lang.as_deref(), Some("python"));
    assert_eq!(blocks[1].statements.len(), 2);
    assert_eq!(text_of(&blocks[1].statements[0]), "a=1");
    assert_eq!(text_of(&blocks[1].statements[1]), "b=2");

    assert_eq!(blocks[2].kind, BlockKind::Text);
    assert_eq!(text_of(&blocks[2].content), "after");
}

#[test]
fn unclosed_fence_consumes_rest_of_buffer() {
    let input = b"before\n\n```rust\nfn main() {}\nlet x = 1;";
    let blocks = decompose(input);
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].kind, BlockKind::Code);
    assert_eq!(blocks[1].statements.len(), 2);
}

#[test]
fn s5_abbreviations_do_not_split_sentences() {
    let input = b"Ask Dr. Smith about i.e. the plan. Then leave.";
    let blocks = decompose(input);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].statements.len(), 2);
    assert_eq!(
        text_of(&blocks[0].statements[0]),
        "Ask Dr. Smith about i.e. the plan."
    );
    assert_eq!(text_of(&blocks[0].statements[1]), "Then leave.");
}

#[test]
fn paragraphs_split_on_blank_lines() {
    let input = b"first paragraph here.\n\nsecond paragraph here.";
    let blocks = decompose(input);
    assert_eq!(blocks.len(), 2);
    assert_eq!(text_of(&blocks[0].content), "first paragraph here.");
    assert_eq!(text_of(&blocks[1].content), "second paragraph here.");
}

#[test]
fn leading_and_trailing_whitespace_is_trimmed() {
    let input = b"   padded content here.   ";
    let blocks = decompose(input);
    assert_eq!(blocks.len(), 1);
    assert_eq!(text_of(&blocks[0].content), "padded content here.");
}

#[test]
fn empty_input_yields_no_blocks() {
    assert!(decompose(b"").is_empty());
    assert!(decompose(b"   \n\n   ").is_empty());
}

#[test]
fn decomposition_is_deterministic() {
    let input = b"Alpha beta. Gamma delta.\n\n```js\nconsole.log(1);\n```\n\nTail end.";
    let a = decompose(input);
    let b = decompose(input);
    assert_eq!(a.len(), b.len());
    for (ba, bb) in a.iter().zip(b.iter()) {
        assert_eq!(ba.kind, bb.kind);
        assert_eq!(ba.lang, bb.lang);
        assert_eq!(ba.content.offset, bb.content.offset);
        assert_eq!(ba.content.bytes, bb.content.bytes);
        assert_eq!(ba.statements.len(), bb.statements.len());
    }
}

#[test]
fn spans_lie_within_original_buffer() {
    let input = b"Intro line.\n\n```rb\nputs 1\nputs 2\n```\n\nOutro line here.";
    let blocks = decompose(input);
    for block in &blocks {
        assert!(block.content.offset + block.content.bytes.len() <= input.len());
        assert_eq!(
            &input[block.content.offset..block.content.offset + block.content.bytes.len()],
            block.content.bytes
        );
        for stmt in &block.statements {
            assert!(stmt.offset + stmt.bytes.len() <= input.len());
            assert_eq!(
                &input[stmt.offset..stmt.offset + stmt.bytes.len()],
                stmt.bytes
            );
        }
    }
}

#[test]
fn fence_language_tag_is_captured_and_capped() {
    let long_lang = "x".repeat(50);
    let input = format!("```{long_lang}\ncode\n```");
    let blocks = decompose(input.as_bytes());
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].lang.as_ref().unwrap().len() <= crate::constants::MAX_FENCE_LANG_LEN);
}

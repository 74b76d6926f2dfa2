use super::*;

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn two_sentences_become_two_fragments() {
    let out = segment("Hello world. This is a test.", &SegmentRules::default());
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].text, "Hello world");
    assert_eq!(out[0].word_count, 2);
    assert_eq!(out[0].kind, FragmentKind::Sentence);
    assert_eq!(out[1].text, "This is a test");
    assert_eq!(out[1].word_count, 4);
}

#[test]
fn empty_and_punctuation_only_inputs_yield_nothing() {
    let rules = SegmentRules::default();
    assert!(segment("", &rules).is_empty());
    assert!(segment("   \n\t ", &rules).is_empty());
    assert!(segment("...!?! . ?", &rules).is_empty());
}

#[test]
fn repeated_terminals_split_once() {
    let out = segment("Wait!!! What?! Fine...", &SegmentRules::default());
    let texts = out.iter().map(|f| f.text.as_str()).collect::<Vec<_>>();
    assert_eq!(texts, vec!["Wait", "What", "Fine"]);
}

#[test]
fn trailing_text_without_terminal_is_kept() {
    let out = segment("First one. and a tail", &SegmentRules::default());
    assert_eq!(out.len(), 2);
    assert_eq!(out[1].text, "and a tail");
}

#[test]
fn oversized_sentence_is_cut_into_eight_word_chunks() {
    let sentence = (1..=20)
        .map(|i| format!("word{i:02}"))
        .collect::<Vec<_>>()
        .join(" ");
    assert!(sentence.chars().count() > 100);

    let out = segment(&format!("{sentence}."), &SegmentRules::default());
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|f| f.kind == FragmentKind::Chunk));
    assert_eq!(
        out.iter().map(|f| f.word_count).collect::<Vec<_>>(),
        vec![8, 8, 4]
    );
    assert!(out.iter().all(|f| f.word_count <= 8));
    assert_eq!(out[0].text.split_whitespace().next(), Some("word01"));
    assert_eq!(out[2].text.split_whitespace().last(), Some("word20"));
}

#[test]
fn sentence_at_threshold_is_not_cut() {
    let sentence = "a".repeat(100);
    let out = segment(&sentence, &SegmentRules::default());
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].kind, FragmentKind::Sentence);
}

#[test]
fn threshold_counts_characters_not_bytes() {
    // 60 two-byte characters: 120 bytes but only 60 chars.
    let sentence = "é".repeat(60);
    let out = segment(&sentence, &SegmentRules::default());
    assert_eq!(out[0].kind, FragmentKind::Sentence);
}

#[test]
fn concatenation_reproduces_text_without_terminals() {
    let text = "The night was cold! Nobody came. Then, at last, a long and winding explanation \
                arrived that went on and on far past the point where anyone was still listening? End";
    let out = segment(text, &SegmentRules::default());
    let joined = out.iter().map(|f| f.text.as_str()).collect::<String>();
    let expected = text
        .chars()
        .filter(|c| !matches!(c, '.' | '!' | '?'))
        .collect::<String>();
    assert_eq!(squash(&joined), squash(&expected));
}

#[test]
fn custom_rules_apply() {
    let rules = SegmentRules {
        max_sentence_chars: 5,
        chunk_words: 2,
    };
    let out = segment("one two three", &rules);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].text, "one two");
    assert_eq!(out[1].text, "three");
}

#[test]
fn zero_chunk_words_is_invalid() {
    let rules = SegmentRules {
        max_sentence_chars: 100,
        chunk_words: 0,
    };
    assert!(rules.validate().is_err());
    assert!(SegmentRules::default().validate().is_ok());
}

#[test]
fn fragment_new_rejects_wordless_text() {
    assert!(Fragment::new("   ", FragmentKind::Sentence).is_none());
    let f = Fragment::new("a b  c", FragmentKind::Chunk).unwrap();
    assert_eq!(f.word_count, 3);
}

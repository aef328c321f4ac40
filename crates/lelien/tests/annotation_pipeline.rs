// Integration tests for the authoring-to-annotation pipeline
//
// Markdown is rendered first and the resulting HTML annotated, the way notes
// are processed before they are cached and indexed.

use lelien::{
    Annotator, DictionaryCatalog, DictionarySource, DictionaryTopic, DictionaryWordIndex, LinkerConfig,
    MarkdownRenderer, MarkupRenderer, WordMatcher,
};
use leparse::{build_mention_pattern, Book, BookRegistry, ChapterBoundMap, ImplicitVocabulary, Recognizer, VerseKey};

fn registry() -> BookRegistry {
    BookRegistry::new(vec![
        Book::new(10, "1. Mose", "1Mo, Gen"),
        Book::new(500, "Johannes", "Joh"),
        Book::new(520, "Römer", "Röm, Rom"),
        Book::new(650, "Hebräer", "Hebr, Heb"),
    ])
}

fn bounds() -> ChapterBoundMap {
    ChapterBoundMap::from_keys(vec![
        VerseKey::new(10, 1, 31),
        VerseKey::new(500, 3, 36),
        VerseKey::new(520, 8, 39),
        VerseKey::new(520, 9, 33),
        VerseKey::new(650, 11, 40),
    ])
}

fn catalog() -> DictionaryCatalog {
    DictionaryCatalog::new(vec![DictionarySource {
        id: "jma".to_string(),
        name: "Begriffe".to_string(),
        data: vec![
            DictionaryTopic {
                topic: "Glaube; Vertrauen".to_string(),
                definition: "Gewissheit des Erhofften".to_string(),
            },
            DictionaryTopic {
                topic: "Gnade".to_string(),
                definition: "Unverdiente Gunst".to_string(),
            },
        ],
    }])
}

#[test]
fn test_markdown_note_is_annotated() {
    let registry = registry();
    let bounds = bounds();
    let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
    let catalog = catalog();
    let index = DictionaryWordIndex::from_catalog(&catalog);
    let matcher = WordMatcher::new(&LinkerConfig::default());
    let annotator = Annotator::new(Recognizer::new(&pattern, &registry, &bounds), &catalog)
        .with_word_linking(&index, &matcher)
        .with_default_dictionary("jma");

    let markdown = "\
# Glauben

Nach *Hebr 11,1* ist der Glaube Vertrauen. Vers 6 ergänzt das.

- Röm 8,28 und im nächsten Kapitel, Vers 16
- [Agape](S:G26) in <a href=\"B:500 3\">Joh 3,16</a>
";
    let html = MarkdownRenderer.render(markdown);
    let annotation = annotator.annotate_html(&html);

    let verses: Vec<String> = annotation
        .internal_links
        .iter()
        .map(|link| link.key.to_string())
        .collect();
    assert_eq!(verses, vec!["650-11-1", "650-11-6", "520-8-28", "520-9-16", "500-3-16"]);

    let topics: Vec<&str> = annotation
        .dictionary_mentions
        .iter()
        .map(|m| m.topic.as_str())
        .collect();
    assert_eq!(topics, vec!["glaube", "vertrauen"]);

    assert_eq!(annotation.lexicon_mentions.len(), 1);
    assert!(annotation.flags.has_cross_reference);
    assert!(annotation.plain_text.contains("Hebr 11,1"));
    assert!(!annotation.plain_text.contains('<'));
}

#[test]
fn test_annotation_is_deterministic() {
    let registry = registry();
    let bounds = bounds();
    let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
    let catalog = catalog();
    let annotator = Annotator::new(Recognizer::new(&pattern, &registry, &bounds), &catalog);

    let html = "<p>1Mo 1,1 und Röm 9 sowie https://youtu.be/dQw4w9WgXcQ</p>";
    let first = annotator.annotate_html(html);
    let second = annotator.annotate_html(html);
    assert_eq!(first, second);
    assert!(first.flags.has_youtube);
    assert_eq!(first.chapter_links.len(), 1);
    assert_eq!(first.chapter_links[0].key.to_string(), "520-9");
}

proptest::proptest! {
    #[test]
    fn prop_annotation_is_total(text in "(\\PC|<[a-z/ =\"]{0,12}>|Joh 3,1[0-9]|Vers [0-9]|gnaden){0,40}") {
        let registry = registry();
        let bounds = bounds();
        let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
        let catalog = catalog();
        let index = DictionaryWordIndex::from_catalog(&catalog);
        let matcher = WordMatcher::default();
        let annotator = Annotator::new(Recognizer::new(&pattern, &registry, &bounds), &catalog)
            .with_word_linking(&index, &matcher);

        let annotation = annotator.annotate_html(&MarkdownRenderer.render(&text));
        for link in &annotation.internal_links {
            proptest::prop_assert!(bounds.contains_verse(link.key));
        }
    }
}

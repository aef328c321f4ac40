// Integration tests for searching annotated entries
//
// Entries go through the annotation pipeline and the cache, then the
// resulting bundles and verse texts are searched together.

use lelien::{verse_plain_text, Annotator, DictionaryCatalog, MarkdownRenderer};
use leparse::{build_mention_pattern, Book, BookRegistry, ChapterBoundMap, ImplicitVocabulary, Recognizer, VerseKey};
use lerecherche::{
    compile, DocumentKind, SearchDocument, SearchEngine, SearchFilter, SearchableText, SnippetBuilder, TestamentFilter,
};
use lestockage::{verse_link, AnnotationCache, AnnotationPipeline, Entry, EntryKind, EntryLabel};
use proptest::prelude::*;

fn registry() -> BookRegistry {
    BookRegistry::new(vec![Book::new(10, "1. Mose", "1Mo"), Book::new(500, "Johannes", "Joh")])
}

#[test]
fn test_entries_and_verses_are_searched_together() {
    let registry = registry();
    let bounds = ChapterBoundMap::from_keys([VerseKey::new(500, 3, 16), VerseKey::new(10, 1, 1)]);
    let pattern = build_mention_pattern(&registry, &ImplicitVocabulary::default()).unwrap();
    let catalog = DictionaryCatalog::default();
    let recognizer = Recognizer::new(&pattern, &registry, &bounds);
    let pipeline = AnnotationPipeline::new(&MarkdownRenderer, Annotator::new(recognizer, &catalog));
    let mut cache = AnnotationCache::new(8);

    let entry = Entry::new(
        "j1",
        EntryKind::Journal { journal: "Andacht".into() },
        "Über die **Liebe** Gottes in Joh 3,16",
    )
    .with_title("Liebe")
    .with_tags(["gnade"]);
    let label = EntryLabel::for_entry(&entry, &registry).unwrap();
    let bundle = cache.get_or_annotate(&entry, &label, &pipeline);

    let john = registry.get(500).unwrap();
    let key = VerseKey::new(500, 3, 16);
    let mut engine = SearchEngine::default();
    engine.index_documents(vec![
        SearchDocument::verse(
            key,
            format!("{} 3:16", john.long_name),
            verse_link(john.primary_short_name(), key),
            verse_plain_text("Denn also hat Gott die Welt <S>25</S> geliebt"),
        ),
        SearchDocument::from_bundle(entry.kind.entry_type(), &bundle),
    ]);

    let page = engine.search("gott", SearchFilter::All, 1).unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.hits[0].link, "/bible/Joh/3/16");
    assert_eq!(page.hits[0].snippet, "Denn also hat <mark>Gott</mark> die Welt geliebt");
    assert!(page.hits[1].snippet.contains("<mark>Gottes</mark>"));

    // tags are searchable, but not part of the snippet source
    let page = engine.search("gnade", SearchFilter::All, 1).unwrap();
    assert_eq!(page.total, 1);
    assert!(matches!(page.hits[0].kind, DocumentKind::Entry { .. }));

    let page = engine.search("gott", SearchFilter::Bible(TestamentFilter::Old), 1).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn test_excluded_term_example() {
    let query = compile(r#"+faith -works "good deeds""#).unwrap();
    assert!(!query.matches(&SearchableText::new("faith without good deeds is empty, not works")));

    let text = "faith produces good deeds daily";
    assert!(query.matches(&SearchableText::new(text)));
    assert_eq!(
        SnippetBuilder::default().build(text, &query),
        "<mark>faith</mark> produces <mark>good deeds</mark> daily"
    );
}

proptest! {
    #[test]
    fn prop_compile_and_match_are_total(query in "\\PC{0,40}", text in "\\PC{0,120}") {
        if let Ok(compiled) = compile(&query) {
            let searchable = SearchableText::new(&text);
            let _ = compiled.matches(&searchable);
            let _ = SnippetBuilder::default().build(&searchable.text, &compiled);
        }
    }

    #[test]
    fn prop_snippet_without_hit_is_bounded(text in "[a-z ]{0,400}") {
        let query = compile("\"zzzz qqqq\"").unwrap();
        let snippet = SnippetBuilder::default().build(&text, &query);
        prop_assert!(snippet.chars().count() <= 203);
        prop_assert!(text.starts_with(snippet.trim_end_matches("...")));
    }
}

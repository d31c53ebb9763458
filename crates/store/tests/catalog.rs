// Path: crates/store/tests/catalog.rs

mod common;

use lexdb_store::{AccessStrategy, ContentCatalog, LifecycleState, LineStore};
use lexdb_types::{Category, ContentKind, ContentType, LexConfig, LexError, Version};

#[test]
fn binds_every_present_content_type() {
    let fx = common::wordnet();
    let catalog = ContentCatalog::new(fx.path());
    catalog.open().unwrap();

    let bound = catalog.content_types().unwrap();
    assert_eq!(bound.len(), 13);
    assert!(!bound.contains(&ContentType::exception(Category::Adverb)));
    assert!(catalog
        .store(ContentType::exception(Category::Adverb))
        .unwrap()
        .is_none());

    let sense = catalog.store(ContentType::SENSE).unwrap().unwrap();
    let entry = catalog.store(ContentType::SENSE_ENTRY).unwrap().unwrap();
    assert_eq!(sense.path(), entry.path());
}

#[test]
fn reports_the_common_version() {
    let fx = common::wordnet();
    let catalog = ContentCatalog::new(fx.path());
    catalog.open().unwrap();
    assert_eq!(catalog.version().unwrap(), Some(Version::new(3, 0)));
}

#[test]
fn disagreeing_headers_yield_no_version() {
    let fx = common::wordnet();
    let original = std::fs::read_to_string(fx.path().join("index.verb")).unwrap();
    fx.write("index.verb", &original.replace("WordNet 3.0", "WordNet 2.1"));
    let catalog = ContentCatalog::new(fx.path());
    catalog.open().unwrap();
    assert_eq!(catalog.version().unwrap(), None);
}

#[test]
fn primary_files_use_direct_offsets_unless_disabled() {
    let fx = common::wordnet();
    let dog = format!("{:08}", fx.offset('n', "dog"));

    let catalog = ContentCatalog::new(fx.path());
    catalog.open().unwrap();
    let store = catalog.store(ContentType::primary(Category::Noun)).unwrap().unwrap();
    assert_eq!(store.strategy(), AccessStrategy::DirectOffset);
    let direct = store.line(&dog).unwrap().unwrap();
    catalog.close();

    catalog.set_direct_access(false).unwrap();
    catalog.open().unwrap();
    let store = catalog.store(ContentType::primary(Category::Noun)).unwrap().unwrap();
    assert_eq!(store.strategy(), AccessStrategy::BinarySearch);
    assert_eq!(store.line(&dog).unwrap().unwrap(), direct);
    assert!(direct.contains("dog 0 domestic_dog 0"));
}

#[test]
fn index_lines_iterate_from_a_key() {
    let fx = common::wordnet();
    let catalog = ContentCatalog::new(fx.path());
    catalog.open().unwrap();
    let store = catalog.store(ContentType::index(Category::Noun)).unwrap().unwrap();

    let lemmas: Vec<String> = store
        .lines_from("d")
        .unwrap()
        .map(|line| line.unwrap().split(' ').next().unwrap().to_string())
        .collect();
    assert_eq!(lemmas, vec!["dog", "domestic_dog", "entity"]);
    assert_eq!(store.lines().count(), 5);
    assert_eq!(store.header().unwrap().len(), 2);
}

#[test]
fn prefetch_promotes_all_stores_and_lookups_still_work() {
    let fx = common::wordnet();
    let catalog = ContentCatalog::new(fx.path());
    catalog.open().unwrap();
    let store = catalog.store(ContentType::index(Category::Noun)).unwrap().unwrap();
    let mut live = store.lines();
    assert_eq!(live.next().unwrap().unwrap().split(' ').next(), Some("canine"));

    catalog.load(true).unwrap();
    assert!(catalog.is_loaded());
    assert!(store.is_promoted());
    assert!(store.line("cat").unwrap().unwrap().starts_with("cat n"));
    // An iterator opened before promotion carries on in the copy.
    assert_eq!(live.next().unwrap().unwrap().split(' ').next(), Some("cat"));
}

#[test]
fn explicit_patterns_and_comparators_apply_on_open() {
    let fx = common::wordnet();
    std::fs::rename(fx.path().join("index.noun"), fx.path().join("nouns.lst")).unwrap();

    let mut config = LexConfig::new(fx.path());
    config
        .source_patterns
        .insert("index.noun".into(), r"^nouns\.lst$".into());
    let catalog = ContentCatalog::from_config(&config).unwrap();
    catalog
        .set_comparator(
            ContentKind::Index,
            std::sync::Arc::new(lexdb_store::TokenComparator::lexical()),
        )
        .unwrap();
    catalog.open().unwrap();
    let store = catalog.store(ContentType::index(Category::Noun)).unwrap().unwrap();
    assert!(store.path().ends_with("nouns.lst"));
    assert!(store.line("dog").unwrap().is_some());
    assert!(matches!(
        catalog.register_pattern(ContentType::SENSE, "x"),
        Err(LexError::ObjectOpen)
    ));
}

#[test]
fn open_close_is_idempotent() {
    let fx = common::wordnet();
    let catalog = ContentCatalog::new(fx.path());
    catalog.close();
    catalog.open().unwrap();
    catalog.open().unwrap();
    assert_eq!(catalog.state(), LifecycleState::Open);
    catalog.close();
    catalog.close();
    assert_eq!(catalog.state(), LifecycleState::Closed);
    assert!(matches!(catalog.version(), Err(LexError::ObjectClosed)));
}

//! Integration tests for query evaluation, pagination and highlighting

use vaultdex_core::index::CancellationFlag;
use vaultdex_core::providers::{PdfExtractor, PdfPage};
use vaultdex_core::search::{highlight, paginate, MatchMode, Operation};
use vaultdex_core::{
    Config, Database, Engine, MemoryVault, Result, Snippet, TokenizerConfig, VaultdexError,
};

/// Page text with one dense passage about a garden in the middle
struct GardenPdf;

impl PdfExtractor for GardenPdf {
    fn extract_pages(&self, _path: &str, _bytes: &[u8]) -> Result<Vec<PdfPage>> {
        let mut items: Vec<String> = (0..30).map(|i| format!("filler{i} text")).collect();
        items.push("Tomato plants need sunlight".to_string());
        items.push("and regular watering".to_string());
        items.extend((30..60).map(|i| format!("filler{i} text")));
        items.push("More tomato notes".to_string());
        Ok(vec![PdfPage { number: 4, items }])
    }
}

fn engine() -> Engine {
    let vault = MemoryVault::new();
    vault.insert_text(
        "garden/tomatoes.md",
        "---\nstatus: growing\ntags: [garden]\n---\nTomatoes need full sunlight.\nWater them daily.",
    );
    vault.insert_text("garden/basil.md", "Basil grows next to tomatoes. #garden #herbs");
    vault.insert_text("kitchen/sauce.md", "Tomato sauce: crush the tomatoes, add basil.");
    vault.insert_text("inbox.md", "Buy seeds");
    vault.insert_binary("manuals/growing.pdf", b"%PDF".to_vec());

    let db = Database::open_in_memory().unwrap();
    let engine =
        Engine::open_with(db, Config::default(), Box::new(vault), Box::new(GardenPdf)).unwrap();
    engine.reindex(false, None, &CancellationFlag::new()).unwrap();
    engine
}

fn result_paths(engine: &Engine, operations: &[Operation]) -> Vec<String> {
    engine
        .evaluate(operations)
        .unwrap()
        .results
        .into_iter()
        .map(|r| r.document.path)
        .collect()
}

#[test]
fn test_keyword_matches_text_and_pdf_pages() {
    let engine = engine();
    let mut paths = result_paths(&engine, &[Operation::new().keyword("tomato")]);
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "garden/basil.md",
            "garden/tomatoes.md",
            "kitchen/sauce.md",
            "manuals/growing.pdf#page=4",
        ]
    );
}

#[test]
fn test_groups_and_combined() {
    let engine = engine();
    let op = Operation::new().keyword("tomatoes").folder("garden").property("tag", "herbs");
    assert_eq!(result_paths(&engine, &[op]), vec!["garden/basil.md"]);

    let op = Operation::new().property("status", "growing");
    assert_eq!(result_paths(&engine, &[op]), vec!["garden/tomatoes.md"]);

    let op = Operation::new().folder("/");
    assert_eq!(result_paths(&engine, &[op]), vec!["inbox.md"]);

    let op = Operation::new().filename("/^(basil|sauce)\\.md$/");
    assert_eq!(
        result_paths(&engine, &[op]),
        vec!["garden/basil.md", "kitchen/sauce.md"]
    );
}

#[test]
fn test_score_orders_by_matched_keywords() {
    let engine = engine();
    let op = Operation::new().keyword("tomato").keyword("basil");
    let results = engine.evaluate(&[op]).unwrap().results;

    let top: Vec<&str> = results.iter().take(2).map(|r| r.document.path.as_str()).collect();
    assert_eq!(top, vec!["garden/basil.md", "kitchen/sauce.md"]);
    assert_eq!(results[0].keywords_matched.len(), 2);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_match_mode_any() {
    let engine = engine();
    let ops = [Operation::new().keyword("sunlight seeds")];
    let all = engine.evaluate_with_mode(&ops, MatchMode::All).unwrap().results;
    assert!(all.is_empty());

    let any = engine.evaluate_with_mode(&ops, MatchMode::Any).unwrap().results;
    assert_eq!(any.len(), 3);
}

#[test]
fn test_failed_operation_does_not_block_batch() {
    let engine = engine();
    let ops = vec![
        Operation::new().folder("/[broken/"),
        Operation::new(),
        Operation::new().keyword("seeds"),
    ];
    let evaluation = engine.evaluate(&ops).unwrap();

    let failed: Vec<usize> = evaluation.failures.iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![0, 1]);
    assert_eq!(evaluation.results.len(), 1);
    assert_eq!(evaluation.results[0].document.path, "inbox.md");
}

#[test]
fn test_search_pages() {
    let engine = engine();
    let ops = [Operation::new().keyword("tomato")];

    let first = engine.search(&ops, None, 1, Some(3)).unwrap();
    let second = engine.search(&ops, None, 2, Some(3)).unwrap();
    assert_eq!(first.results.total_count, 4);
    assert_eq!(first.results.total_pages, 2);
    assert_eq!(first.results.items.len(), 3);
    assert_eq!(second.results.items.len(), 1);
    assert!(first.results.has_next());
    assert!(!second.results.has_next());

    let all = engine.evaluate(&ops).unwrap().results;
    assert_eq!(second.results.items[0], all[3]);
}

#[test]
fn test_pagination_law() {
    let results: Vec<u32> = (0..37).collect();
    let page = paginate(&results, 2, 10);
    assert_eq!(page.items, results[10..20].to_vec());
    assert_eq!(page.total_pages, 4);
}

#[test]
fn test_highlight_text_document() {
    let engine = engine();
    let lines = engine
        .highlight("kitchen/sauce.md", &["tomato".to_string()])
        .unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0].highlighted_text,
        "==Tomato== sauce: crush the ==tomatoes==, add basil."
    );
}

#[test]
fn test_highlight_stem_tag_and_punctuation_cases() {
    let config = TokenizerConfig::default();
    let lines = highlight(
        "I walked in the park yesterday.",
        &["He is walking in the park".to_string()],
        &config,
    )
    .unwrap();
    assert_eq!((lines[0].term_matches[0].start, lines[0].term_matches[0].end), (2, 20));

    let lines = highlight("My tag: #black_cat.", &["#black_cat".to_string()], &config).unwrap();
    assert_eq!((lines[0].term_matches[0].start, lines[0].term_matches[0].end), (8, 18));
}

#[test]
fn test_pdf_snippet_picks_dense_window() {
    let engine = engine();
    let keywords = vec!["tomato sunlight water".to_string()];
    let snippet = match engine.snippet("manuals/growing.pdf#page=4", &keywords).unwrap() {
        Snippet::Pdf { snippet, link, .. } => {
            assert_eq!(link.as_deref(), Some("page=4&selection=30,0,31,20"));
            snippet.unwrap()
        }
        other => panic!("expected pdf snippet, got {:?}", other),
    };

    assert_eq!(snippet.matched_terms, 3);
    assert!(snippet
        .text
        .contains("==Tomato== plants need ==sunlight== and regular ==watering=="));
}

#[test]
fn test_snippet_for_unknown_page() {
    let engine = engine();
    let err = engine
        .snippet("manuals/growing.pdf#page=99", &["tomato".to_string()])
        .unwrap_err();
    assert!(matches!(err, VaultdexError::DocumentNotFound(_)));
}

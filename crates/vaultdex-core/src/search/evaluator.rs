//! Multi-operation query evaluation

use super::operation::{MatchMode, Operation, PropertyFilter};
use crate::analysis::{query_terms, TokenizerConfig};
use crate::db::{Document, DocumentStore, TermSource};
use crate::error::Result;
use crate::index::{normalize_tag, property_term};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Weight of one matched keyword; term frequency only breaks ties between
/// documents matching the same number of keywords
const KEYWORD_WEIGHT: f64 = 10.0;

/// Score of a document matched without keywords
const FILTER_ONLY_SCORE: f64 = 1.0;

/// A matched document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionResult {
    pub document: Document,
    pub score: f64,
    /// The caller's keyword strings responsible for the match
    pub keywords_matched: Vec<String>,
}

/// An operation that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    /// Index of the operation in the batch
    pub index: usize,
    pub error: String,
}

/// Results of a batch of operations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub results: Vec<ConditionResult>,
    pub failures: Vec<OperationFailure>,
}

/// Score from matched keyword count and total term frequency
pub fn score(keywords_matched: usize, term_frequency: usize) -> f64 {
    KEYWORD_WEIGHT * keywords_matched as f64 + (1.0 + term_frequency as f64).ln()
}

#[derive(Default)]
struct KeywordHits {
    keywords: Vec<String>,
    frequency: usize,
}

/// Evaluates operations against a document store
pub struct QueryEvaluator<'a> {
    store: &'a dyn DocumentStore,
    tokenizer: &'a TokenizerConfig,
    mode: MatchMode,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(store: &'a dyn DocumentStore, tokenizer: &'a TokenizerConfig) -> Self {
        Self {
            store,
            tokenizer,
            mode: MatchMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Evaluate a batch. Results are deduplicated by document (highest
    /// score wins) and sorted by descending score, then ascending path.
    ///
    /// A failing operation is recorded and the rest still run; only a
    /// fatal store error aborts the batch.
    pub fn evaluate(&self, operations: &[Operation]) -> Result<Evaluation> {
        let mut best: HashMap<i64, ConditionResult> = HashMap::new();
        let mut failures = Vec::new();

        for (index, operation) in operations.iter().enumerate() {
            match self.evaluate_operation(operation) {
                Ok(results) => {
                    for result in results {
                        match best.get(&result.document.id) {
                            Some(existing) if existing.score >= result.score => {}
                            _ => {
                                best.insert(result.document.id, result);
                            }
                        }
                    }
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::debug!("Operation {} failed: {}", index, e);
                    failures.push(OperationFailure {
                        index,
                        error: e.to_string(),
                    });
                }
            }
        }

        let mut results: Vec<ConditionResult> = best.into_values().collect();
        sort_results(&mut results);
        Ok(Evaluation { results, failures })
    }

    /// Evaluate one operation; results are unsorted and unique per document
    pub fn evaluate_operation(&self, operation: &Operation) -> Result<Vec<ConditionResult>> {
        let compiled = operation.compile()?;

        let keyword_hits = if compiled.keywords.is_empty() {
            None
        } else {
            Some(self.keyword_hits(&compiled.keywords)?)
        };

        let property_docs = if compiled.properties.is_empty() {
            None
        } else {
            Some(self.property_docs(&compiled.properties)?)
        };

        let documents = match &keyword_hits {
            Some(hits) => {
                let mut docs = Vec::with_capacity(hits.len());
                for id in hits.keys() {
                    if let Some(doc) = self.store.get_document(*id)? {
                        docs.push(doc);
                    }
                }
                docs
            }
            None => self.store.list_documents()?,
        };

        let results = documents
            .into_iter()
            .filter(|doc| !self.store.is_excluded(&doc.path))
            .filter(|doc| property_docs.as_ref().map_or(true, |ids| ids.contains(&doc.id)))
            .filter(|doc| compiled.matches_path(&doc.path, &doc.file_name))
            .map(|doc| match keyword_hits.as_ref().and_then(|h| h.get(&doc.id)) {
                Some(hits) => ConditionResult {
                    score: score(hits.keywords.len(), hits.frequency),
                    keywords_matched: hits.keywords.clone(),
                    document: doc,
                },
                None => ConditionResult {
                    score: FILTER_ONLY_SCORE,
                    keywords_matched: Vec::new(),
                    document: doc,
                },
            })
            .collect();

        Ok(results)
    }

    /// Documents matching any keyword, with the keywords each one matched
    fn keyword_hits(&self, keywords: &[String]) -> Result<HashMap<i64, KeywordHits>> {
        let mut hits: HashMap<i64, KeywordHits> = HashMap::new();

        for keyword in keywords {
            for (doc_id, frequency) in self.match_keyword(keyword)? {
                let entry = hits.entry(doc_id).or_default();
                if !entry.keywords.contains(keyword) {
                    entry.keywords.push(keyword.clone());
                }
                entry.frequency += frequency;
            }
        }

        Ok(hits)
    }

    /// Documents matching one keyword with their term frequency
    fn match_keyword(&self, keyword: &str) -> Result<BTreeMap<i64, usize>> {
        if keyword.starts_with('#') {
            let tag = normalize_tag(keyword);
            if tag.is_empty() {
                return Ok(BTreeMap::new());
            }
            let postings = self.store.find_postings(&[tag], &[TermSource::Tag])?;
            return Ok(postings
                .into_iter()
                .map(|p| (p.document_id, p.frequency))
                .collect());
        }

        let stems = query_terms(keyword, self.tokenizer);
        if stems.is_empty() {
            return Ok(BTreeMap::new());
        }

        let postings = self.store.find_postings(&stems, TermSource::TEXT)?;
        let mut per_doc: BTreeMap<i64, (HashSet<String>, usize)> = BTreeMap::new();
        for posting in postings {
            let (matched, frequency) = per_doc.entry(posting.document_id).or_default();
            matched.insert(posting.term);
            *frequency += posting.frequency;
        }

        let required = match self.mode {
            MatchMode::All => stems.len(),
            MatchMode::Any => 1,
        };

        Ok(per_doc
            .into_iter()
            .filter(|(_, (matched, _))| matched.len() >= required)
            .map(|(id, (_, frequency))| (id, frequency))
            .collect())
    }

    /// Documents matching any property filter
    fn property_docs(&self, properties: &[PropertyFilter]) -> Result<HashSet<i64>> {
        let mut ids = HashSet::new();
        for property in properties {
            let postings = if property.is_tag() {
                self.store
                    .find_postings(&[normalize_tag(&property.value)], &[TermSource::Tag])?
            } else {
                self.store.find_postings(
                    &[property_term(&property.name, &property.value)],
                    &[TermSource::Frontmatter],
                )?
            };
            ids.extend(postings.into_iter().map(|p| p.document_id));
        }
        Ok(ids)
    }
}

/// Descending score, then ascending path
pub fn sort_results(results: &mut [ConditionResult]) {
    results.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.document.path.cmp(&b.document.path),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExclusionRules;
    use crate::db::Database;
    use crate::error::VaultdexError;
    use crate::index::Indexer;
    use crate::providers::{MemoryVault, Vault};

    struct Fixture {
        db: Database,
        tok: TokenizerConfig,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let vault = MemoryVault::new();
        let tok = TokenizerConfig::default();
        for (path, content) in files {
            vault.insert_text(path, content);
        }
        {
            let indexer = Indexer::new(&db, &vault, &tok);
            for file in vault.root().unwrap().files() {
                indexer.index_file(file, false).unwrap();
            }
        }
        Fixture { db, tok }
    }

    fn paths(evaluation: &Evaluation) -> Vec<&str> {
        evaluation
            .results
            .iter()
            .map(|r| r.document.path.as_str())
            .collect()
    }

    fn notes() -> Fixture {
        fixture(&[
            ("walks.md", "I walked in the park. We walk every day."),
            ("dogs/dog.md", "---\nstatus: Done\ntags: [pets]\n---\nThe dog walks in the park."),
            ("cats/cat.md", "A black cat sleeping. #pets #black_cat"),
            ("readme.md", "Nothing relevant here."),
        ])
    }

    #[test]
    fn test_keyword_matches_across_stems() {
        let f = notes();
        let eval = QueryEvaluator::new(&f.db, &f.tok)
            .evaluate(&[Operation::new().keyword("walking")])
            .unwrap();
        assert_eq!(paths(&eval), vec!["walks.md", "dogs/dog.md"]);
        assert_eq!(eval.results[0].keywords_matched, vec!["walking".to_string()]);
        assert!(eval.results[0].score > eval.results[1].score, "higher frequency ranks first");
    }

    #[test]
    fn test_match_mode_all_vs_any() {
        let f = notes();
        let op = Operation::new().keyword("dog park");
        let all = QueryEvaluator::new(&f.db, &f.tok).evaluate(&[op.clone()]).unwrap();
        assert_eq!(paths(&all), vec!["dogs/dog.md"]);

        let any = QueryEvaluator::new(&f.db, &f.tok)
            .with_mode(MatchMode::Any)
            .evaluate(&[op])
            .unwrap();
        assert_eq!(paths(&any), vec!["dogs/dog.md", "walks.md"]);
    }

    #[test]
    fn test_more_keywords_matched_ranks_higher() {
        let f = notes();
        let op = Operation::new().keyword("park").keyword("dog");
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&[op]).unwrap();
        assert_eq!(paths(&eval), vec!["dogs/dog.md", "walks.md"]);
        assert_eq!(
            eval.results[0].keywords_matched,
            vec!["park".to_string(), "dog".to_string()]
        );
    }

    #[test]
    fn test_tag_keyword() {
        let f = notes();
        let eval = QueryEvaluator::new(&f.db, &f.tok)
            .evaluate(&[Operation::new().keyword("#black_cat")])
            .unwrap();
        assert_eq!(paths(&eval), vec!["cats/cat.md"]);
    }

    #[test]
    fn test_groups_are_intersected() {
        let f = notes();
        let op = Operation::new().keyword("park").folder("dogs");
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&[op]).unwrap();
        assert_eq!(paths(&eval), vec!["dogs/dog.md"]);

        let root_only = Operation::new().keyword("park").folder("/");
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&[root_only]).unwrap();
        assert_eq!(paths(&eval), vec!["walks.md"]);
    }

    #[test]
    fn test_filter_only_operations() {
        let f = notes();
        let eval = QueryEvaluator::new(&f.db, &f.tok)
            .evaluate(&[Operation::new().filename("read")])
            .unwrap();
        assert_eq!(paths(&eval), vec!["readme.md"]);
        assert_eq!(eval.results[0].score, FILTER_ONLY_SCORE);

        let props = Operation::new().property("Status", "done");
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&[props]).unwrap();
        assert_eq!(paths(&eval), vec!["dogs/dog.md"]);

        let tags = Operation::new().property("tags", "#Pets");
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&[tags]).unwrap();
        assert_eq!(paths(&eval), vec!["cats/cat.md", "dogs/dog.md"]);
    }

    #[test]
    fn test_batch_dedup_keeps_best_score() {
        let f = notes();
        let ops = [
            Operation::new().folder("dogs"),
            Operation::new().keyword("dog"),
        ];
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&ops).unwrap();
        assert_eq!(paths(&eval), vec!["dogs/dog.md"]);
        assert!(eval.results[0].score > FILTER_ONLY_SCORE);
        assert_eq!(eval.results[0].keywords_matched, vec!["dog".to_string()]);
    }

    #[test]
    fn test_failed_operation_does_not_block_others() {
        let f = notes();
        let ops = [
            Operation::new().folder("/[/"),
            Operation::new(),
            Operation::new().keyword("cat"),
        ];
        let eval = QueryEvaluator::new(&f.db, &f.tok).evaluate(&ops).unwrap();
        assert_eq!(paths(&eval), vec!["cats/cat.md"]);
        let failed: Vec<usize> = eval.failures.iter().map(|f| f.index).collect();
        assert_eq!(failed, vec![0, 1]);
    }

    #[test]
    fn test_store_failure_surfaces() {
        let f = notes();
        f.db.conn.execute_batch("DROP TABLE terms;").unwrap();
        let ops = vec![
            Operation::new().folder("/[broken/"),
            Operation::new().filename("readme"),
            Operation::new().keyword("park"),
        ];
        let result = QueryEvaluator::new(&f.db, &f.tok).evaluate(&ops);
        assert!(matches!(result, Err(VaultdexError::Database(_))));
    }

    #[test]
    fn test_ties_break_by_path() {
        let f = fixture(&[("b.md", "same words"), ("a.md", "same words"), ("c/a.md", "same words")]);
        let eval = QueryEvaluator::new(&f.db, &f.tok)
            .evaluate(&[Operation::new().keyword("words")])
            .unwrap();
        assert_eq!(paths(&eval), vec!["a.md", "b.md", "c/a.md"]);
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let f = notes();
        let ops = [Operation::new().keyword("walk").keyword("pets")];
        let evaluator = QueryEvaluator::new(&f.db, &f.tok).with_mode(MatchMode::Any);
        let first = evaluator.evaluate(&ops).unwrap();
        let second = evaluator.evaluate(&ops).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stopword_only_keyword_falls_back() {
        let f = fixture(&[("who.md", "The Who played live")]);
        let eval = QueryEvaluator::new(&f.db, &f.tok)
            .evaluate(&[Operation::new().keyword("the who")])
            .unwrap();
        // stopwords are never indexed, so nothing matches, but it is not an error
        assert!(eval.results.is_empty());
        assert!(eval.failures.is_empty());
    }

    #[test]
    fn test_excluded_documents_filtered() {
        let mut f = notes();
        f.db.set_exclusions(ExclusionRules::new(&["dogs".to_string()], &[]).unwrap());
        let eval = QueryEvaluator::new(&f.db, &f.tok)
            .evaluate(&[Operation::new().keyword("park")])
            .unwrap();
        assert_eq!(paths(&eval), vec!["walks.md"]);
    }

    #[test]
    fn test_score_is_monotonic() {
        assert!(score(2, 0) > score(1, 1000));
        assert!(score(1, 5) > score(1, 4));
    }
}

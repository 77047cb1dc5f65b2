//! Integration tests for the oracle boundary.
//!
//! Tests the full pipeline: index -> score table -> link prediction -> discovery -> evaluation.

use cqa_kge::{
    find_missing_triples, EntityId, Evaluator, IdTriple, KgIndex, LinkQuery, MissingTripleConfig,
    Predictor, RelationId, ScoreOracle, ScoreTable, SemanticConstraints,
};
use std::collections::HashSet;

/// Generate a synthetic social network.
fn synthetic_social() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("alice", "friendOf", "bob"),
        ("bob", "friendOf", "alice"),
        ("bob", "friendOf", "carol"),
        ("carol", "friendOf", "dave"),
        ("alice", "worksAt", "acme"),
        ("bob", "worksAt", "acme"),
        ("carol", "worksAt", "globex"),
        ("acme", "locatedIn", "nyc"),
        ("globex", "locatedIn", "sf"),
    ]
}

/// A score table that is confident (0.98) about every known triple.
fn memorizing_oracle(index: &KgIndex, triples: &[(&str, &str, &str)]) -> ScoreTable {
    let mut table = ScoreTable::new(index.num_entities(), index.num_relations());
    let mut rows: std::collections::HashMap<(EntityId, RelationId), Vec<f32>> =
        std::collections::HashMap::new();
    for &(h, r, t) in triples {
        let id = index.triple_id(h, r, t).unwrap();
        rows.entry((id.head, id.relation))
            .or_insert_with(|| vec![0.01; index.num_entities()])[id.tail.index()] = 0.98;
    }
    for ((head, relation), probs) in rows {
        table.set_probabilities(head, relation, &probs).unwrap();
    }
    table
}

#[test]
fn test_tail_prediction_ranks_known_tail_first() {
    let triples = synthetic_social();
    let index = KgIndex::from_triples(triples.iter().copied());
    let oracle = memorizing_oracle(&index, &triples);
    let predictor = Predictor::new(&oracle, &index).unwrap();

    let query = LinkQuery::from_names(&index, Some("carol"), Some("worksAt"), None).unwrap();
    let top = predictor.predict_topk(&query, 3).unwrap();
    assert_eq!(top[0].name, "globex");
    assert!(top[0].score > 0.9);
    assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_head_prediction_uses_triple_scores() {
    let triples = synthetic_social();
    let index = KgIndex::from_triples(triples.iter().copied());
    let oracle = memorizing_oracle(&index, &triples);
    let predictor = Predictor::new(&oracle, &index).unwrap();

    // (?, worksAt, acme) -> alice and bob
    let query = LinkQuery::from_names(&index, None, Some("worksAt"), Some("acme")).unwrap();
    let names: HashSet<String> = predictor
        .predict_topk(&query, 2)
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, HashSet::from(["alice".to_string(), "bob".to_string()]));
}

#[test]
fn test_two_hop_chain() {
    let triples = synthetic_social();
    let index = KgIndex::from_triples(triples.iter().copied());
    let oracle = memorizing_oracle(&index, &triples);
    let predictor = Predictor::new(&oracle, &index).unwrap();

    // Where do alice's colleagues' employers sit? alice -worksAt-> acme -locatedIn-> nyc
    let answers = predictor
        .conjunctive_query_by_name("alice", &["worksAt", "locatedIn"], 1)
        .unwrap();
    assert!(answers.contains("nyc"));
    assert_eq!(answers.len(), 1);
}

#[test]
fn test_memorized_graph_has_no_missing_triples() {
    let triples = synthetic_social();
    let index = KgIndex::from_triples(triples.iter().copied());
    let oracle = memorizing_oracle(&index, &triples);
    let known: HashSet<IdTriple> = triples
        .iter()
        .map(|&(h, r, t)| index.triple_id(h, r, t).unwrap())
        .collect();

    let config = MissingTripleConfig::default().with_confidence(0.9);
    let found = find_missing_triples(&oracle, &known, &config).unwrap();
    assert!(found.is_empty());

    // Forget one fact: it resurfaces as a missing triple.
    let mut partial = known.clone();
    let forgotten = index.triple_id("carol", "friendOf", "dave").unwrap();
    partial.remove(&forgotten);
    let found = find_missing_triples(&oracle, &partial, &config).unwrap();
    assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![forgotten]);
}

#[test]
fn test_unknown_names_surface_as_lookup_errors() {
    let index = KgIndex::from_triples(synthetic_social());
    let err = LinkQuery::from_names(&index, Some("mallory"), Some("friendOf"), None).unwrap_err();
    assert!(err.is_lookup());

    let oracle = ScoreTable::new(index.num_entities(), index.num_relations());
    assert!(oracle
        .predict_tails(EntityId(index.num_entities()), RelationId(0))
        .unwrap_err()
        .is_lookup());
}

fn known_ids(index: &KgIndex, triples: &[(&str, &str, &str)]) -> Vec<IdTriple> {
    triples
        .iter()
        .map(|&(h, r, t)| index.triple_id(h, r, t).unwrap())
        .collect()
}

#[test]
fn test_filtered_evaluation_forgives_other_known_tails() {
    let triples = synthetic_social();
    let index = KgIndex::from_triples(triples.iter().copied());
    let mut oracle = memorizing_oracle(&index, &triples);
    // bob's friends: alice edges out carol.
    let mut probs = vec![0.01; index.num_entities()];
    probs[index.entity_id("alice").unwrap().index()] = 0.99;
    probs[index.entity_id("carol").unwrap().index()] = 0.98;
    let bob = index.entity_id("bob").unwrap();
    let friend_of = index.relation_id("friendOf").unwrap();
    oracle.set_probabilities(bob, friend_of, &probs).unwrap();

    let mut evaluator = Evaluator::new();
    evaluator.add_known_triples(known_ids(&index, &triples));
    let test = [("bob", "friendOf", "carol")];

    let raw = evaluator.evaluate_named(&oracle, &index, &test, false).unwrap();
    assert_eq!(raw.num_triples, 2);
    assert!((raw.mrr - 0.75).abs() < 1e-9);
    assert!((raw.hits_at_1 - 0.5).abs() < 1e-9);

    let filtered = evaluator.evaluate_named(&oracle, &index, &test, true).unwrap();
    assert!((filtered.mrr - 1.0).abs() < 1e-9);
    assert!((filtered.hits_at_10 - 1.0).abs() < 1e-9);
}

#[test]
fn test_semantic_constraints_keep_tails_in_range() {
    let triples = synthetic_social();
    let index = KgIndex::from_triples(triples.iter().copied());
    let oracle = memorizing_oracle(&index, &triples);
    let constraints = SemanticConstraints::from_triples(
        index.num_entities(),
        index.num_relations(),
        &known_ids(&index, &triples),
    )
    .unwrap();
    let predictor = Predictor::new(&oracle, &index)
        .unwrap()
        .with_constraints(constraints)
        .unwrap();

    // worksAt ranges over {acme, globex}; every other tail is masked to 0.
    let query = LinkQuery::from_names(&index, Some("alice"), Some("worksAt"), None).unwrap();
    let top = predictor.predict_topk(&query, index.num_entities()).unwrap();
    let live: Vec<&str> = top
        .iter()
        .filter(|p| p.score > 0.0)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(live, vec!["acme", "globex"]);
}

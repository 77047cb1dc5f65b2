use cqa_kge::{EntityId, KgIndex, RelationId, ScoreTable, ScoreVector};
use cqa_reason::{
    classify, match_structure, negation_norm, rank, t_conorm, t_norm, AlgebraConfig,
    BeamSearchReasoner, LogicalQuery, NegationNorm, QueryType, Shape, TNorm,
};
use ndarray::Array1;
use proptest::prelude::*;

const N: usize = 5;
const R: usize = 2;

fn arb_scores() -> impl Strategy<Value = Array1<f32>> {
    prop::collection::vec(0.0f32..=1.0, N).prop_map(Array1::from)
}

fn arb_tnorm() -> impl Strategy<Value = TNorm> {
    prop_oneof![Just(TNorm::Min), Just(TNorm::Prod)]
}

/// A dense random oracle: every (head, relation) row filled with logits.
fn arb_table() -> impl Strategy<Value = ScoreTable> {
    prop::collection::vec(-8.0f32..8.0, N * N * R).prop_map(|logits| {
        let mut table = ScoreTable::new(N, R);
        for (i, row) in logits.chunks(N).enumerate() {
            table
                .set_logits(EntityId(i / R), RelationId(i % R), row.to_vec())
                .unwrap();
        }
        table
    })
}

fn arb_logical_query() -> impl Strategy<Value = LogicalQuery> {
    let leaf = (0..N).prop_map(|e| LogicalQuery::entity(EntityId(e)));
    leaf.prop_recursive(
        4,  // 4 levels deep
        24, // 24 nodes total
        3,  // max 3 items in collections
        |inner| {
            prop_oneof![
                (inner.clone(), 0..R).prop_map(|(q, r)| q.project(RelationId(r))),
                prop::collection::vec(inner.clone(), 1..4).prop_map(LogicalQuery::and),
                prop::collection::vec(inner.clone(), 1..4).prop_map(LogicalQuery::or),
                inner.prop_map(LogicalQuery::not),
            ]
        },
    )
}

fn index() -> KgIndex {
    KgIndex::from_names(["A", "B", "C", "D", "E"], ["r0", "r1"]).unwrap()
}

proptest! {
    #[test]
    fn prop_tnorm_commutative(a in arb_scores(), b in arb_scores(), kind in arb_tnorm()) {
        prop_assert_eq!(t_norm(&a, &b, kind), t_norm(&b, &a, kind));
        prop_assert_eq!(t_conorm(&a, &b, kind), t_conorm(&b, &a, kind));
    }

    #[test]
    fn prop_tnorm_boundaries(a in arb_scores(), kind in arb_tnorm()) {
        let ones = Array1::<f32>::ones(N);
        let zeros = Array1::<f32>::zeros(N);
        prop_assert_eq!(t_norm(&a, &ones, kind), a.clone());
        prop_assert_eq!(t_norm(&a, &zeros, kind), zeros.clone());
        for (x, y) in t_conorm(&a, &zeros, kind).iter().zip(a.iter()) {
            prop_assert!((x - y).abs() < 1e-6);
        }
        prop_assert_eq!(t_conorm(&a, &ones, kind), ones);
    }

    #[test]
    fn prop_tnorm_associative(
        a in arb_scores(),
        b in arb_scores(),
        c in arb_scores(),
        kind in arb_tnorm(),
    ) {
        let left = t_norm(&t_norm(&a, &b, kind), &c, kind);
        let right = t_norm(&a, &t_norm(&b, &c, kind), kind);
        for (x, y) in left.iter().zip(right.iter()) {
            prop_assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn prop_double_standard_negation_is_identity(a in arb_scores()) {
        let once = negation_norm(&a, NegationNorm::Standard, 0.0);
        let twice = negation_norm(&once, NegationNorm::Standard, 0.0);
        for (x, y) in twice.iter().zip(a.iter()) {
            prop_assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn prop_negations_stay_in_unit_interval(a in arb_scores(), lambda in 0.05f32..4.0) {
        for kind in [NegationNorm::Standard, NegationNorm::Sugeno, NegationNorm::Yager] {
            let negated = negation_norm(&a, kind, lambda);
            prop_assert!(negated.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn prop_sugeno_with_negative_lambda_stays_in_unit_interval(
        a in arb_scores(),
        lambda in -0.99f32..0.0,
    ) {
        let negated = negation_norm(&a, NegationNorm::Sugeno, lambda);
        for (&x, &orig) in negated.iter().zip(a.iter()) {
            prop_assert!((0.0..=1.0 + 1e-6).contains(&x), "sugeno({orig}, {lambda}) = {x}");
            // A shrinking denominator can only raise the standard complement.
            prop_assert!(x >= 1.0 - orig - 1e-6);
        }
    }

    #[test]
    fn prop_wider_beam_never_hurts_2p(
        table in arb_table(),
        anchor in 0..N,
        k1 in 0..N,
        k2 in 0..N,
        kind in arb_tnorm(),
    ) {
        let (k1, k2) = (k1.min(k2), k1.max(k2));
        let index = index();
        let query = LogicalQuery::entity(EntityId(anchor))
            .project(RelationId(0))
            .project(RelationId(1));
        let config = AlgebraConfig::default().with_tnorm(kind);
        let narrow = BeamSearchReasoner::new(&table, &index, config.clone().with_k(k1))
            .unwrap()
            .evaluate(&query)
            .unwrap();
        let wide = BeamSearchReasoner::new(&table, &index, config.with_k(k2))
            .unwrap()
            .evaluate(&query)
            .unwrap();
        prop_assert!(wide.max().unwrap() >= narrow.max().unwrap());
        for (w, n) in wide.as_array().iter().zip(narrow.as_array().iter()) {
            prop_assert!(w >= n);
        }
    }

    #[test]
    fn prop_evaluation_stays_calibrated(
        table in arb_table(),
        query in arb_logical_query(),
        k in 0..N,
        kind in arb_tnorm(),
    ) {
        let index = index();
        let config = AlgebraConfig::default().with_k(k).with_tnorm(kind);
        let reasoner = BeamSearchReasoner::new(&table, &index, config).unwrap();
        let scores = reasoner.evaluate(&query).unwrap();
        prop_assert_eq!(scores.len(), N);
        prop_assert!(scores.as_array().iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn prop_grammar_round_trip(query_type in prop::sample::select(QueryType::ALL.to_vec())) {
        let shape = match_structure(query_type.as_str()).unwrap();
        prop_assert_eq!(classify(&shape).unwrap(), query_type);
        let reparsed: Shape = shape.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, shape);
    }

    #[test]
    fn prop_rank_is_sorted_and_complete(a in arb_scores()) {
        let index = index();
        let answers = rank(&ScoreVector::from_probabilities(a).unwrap(), &index).unwrap();
        prop_assert_eq!(answers.len(), N);
        prop_assert!(answers.windows(2).all(|w| w[0].score >= w[1].score));
        let mut ids: Vec<usize> = answers.iter().map(|a| a.entity.0).collect();
        ids.sort_unstable();
        prop_assert_eq!(ids, (0..N).collect::<Vec<_>>());
    }
}

use feedclass::{Classifier, ClassifierConfig, ClassifierError, Language, SharedClassifier};
use std::thread;

fn classifier() -> Classifier {
    Classifier::temporary(ClassifierConfig::default()).unwrap()
}

fn stem(c: &Classifier, word: &str) -> String {
    c.tokenize(word).remove(0)
}

const SPORT_1: &str = "football match goal striker";
const SPORT_2: &str = "football goal referee stadium";
const COOKING_1: &str = "recipe oven flour butter";
const COOKING_2: &str = "recipe butter sugar oven";

fn trained() -> Classifier {
    let mut c = classifier();
    for (name, text, category) in [
        ("sport_1", SPORT_1, "SPORT"),
        ("sport_2", SPORT_2, "SPORT"),
        ("cooking_1", COOKING_1, "COOKING"),
        ("cooking_2", COOKING_2, "COOKING"),
    ] {
        c.add_text(text).unwrap();
        c.build_vector(name, text, Some(category)).unwrap();
    }
    c.refresh_weights().unwrap();
    c
}

#[test]
fn add_text_counts_documents_and_shared_terms() {
    let mut c = classifier();
    c.add_text("football striker").unwrap();
    c.add_text("football referee").unwrap();
    assert_eq!(c.document_count(), 2);
    let football = c.lookup(&stem(&c, "football")).unwrap().unwrap();
    assert!(football.document_frequency >= 2);
    assert_eq!(c.term_count(), 3);
}

#[test]
fn repeated_words_count_once_per_document() {
    let mut c = classifier();
    assert_eq!(c.add_text("goal goal goal").unwrap(), 1);
    assert_eq!(c.lookup("goal").unwrap().unwrap().document_frequency, 1);
}

#[test]
fn idf_matches_log_ratio() {
    let mut c = classifier();
    c.add_text("alpha beta").unwrap();
    c.add_text("beta").unwrap();
    c.recompute_idf().unwrap();
    let alpha = c.lookup("alpha").unwrap().unwrap();
    let beta = c.lookup("beta").unwrap().unwrap();
    assert_eq!((alpha.index, beta.index), (0, 1));
    assert!((alpha.idf - 0.693).abs() < 1e-3);
    assert_eq!(beta.idf, 0.0);
}

#[test]
fn norm_is_zero_until_weights_are_refreshed() {
    let mut c = classifier();
    c.add_text("foo").unwrap();
    c.add_text("bar").unwrap();
    c.build_vector("foo_1", "foo", None).unwrap();
    assert_eq!(c.norm("foo_1").unwrap(), Some(0.0));

    c.recompute_idf().unwrap();
    assert_eq!(c.norm("foo_1").unwrap(), Some(0.0));
    c.recompute_all_norms().unwrap();
    assert!(c.norm("foo_1").unwrap().unwrap() > 0.0);
}

#[test]
fn refreshed_norms_equal_fresh_norms() {
    let c = trained();
    for entry in c.vectors() {
        let entry = entry.unwrap();
        let fresh = c.tfidf_norm(&entry.items).unwrap();
        assert_eq!(c.norm(&entry.name).unwrap(), Some(fresh));
    }
}

#[test]
fn vectors_use_max_normalized_tf_sorted_by_index() {
    let mut c = classifier();
    c.add_text("banana apple").unwrap();
    let entry = c.build_vector("fruit", "apple apple banana cherry", None).unwrap().unwrap();
    // cherry is unknown to the dictionary
    assert_eq!(entry.items.len(), 2);
    assert_eq!(entry.items[0].term, "banana");
    assert_eq!(entry.items[0].tf, 0.5);
    assert_eq!(entry.items[1].term, stem(&c, "apple"));
    assert_eq!(entry.items[1].tf, 1.0);
    c.verify_vector("fruit").unwrap();
}

#[test]
fn every_built_vector_is_consistent() {
    let c = trained();
    for name in c.vector_names().unwrap() {
        c.verify_vector(&name).unwrap();
    }
}

#[test]
fn self_similarity_is_one() {
    let c = trained();
    assert_eq!(c.cosine_similarity("sport_1", "sport_1").unwrap(), Some(1.0));
}

#[test]
fn disjoint_vocabularies_are_orthogonal() {
    let mut c = classifier();
    c.add_text("foo").unwrap();
    c.add_text("bar").unwrap();
    c.build_vector("foo_vec", "foo", None).unwrap();
    c.build_vector("bar_vec", "bar", None).unwrap();
    c.refresh_weights().unwrap();
    assert_eq!(c.cosine_similarity("foo_vec", "bar_vec").unwrap(), Some(0.0));
}

#[test]
fn similarity_is_symmetric_and_bounded() {
    let c = trained();
    let uv = c.cosine_similarity("sport_1", "sport_2").unwrap().unwrap();
    let vu = c.cosine_similarity("sport_2", "sport_1").unwrap().unwrap();
    assert_eq!(uv, vu);
    assert!(uv > 0.0 && uv < 1.0);
    let u = c.vector("sport_1").unwrap().unwrap();
    let v = c.vector("sport_2").unwrap().unwrap();
    assert_eq!(c.scalar_product(&u, &v).unwrap(), c.scalar_product(&v, &u).unwrap());
}

#[test]
fn zero_norm_similarity_degrades_to_zero() {
    let mut c = classifier();
    c.add_text("shared").unwrap();
    c.build_vector("a", "shared", None).unwrap();
    c.build_vector("b", "shared", None).unwrap();
    c.refresh_weights().unwrap();
    // single document: every idf is 0
    assert_eq!(c.cosine_similarity("a", "b").unwrap(), Some(0.0));
}

#[test]
fn similarity_with_absent_vector_is_none() {
    let c = trained();
    assert_eq!(c.cosine_similarity("sport_1", "nope").unwrap(), None);
}

#[test]
fn empty_text_builds_nothing() {
    let mut c = classifier();
    assert!(c.build_vector("empty", "", None).unwrap().is_none());
    assert!(c.build_vector("stop", "the and of", Some("ART")).unwrap().is_none());
    assert!(c.vector("empty").unwrap().is_none());
    assert_eq!(c.vector_count(), 0);
}

#[test]
fn remove_then_rebuild_starts_fresh() {
    let mut c = trained();
    c.set_category("sport_1", "ARCHIVE").unwrap();
    c.remove_vector("sport_1").unwrap();
    assert!(c.vector("sport_1").unwrap().is_none());
    assert!(c.norm("sport_1").unwrap().is_none());
    c.remove_vector("sport_1").unwrap();

    c.build_vector("sport_1", SPORT_1, None).unwrap();
    assert_eq!(c.category("sport_1").unwrap(), None);
    assert_eq!(c.vector_names().unwrap().last().map(String::as_str), Some("sport_1"));
}

#[test]
fn rebuilding_an_existing_name_is_refused() {
    let mut c = classifier();
    c.add_text("football goal").unwrap();
    c.add_text("recipe oven").unwrap();
    c.build_vector("espn", "football goal", Some("SPORT")).unwrap();
    let before = c.vector("espn").unwrap().unwrap();
    let norm = c.norm("espn").unwrap();

    let err = c.build_vector("espn", "recipe oven", None).unwrap_err();
    assert!(matches!(err, ClassifierError::VectorExists { name } if name == "espn"));
    assert_eq!(c.vector("espn").unwrap().unwrap(), before);
    assert_eq!(c.norm("espn").unwrap(), norm);
    assert_eq!(c.vector_names().unwrap(), ["espn"]);
}

#[test]
fn set_category_requires_existing_vector() {
    let mut c = trained();
    c.set_category("sport_2", "FOOTBALL").unwrap();
    assert_eq!(c.category("sport_2").unwrap().as_deref(), Some("FOOTBALL"));
    let err = c.set_category("missing", "ART").unwrap_err();
    assert!(matches!(err, ClassifierError::VectorNotFound { .. }));
}

#[test]
fn k_nearest_returns_highest_in_ascending_order() {
    let mut c = trained();
    c.build_vector("target", "striker goal football stadium", None).unwrap();
    let candidates = ["sport_1", "sport_2", "cooking_1", "cooking_2", "missing"];
    let all = c.k_nearest("target", &candidates, 10, 0.1).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].similarity <= all[1].similarity);
    assert!(all.iter().all(|n| n.category.as_deref() == Some("SPORT")));

    let top = c.k_nearest("target", &candidates, 1, 0.1).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0], all[1]);
}

#[test]
fn evaluate_category_votes_among_neighbors() {
    let mut c = trained();
    let candidates = c.vector_names().unwrap();
    c.build_vector("dessert", "butter sugar recipe", None).unwrap();
    let estimate = c.evaluate_category("dessert", &candidates).unwrap().unwrap();
    assert_eq!(estimate.category, "COOKING");
    assert!(estimate.average_similarity > 0.1);
    assert!(estimate.average_similarity <= 1.0);
}

#[test]
fn evaluate_category_without_neighbors_is_none() {
    let mut c = trained();
    let candidates = c.vector_names().unwrap();
    c.build_vector("alien", "quasar nebula", None).unwrap();
    assert!(c.evaluate_category("alien", &candidates).unwrap().is_none());
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClassifierConfig { data_dir: dir.path().join("db"), ..Default::default() };

    let (terms, norm) = {
        let mut c = Classifier::open(config.clone()).unwrap();
        c.add_text(SPORT_1).unwrap();
        c.add_text(COOKING_1).unwrap();
        c.build_vector("sport_1", SPORT_1, Some("SPORT")).unwrap();
        c.refresh_weights().unwrap();
        (c.term_count(), c.norm("sport_1").unwrap())
    };

    let mut c = Classifier::open(config.clone()).unwrap();
    assert_eq!(c.document_count(), 2);
    assert_eq!(c.term_count(), terms);
    assert_eq!(c.norm("sport_1").unwrap(), norm);
    assert_eq!(c.category("sport_1").unwrap().as_deref(), Some("SPORT"));
    assert_eq!(c.observe("novel").unwrap(), terms);
    drop(c);

    let french = ClassifierConfig { language: Language::French, ..config };
    assert!(matches!(Classifier::open(french), Err(ClassifierError::LanguageMismatch { .. })));
}

#[test]
fn shared_readers_run_alongside_writer() {
    let shared = SharedClassifier::new(trained());
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let sim = shared.cosine_similarity("sport_1", "sport_2").unwrap().unwrap();
                    assert!((0.0..=1.0).contains(&sim));
                }
            })
        })
        .collect();
    for i in 0..5 {
        shared.add_text(&format!("football extra{i}")).unwrap();
        shared.refresh_weights().unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(shared.read().document_count(), 9);
}

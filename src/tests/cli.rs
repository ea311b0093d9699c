use std::sync::Arc;

use super::{mixed_catalog, recommender_with, KeywordEncoder};
use crate::cli::{render_hits, resolve_request};
use crate::config::Config;

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[test]
fn test_k_above_http_cap_returns_whole_catalog() {
    let config = Config::default();
    let k = i64::try_from(config.max_k).unwrap() + 30;

    let (mood_text, k) =
        resolve_request(&words("calm and quiet"), Some(k), config.default_k).unwrap();
    assert_eq!(k, config.max_k + 30);

    let catalog = mixed_catalog();
    let rec = recommender_with(catalog.clone(), Arc::new(KeywordEncoder::new()));
    let hits = rec.recommend(&mood_text, k).unwrap();

    assert_eq!(hits.len(), catalog.len());
    assert_eq!(hits[0].item.id, "calm-1");

    let out = render_hits(rec.model(), &hits);
    assert_eq!(out.lines().count(), catalog.len() + 1);
}

#[test]
fn test_blank_text_rejected() {
    let config = Config::default();
    for text in ["", "   ", "\t \n"] {
        let err = resolve_request(&words(text), Some(3), config.default_k).unwrap_err();
        assert!(err.is_client_error(), "{text:?}");
    }
}

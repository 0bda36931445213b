use super::*;

fn key(s: &str) -> MeasurementKey {
    s.parse().unwrap()
}

fn names(keys: &[MeasurementKey]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[test]
fn keys_are_canonical_regardless_of_order() {
    assert_eq!(key("CA"), key("AC"));
    assert_eq!(key("CA").to_string(), "AC");
    assert_eq!(MeasurementKey::new(3, 1), MeasurementKey::new(1, 3));
    assert!(MeasurementKey::new(2, 2).is_none());
}

#[test]
fn malformed_keys_are_rejected() {
    assert!(matches!("A".parse::<MeasurementKey>(), Err(KeyError::Length(_))));
    assert!(matches!("ABC".parse::<MeasurementKey>(), Err(KeyError::Length(_))));
    assert!(matches!("a1".parse::<MeasurementKey>(), Err(KeyError::Label(_))));
    assert!(matches!("BB".parse::<MeasurementKey>(), Err(KeyError::SameCorner(_))));
}

#[test]
fn diagonal_keys_for_four_and_six() {
    assert_eq!(names(&diagonal_keys(4)), ["AC", "BD"]);
    assert_eq!(names(&diagonal_keys(5)), ["AC", "AD", "BD", "BE", "CE"]);
    let six = diagonal_keys(6);
    assert_eq!(
        names(&six),
        ["AC", "AD", "AE", "BD", "BE", "BF", "CE", "CF", "DF"]
    );
    let edges = edge_keys(6);
    assert!(six.iter().all(|d| !edges.contains(d)));
}

#[test]
fn edge_keys_follow_polygon_order() {
    assert_eq!(names(&edge_keys(3)), ["AB", "BC", "AC"]);
    assert_eq!(names(&edge_keys(4)), ["AB", "BC", "CD", "AD"]);
    assert!(diagonal_keys(3).is_empty());
}

#[test]
fn counts_match_polygon_invariant_and_generalize() {
    for n in 3..=12 {
        assert_eq!(edge_keys_any(n).len(), n);
        assert_eq!(diagonal_keys_any(n).len(), n * (n - 1) / 2 - n);
    }
}

#[test]
fn unsupported_corner_counts_are_no_ops() {
    for n in [0, 1, 2, 7, 30] {
        assert!(edge_keys(n).is_empty());
        assert!(diagonal_keys(n).is_empty());
        assert!(fan_diagonal_keys(n).is_empty());
    }
    let map = MeasurementMap::new();
    assert!(MeasurementGraph::new(2, &map).is_none());
}

#[test]
fn key_kind_depends_on_corner_count() {
    assert_eq!(key("AC").kind(3), Some(KeyKind::Edge));
    assert_eq!(key("AC").kind(4), Some(KeyKind::Diagonal));
    assert_eq!(key("AE").kind(5), Some(KeyKind::Edge));
    assert_eq!(key("AE").kind(4), None);
    assert!(key("AD").is_fan_diagonal(5));
    assert!(!key("BD").is_fan_diagonal(5));
}

#[test]
fn map_refuses_non_positive_values() {
    let mut map = MeasurementMap::new();
    assert!(!map.insert(key("AB"), 0.0));
    assert!(!map.insert(key("AB"), -1.0));
    assert!(!map.insert(key("AB"), f64::NAN));
    assert!(map.insert(key("AB"), 1200.0));
    assert_eq!(map.get(key("BA")), Some(1200.0));
}

#[test]
fn map_deserializes_canonically_and_drops_bad_entries() {
    let map: MeasurementMap =
        serde_json::from_str(r#"{"CA": 5000.0, "AB": 3000.0, "BC": -4.0}"#).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(key("AC")), Some(5000.0));
    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"{"AB":3000.0,"AC":5000.0}"#);
    assert!(serde_json::from_str::<MeasurementMap>(r#"{"AAA": 1.0}"#).is_err());
}

#[test]
fn content_hash_tracks_values() {
    let a = MeasurementMap::new().with(key("AB"), 3000.0).with(key("BC"), 4000.0);
    let b = MeasurementMap::new().with(key("BC"), 4000.0).with(key("AB"), 3000.0);
    assert_eq!(a.content_hash(), b.content_hash());
    let c = a.clone().with(key("BC"), 4000.5);
    assert_ne!(a.content_hash(), c.content_hash());
}

#[test]
fn graph_reports_fan_and_cross_checks() {
    let map = MeasurementMap::new()
        .with(key("AB"), 3000.0)
        .with(key("BC"), 3000.0)
        .with(key("CD"), 3000.0)
        .with(key("AD"), 3000.0)
        .with(key("BD"), 4242.64)
        .with(key("AF"), 10.0);
    let g = MeasurementGraph::new(4, &map).unwrap();
    assert_eq!(names(&g.fan_keys()), ["AB", "BC", "AC", "CD", "AD"]);
    assert_eq!(names(&g.missing_fan()), ["AC"]);
    assert!(!g.is_fan_complete());
    assert_eq!(g.cross_checks(), vec![(key("BD"), 4242.64)]);
    assert_eq!(g.entered_edges().len(), 4);
    assert_eq!(g.neighbours(1).count(), 3);
    assert_eq!(names(&g.foreign_keys()), ["AF"]);
    assert_eq!(g.length(3, 1), Some(4242.64));
}

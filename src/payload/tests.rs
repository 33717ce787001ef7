use super::*;
use serde_json::json;

#[test]
fn test_valid_location_returned_unchanged() {
    let value = validate(FieldKind::Location, b"[30.28, -97.74]").unwrap();
    assert_eq!(
        value,
        FieldValue::Location(Location {
            lat: 30.28,
            lng: -97.74
        })
    );
}

#[test]
fn test_location_bounds_are_inclusive() {
    for raw in ["[90, 180]", "[-90, -180]", "[0, 0]"] {
        assert!(
            validate(FieldKind::Location, raw.as_bytes()).is_ok(),
            "expected {} to be accepted",
            raw
        );
    }
}

#[test]
fn test_location_out_of_range_fails() {
    for raw in ["[91, 0]", "[0, 180.5]", "[-90.01, 0]", "[0, -181]"] {
        let result = validate(FieldKind::Location, raw.as_bytes());
        assert!(
            matches!(result, Err(ValidationError::ShapeOrRange(_))),
            "expected {} to be rejected",
            raw
        );
    }
}

#[test]
fn test_location_wrong_shape_fails() {
    for raw in ["[30.28]", "[1, 2, 3]", "{\"lat\": 1, \"lng\": 2}", "[\"30\", \"-97\"]", "42", "null"] {
        let result = validate(FieldKind::Location, raw.as_bytes());
        assert!(
            matches!(result, Err(ValidationError::ShapeOrRange(_))),
            "expected {} to be rejected",
            raw
        );
    }
}

#[test]
fn test_undecodable_payload_is_malformed() {
    for kind in [
        FieldKind::Location,
        FieldKind::Color,
        FieldKind::TeamScores,
        FieldKind::UserScores,
    ] {
        let result = validate(kind, b"[30.28, -97.74");
        assert!(matches!(result, Err(ValidationError::Malformed(_))));
    }
    assert!(matches!(
        validate(FieldKind::Color, b""),
        Err(ValidationError::Malformed(_))
    ));
}

#[test]
fn test_valid_color() {
    let value = validate(FieldKind::Color, b"[255, 0, 128]").unwrap();
    assert_eq!(value, FieldValue::Color(Rgb::new(255, 0, 128)));
}

#[test]
fn test_color_rejects_out_of_range_and_non_integers() {
    for raw in ["[256, 0, 0]", "[-1, 0, 0]", "[1.5, 0, 0]", "[1, 2]", "[1, 2, 3, 4]", "[\"1\", 2, 3]"] {
        let result = validate(FieldKind::Color, raw.as_bytes());
        assert!(
            matches!(result, Err(ValidationError::ShapeOrRange(_))),
            "expected {} to be rejected",
            raw
        );
    }
}

#[test]
fn test_display_name_is_raw_text() {
    // Not JSON: taken verbatim
    let value = validate(FieldKind::DisplayName, b"Perry-Castaneda Library").unwrap();
    assert_eq!(
        value,
        FieldValue::DisplayName(Some("Perry-Castaneda Library".to_string()))
    );
}

#[test]
fn test_empty_display_name_is_absent() {
    let value = validate(FieldKind::DisplayName, b"").unwrap();
    assert_eq!(value, FieldValue::DisplayName(None));
}

#[test]
fn test_display_name_invalid_utf8_is_malformed() {
    let result = validate(FieldKind::DisplayName, &[0xff, 0xfe, 0x41]);
    assert!(matches!(result, Err(ValidationError::Malformed(_))));
}

#[test]
fn test_valid_scores() {
    let value = validate(FieldKind::TeamScores, br#"{"Red": 10, "Blue": 2.5}"#).unwrap();
    let FieldValue::TeamScores(scores) = value else {
        panic!("expected team scores");
    };
    assert_eq!(scores.len(), 2);
    assert_eq!(scores.get("Red"), Some(10.0));
    assert_eq!(scores.get("Blue"), Some(2.5));
}

#[test]
fn test_empty_score_mapping_is_valid() {
    let value = validate(FieldKind::UserScores, b"{}").unwrap();
    assert_eq!(value, FieldValue::UserScores(Scoreboard::new()));
}

#[test]
fn test_mixed_score_mapping_rejected_in_full() {
    let result = validate(FieldKind::UserScores, br#"{"alice": 5, "bob": "x"}"#);
    assert_eq!(
        result,
        Err(ValidationError::MixedTypes {
            key: "bob".to_string()
        })
    );

    let result = validate(FieldKind::TeamScores, br#"{"Red": null}"#);
    assert!(matches!(result, Err(ValidationError::MixedTypes { .. })));
}

#[test]
fn test_non_object_scores_fail_shape() {
    for raw in ["[1, 2]", "5", "\"Red\"", "null"] {
        let result = validate(FieldKind::TeamScores, raw.as_bytes());
        assert!(
            matches!(result, Err(ValidationError::ShapeOrRange(_))),
            "expected {} to be rejected",
            raw
        );
    }
}

#[test]
fn test_validate_value_display_name() {
    assert_eq!(
        validate_value(FieldKind::DisplayName, &json!("Union")).unwrap(),
        FieldValue::DisplayName(Some("Union".to_string()))
    );
    assert_eq!(
        validate_value(FieldKind::DisplayName, &json!("")).unwrap(),
        FieldValue::DisplayName(None)
    );
    assert!(matches!(
        validate_value(FieldKind::DisplayName, &json!(12)),
        Err(ValidationError::ShapeOrRange(_))
    ));
}

#[test]
fn test_validation_is_deterministic() {
    let raw = br#"{"Red": 3, "Blue": 4}"#;
    assert_eq!(
        validate(FieldKind::TeamScores, raw),
        validate(FieldKind::TeamScores, raw)
    );
}

#[test]
fn test_field_kind_segments() {
    for kind in FieldKind::ALL {
        assert_eq!(FieldKind::from_segment(kind.segment()), Some(kind));
    }
    assert_eq!(FieldKind::from_segment("photo"), None);
    assert_eq!(FieldKind::from_segment("Coord"), None);
}

#[test]
fn test_rgb_hex() {
    assert_eq!(Rgb::new(255, 0, 0).to_hex(), "#ff0000");
    assert_eq!(Rgb::new(1, 2, 3).to_hex(), "#010203");
    assert_eq!(Rgb::DEFAULT.to_hex(), "#000000");
}

#[test]
fn test_location_flip() {
    let location = Location {
        lat: 30.28,
        lng: -97.74,
    };
    assert_eq!(location.lat_lng(), [30.28, -97.74]);
    assert_eq!(location.lng_lat(), [-97.74, 30.28]);
}

#[test]
fn test_scoreboard_ranked() {
    let scores: Scoreboard = [("alice", 30.0), ("bob", 120.0), ("carol", 30.0)]
        .into_iter()
        .collect();
    let ranked = scores.ranked();
    assert_eq!(ranked, vec![("bob", 120.0), ("alice", 30.0), ("carol", 30.0)]);
}

use dyssol::names::{
    composition_label, distr_type, parse_composition_label, parse_overall, parse_phase, phase_from_index,
};
use dyssol::{DistrType, DyssolError, OverallProperty, Phase, PhaseSpec};

// ═══════════════════════════════════════════════════════════════════
//  Phases
// ═══════════════════════════════════════════════════════════════════

#[test]
fn phases_from_any_spelling() {
    let specs: Vec<PhaseSpec> = vec![
        "solid".into(),
        "LIQUID".into(),
        "Gas".into(),
        1i64.into(),
        2i64.into(),
    ];
    let phases: Vec<Phase> = specs.iter().map(|s| s.resolve().unwrap()).collect();
    assert_eq!(
        phases,
        vec![Phase::Solid, Phase::Liquid, Phase::Vapor, Phase::Liquid, Phase::Vapor]
    );
    assert_eq!(phases[2].to_string(), "vapor");
}

#[test]
fn phase_names_ignore_surrounding_whitespace() {
    assert_eq!(parse_phase(" solid ").unwrap(), Phase::Solid);
    assert_eq!(parse_phase("\tgas\n").unwrap(), Phase::Vapor);
    assert!(parse_phase("so lid").is_err());
    assert!(parse_phase("   ").is_err());
}

#[test]
fn unknown_phase_is_invalid() {
    assert!(matches!(parse_phase("plasma"), Err(DyssolError::InvalidArgument(_))));
    assert!(matches!(phase_from_index(3), Err(DyssolError::InvalidArgument(_))));
    assert!(matches!(phase_from_index(-1), Err(DyssolError::InvalidArgument(_))));
}

#[test]
fn phase_specs_deserialize_untagged() {
    let specs: Vec<PhaseSpec> = serde_json::from_str(r#"["vapor", 0]"#).unwrap();
    assert_eq!(specs[0].resolve().unwrap(), Phase::Vapor);
    assert_eq!(specs[1].resolve().unwrap(), Phase::Solid);
}

// ═══════════════════════════════════════════════════════════════════
//  Labels and keys
// ═══════════════════════════════════════════════════════════════════

#[test]
fn labels_round_trip() {
    for phase in Phase::ALL {
        let label = composition_label("Sand", phase);
        assert_eq!(parse_composition_label(&label).unwrap(), ("Sand".to_string(), phase));
    }
    assert_eq!(composition_label("Water", Phase::Liquid), "Water [liquid]");
}

#[test]
fn bare_name_defaults_to_solid() {
    assert_eq!(
        parse_composition_label("Sand").unwrap(),
        ("Sand".to_string(), Phase::Solid)
    );
}

#[test]
fn overall_keys_depend_on_flow() {
    assert_eq!(OverallProperty::Mass.key(true), "massflow");
    assert_eq!(OverallProperty::Mass.key(false), "mass");
    assert_eq!(parse_overall("massflow").unwrap(), OverallProperty::Mass);
    assert_eq!(parse_overall("pressure").unwrap(), OverallProperty::Pressure);
    assert!(matches!(parse_overall("density"), Err(DyssolError::InvalidArgument(_))));
}

#[test]
fn distribution_names() {
    assert_eq!(distr_type("Size").unwrap(), DistrType::Size);
    assert_eq!(distr_type("Compounds").unwrap(), DistrType::Compounds);
    match distr_type("Weight") {
        Err(DyssolError::InvalidArgument(msg)) => assert!(msg.contains("Size"), "got {msg}"),
        other => panic!("expected InvalidArgument, got {other:?}"),
    }
}

mod common;

use approx::assert_abs_diff_eq;
use indexmap::IndexMap;

use dyssol::backend::memory::MemoryStream;
use dyssol::engine::ModelDescriptor;
use dyssol::{Dyssol, DyssolError, MemoryEngine, MemoryModels, MemoryUnit, StreamData, StreamSeries, Value};

fn sand_and_water() -> StreamData {
    StreamData::new()
        .overall("temperature", 320.0)
        .overall("pressure", 2e5)
        .composition("Sand [solid]", 2.0)
        .composition("Water [liquid]", 3.0)
}

// ═══════════════════════════════════════════════════════════════════
//  Feeds
// ═══════════════════════════════════════════════════════════════════

#[test]
fn feed_composition_sets_phase_totals_and_mass() {
    let mut sim = common::sim();
    sim.set_unit_feed("Granulator", None, &sand_and_water(), None).unwrap();

    let feed = sim.get_unit_feed("Granulator", Some("InletFeed"), 0.0).unwrap();
    let keys: Vec<&str> = feed.overall.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["massflow", "temperature", "pressure"]);
    assert_abs_diff_eq!(feed.overall["massflow"], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(feed.overall["temperature"], 320.0, epsilon = 1e-12);
    assert_abs_diff_eq!(feed.overall["pressure"], 2e5, epsilon = 1e-9);

    // Only non‑zero entries are reported
    assert_eq!(feed.composition.len(), 2);
    assert_abs_diff_eq!(feed.composition["Sand [solid]"], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(feed.composition["Water [liquid]"], 3.0, epsilon = 1e-12);
    assert!(!feed.composition.contains_key("Sand [liquid]"));
}

#[test]
fn explicit_mass_is_ignored_when_composition_is_given() {
    let mut sim = common::sim();
    let data = sand_and_water().overall("massflow", 100.0);
    sim.set_unit_feed("Granulator", None, &data, None).unwrap();
    let overall = sim.get_unit_feed_overall("Granulator", None, 0.0).unwrap();
    assert_abs_diff_eq!(overall["massflow"], 5.0, epsilon = 1e-12);

    // Without composition the mass is taken as given
    let data = StreamData::new().overall("massflow", 7.5);
    sim.set_unit_feed("Granulator", Some("Recycle"), &data, None).unwrap();
    let overall = sim.get_unit_feed_overall("Granulator", Some("Recycle"), 0.0).unwrap();
    assert_abs_diff_eq!(overall["massflow"], 7.5, epsilon = 1e-12);
}

#[test]
fn composition_labels_by_key_and_bare_name() {
    let mut sim = common::sim();
    let data = StreamData::new()
        .composition("C_WATER [liquid]", 1.0)
        .composition("Sand", 4.0);
    sim.set_unit_feed("Granulator", None, &data, Some(0.0)).unwrap();

    let comp = sim.get_unit_feed_composition("Granulator", None, 0.0).unwrap();
    assert_abs_diff_eq!(comp["Water [liquid]"], 1.0, epsilon = 1e-12);
    // A bare name goes to the solid phase
    assert_abs_diff_eq!(comp["Sand [solid]"], 4.0, epsilon = 1e-12);
}

#[test]
fn bad_labels_are_rejected() {
    let mut sim = common::sim();
    let unknown_phase = StreamData::new().composition("Sand [plasma]", 1.0);
    assert!(matches!(
        sim.set_unit_feed("Granulator", None, &unknown_phase, None),
        Err(DyssolError::InvalidArgument(_))
    ));
    let unknown_compound = StreamData::new().composition("Gold [solid]", 1.0);
    assert!(matches!(
        sim.set_unit_feed("Granulator", None, &unknown_compound, None),
        Err(DyssolError::NotFound(_))
    ));
    let unknown_overall = StreamData::new().overall("density", 1.0);
    assert!(matches!(
        sim.set_unit_feed("Granulator", None, &unknown_overall, None),
        Err(DyssolError::InvalidArgument(_))
    ));
}

#[test]
fn feed_names_and_defaulting() {
    let sim = common::sim();
    assert_eq!(sim.get_unit_feeds("Granulator").unwrap(), vec!["InletFeed", "Recycle"]);
    assert!(sim.get_unit_feeds("Splitter").unwrap().is_empty());

    match sim.get_unit_feed("Granulator", Some("Bypass"), 0.0) {
        Err(DyssolError::NotFound(msg)) => assert!(msg.contains("Bypass"), "got {msg}"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(matches!(
        sim.get_unit_feed("Splitter", None, 0.0),
        Err(DyssolError::NotFound(_))
    ));
}

#[test]
fn feed_write_reaches_initial_state() {
    let mut sim = common::sim();
    sim.set_unit_feed("Granulator", Some("Recycle"), &sand_and_water(), Some(0.0)).unwrap();

    // Initialization restarts feeds from their initial state
    assert_eq!(sim.initialize(), "");
    let feed = sim.get_unit_feed("Granulator", Some("Recycle"), 0.0).unwrap();
    assert_abs_diff_eq!(feed.overall["massflow"], 5.0, epsilon = 1e-12);
    assert_abs_diff_eq!(feed.composition["Sand [solid]"], 2.0, epsilon = 1e-12);
}

#[test]
fn feed_without_initial_copy_is_not_written() {
    let model = ModelDescriptor {
        key: "M_MIX".to_string(),
        name: "Mixer".to_string(),
        author: String::new(),
    };
    let mut mixer = MemoryUnit::new("Mixer", Some(model));
    mixer.feeds.push(MemoryStream::new("Bare"));
    let mut plant = common::flowsheet();
    plant.add_unit(mixer);
    let mut sim = Dyssol::with_engine(MemoryEngine::new(plant, common::materials(), MemoryModels::default()));

    match sim.set_unit_feed("Mixer", None, &sand_and_water(), None) {
        Err(DyssolError::NotFound(msg)) => assert!(msg.contains("Initial feed 'Bare'"), "got {msg}"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    let feed = sim.get_unit_feed("Mixer", None, 0.0).unwrap();
    assert!(feed.composition.is_empty(), "working feed must stay untouched");
}

// ═══════════════════════════════════════════════════════════════════
//  Distributions
// ═══════════════════════════════════════════════════════════════════

#[test]
fn distribution_is_normalized() {
    let mut sim = common::sim();
    let data = StreamData::new().distribution("Size", vec![1.0, 1.0, 1.0, 1.0, 0.0]);
    sim.set_unit_feed("Granulator", None, &data, None).unwrap();

    let distr = sim.get_unit_feed_distribution("Granulator", None, 0.0).unwrap();
    let size = &distr["Size"];
    assert_eq!(size.len(), 5);
    assert_abs_diff_eq!(size.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(size[0], 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(size[4], 0.0, epsilon = 1e-12);

    // Flowing stream‑likes also report the compound dimension
    assert_eq!(distr["Compounds"].len(), 2);
}

#[test]
fn distribution_length_must_match_grid() {
    let mut sim = common::sim();
    let data = StreamData::new()
        .composition("Sand [solid]", 1.0)
        .distribution("Size", vec![1.0, 2.0, 3.0]);
    match sim.set_unit_feed("Granulator", None, &data, None) {
        Err(DyssolError::SizeMismatch(msg)) => assert!(msg.contains("Size"), "got {msg}"),
        other => panic!("expected SizeMismatch, got {other:?}"),
    }
    // Nothing was written
    let comp = sim.get_unit_feed_composition("Granulator", None, 0.0).unwrap();
    assert!(comp.is_empty());
}

#[test]
fn zero_sum_and_unknown_distributions() {
    let mut sim = common::sim();
    let zero = StreamData::new().distribution("Size", vec![0.0; 5]);
    assert!(matches!(
        sim.set_unit_feed("Granulator", None, &zero, None),
        Err(DyssolError::InvalidArgument(_))
    ));
    let unknown = StreamData::new().distribution("Weight", vec![1.0]);
    assert!(matches!(
        sim.set_unit_feed("Granulator", None, &unknown, None),
        Err(DyssolError::InvalidArgument(_))
    ));
    // Known type, but not part of this flowsheet's grid
    let absent = StreamData::new().distribution("Moisture", vec![1.0]);
    assert!(matches!(
        sim.set_unit_feed("Granulator", None, &absent, None),
        Err(DyssolError::InvalidArgument(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════
//  Holdups
// ═══════════════════════════════════════════════════════════════════

#[test]
fn holdup_reports_mass_and_skips_compound_dimension() {
    let mut sim = common::sim();
    let data = StreamData::new()
        .composition("C_SAND [solid]", 4.0)
        .distribution("Size", vec![0.0, 1.0, 1.0, 0.0, 0.0]);
    sim.set_unit_holdup("Granulator", None, &data, None).unwrap();

    let holdup = sim.get_unit_holdup("Granulator", Some("Holdup"), 0.0).unwrap();
    assert!(holdup.overall.contains_key("mass"));
    assert!(!holdup.overall.contains_key("massflow"));
    assert_abs_diff_eq!(holdup.overall["mass"], 4.0, epsilon = 1e-12);

    let dims: Vec<&str> = holdup.distributions.keys().map(String::as_str).collect();
    assert_eq!(dims, vec!["Size"]);
    assert_abs_diff_eq!(holdup.distributions["Size"][1], 0.5, epsilon = 1e-12);
}

#[test]
fn holdup_write_reaches_initial_state() {
    let mut sim = common::sim();
    let data = StreamData::new().composition("Water [liquid]", 6.0);
    sim.set_unit_holdup("Granulator", None, &data, None).unwrap();

    // Initialization restarts holdups from their initial state
    assert_eq!(sim.initialize(), "");
    let comp = sim.get_unit_holdup_composition("Granulator", None, 0.0).unwrap();
    assert_abs_diff_eq!(comp["Water [liquid]"], 6.0, epsilon = 1e-12);
    let overall = sim.get_unit_holdup_overall("Granulator", None, 0.0).unwrap();
    assert_abs_diff_eq!(overall["mass"], 6.0, epsilon = 1e-12);
}

// ═══════════════════════════════════════════════════════════════════
//  Unit streams and flowsheet streams
// ═══════════════════════════════════════════════════════════════════

#[test]
fn unit_stream_round_trip() {
    let mut sim = common::sim();
    assert_eq!(sim.get_unit_streams("Granulator").unwrap(), vec!["Internal"]);
    sim.set_unit_stream("Granulator", None, &sand_and_water(), Some(5.0)).unwrap();
    let record = sim.get_unit_stream("Granulator", Some("Internal"), 5.0).unwrap();
    assert_abs_diff_eq!(record.overall["massflow"], 5.0, epsilon = 1e-12);
    assert_eq!(record.composition.len(), 2);
}

#[test]
fn flowsheet_stream_interpolates_between_points() {
    let mut sim = common::sim();
    assert_eq!(sim.get_streams(), vec!["S_in", "S_out"]);

    sim.set_stream("S_in", &StreamData::new().overall("massflow", 1.0), Some(0.0)).unwrap();
    sim.set_stream("S_in", &StreamData::new().overall("massflow", 3.0), Some(10.0)).unwrap();

    let mid = sim.get_stream_overall("S_in", 5.0).unwrap();
    assert_abs_diff_eq!(mid["massflow"], 2.0, epsilon = 1e-12);
    let late = sim.get_stream_overall("S_in", 50.0).unwrap();
    assert_abs_diff_eq!(late["massflow"], 3.0, epsilon = 1e-12);

    assert!(matches!(
        sim.get_stream("S_missing", 0.0),
        Err(DyssolError::NotFound(_))
    ));
}

#[test]
fn record_output_feeds_back_as_input() {
    let mut sim = common::sim();
    let data = sand_and_water().distribution("Size", vec![1.0, 1.0, 2.0, 0.0, 0.0]);
    sim.set_unit_feed("Granulator", None, &data, None).unwrap();
    let record = sim.get_unit_feed("Granulator", None, 0.0).unwrap();
    assert_abs_diff_eq!(record.distributions["Compounds"][0], 0.4, epsilon = 1e-12);

    sim.set_stream("S_out", &StreamData::from(record.clone()), None).unwrap();
    let copy = sim.get_stream("S_out", 0.0).unwrap();
    assert_eq!(copy.composition, record.composition);
    assert_abs_diff_eq!(copy.overall["massflow"], record.overall["massflow"], epsilon = 1e-12);
    assert_abs_diff_eq!(copy.distributions["Size"][2], 0.5, epsilon = 1e-12);
}

// ═══════════════════════════════════════════════════════════════════
//  All time points
// ═══════════════════════════════════════════════════════════════════

fn set_end_time(sim: &mut dyssol::Dyssol<dyssol::MemoryEngine>, end: f64) {
    let options = IndexMap::from([("endSimulationTime".to_string(), Value::Double(end))]);
    sim.set_options(&options).unwrap();
}

#[test]
fn series_is_extended_to_end_time() {
    let mut sim = common::sim();
    set_end_time(&mut sim, 20.0);
    sim.set_stream("S_in", &StreamData::new().overall("massflow", 1.0), Some(0.0)).unwrap();
    sim.set_stream("S_in", &StreamData::new().overall("massflow", 3.0), Some(10.0)).unwrap();

    let series = sim.get_stream_series("S_in").unwrap();
    assert_eq!(series.overall.timepoints, vec![0.0, 10.0, 20.0]);
    assert_eq!(series.overall.get("massflow").unwrap(), &[1.0, 3.0, 3.0]);
    // All‑zero composition and distribution series are dropped
    assert!(series.composition.series.is_empty());
    assert!(series.distributions.series.is_empty());
}

#[test]
fn series_is_not_extended_past_a_later_point() {
    let mut sim = common::sim();
    set_end_time(&mut sim, 20.0);
    sim.set_stream("S_in", &StreamData::new().overall("massflow", 1.0), Some(0.0)).unwrap();
    sim.set_stream("S_in", &StreamData::new().overall("massflow", 2.0), Some(30.0)).unwrap();

    let times = sim.get_stream_overall_series("S_in").unwrap().timepoints;
    assert_eq!(times, vec![0.0, 30.0]);
}

#[test]
fn empty_stream_series_has_only_end_time() {
    let mut sim = common::sim();
    set_end_time(&mut sim, 20.0);
    let series = sim.get_stream_overall_series("S_out").unwrap();
    assert_eq!(series.timepoints, vec![20.0]);
    assert_eq!(series.series.len(), 3);
}

#[test]
fn series_lengths_match_timepoints() {
    let mut sim = common::sim();
    set_end_time(&mut sim, 100.0);
    for (t, sand) in [(0.0, 1.0), (25.0, 2.0), (50.0, 4.0)] {
        let data = StreamData::new()
            .composition("Sand [solid]", sand)
            .distribution("Size", vec![1.0, 0.0, 0.0, 0.0, sand]);
        sim.set_unit_holdup("Granulator", None, &data, Some(t)).unwrap();
    }

    let series = sim.get_unit_holdup_series("Granulator", None).unwrap();
    let n = series.overall.timepoints.len();
    assert_eq!(series.overall.timepoints, vec![0.0, 25.0, 50.0, 100.0]);
    assert!(series.overall.timepoints.windows(2).all(|w| w[0] <= w[1]));
    assert!(*series.overall.timepoints.last().unwrap() >= 100.0);

    for values in series.overall.series.values() {
        assert_eq!(values.len(), n);
    }
    for values in series.composition.series.values() {
        assert_eq!(values.len(), n);
    }
    for rows in series.distributions.series.values() {
        assert_eq!(rows.len(), n);
    }
    assert_eq!(series.composition.get("Sand [solid]").unwrap(), &[1.0, 2.0, 4.0, 4.0]);
    assert!(series.composition.get("Water [liquid]").is_none());
    assert!(series.distributions.get("Size").is_some());
}

#[test]
fn compounds_sharing_a_name_get_distinct_labels() {
    let materials = dyssol::MemoryMaterials::with_compounds(&[
        ("C_SAND", "Sand"),
        ("C_SAND_FINE", "Sand"),
        ("C_WATER", "Water"),
    ]);
    let mut sim = Dyssol::with_engine(MemoryEngine::new(common::flowsheet(), materials, MemoryModels::default()));
    sim.set_compounds(&["C_SAND", "C_SAND_FINE", "C_WATER"]).unwrap();
    set_end_time(&mut sim, 20.0);

    let data = StreamData::new()
        .composition("C_SAND [solid]", 1.0)
        .composition("C_SAND_FINE [solid]", 2.0)
        .composition("Water [liquid]", 3.0);
    sim.set_unit_feed("Granulator", None, &data, None).unwrap();

    let record = sim.get_unit_feed("Granulator", None, 0.0).unwrap();
    let labels: Vec<&str> = record.composition.keys().map(String::as_str).collect();
    assert_eq!(labels, vec!["C_SAND [solid]", "C_SAND_FINE [solid]", "Water [liquid]"]);

    let series = sim.get_unit_feed_series("Granulator", None).unwrap();
    let n = series.composition.timepoints.len();
    assert_eq!(n, 2);
    for (label, values) in &series.composition.series {
        assert_eq!(values.len(), n, "series '{label}' must have one value per time point");
    }

    // Labels resolve back to the same compounds
    sim.set_stream("S_in", &StreamData::from(record.clone()), None).unwrap();
    assert_eq!(sim.get_stream("S_in", 0.0).unwrap().composition, record.composition);
}

// ═══════════════════════════════════════════════════════════════════
//  Series writes
// ═══════════════════════════════════════════════════════════════════

fn drop_time(series: &StreamSeries, time: f64) -> StreamSeries {
    let i = series.overall.timepoints.iter().position(|t| *t == time).unwrap();
    let mut out = series.clone();
    for section in [&mut out.overall, &mut out.composition] {
        section.timepoints.remove(i);
        for values in section.series.values_mut() {
            values.remove(i);
        }
    }
    out.distributions.timepoints.remove(i);
    for rows in out.distributions.series.values_mut() {
        rows.remove(i);
    }
    out
}

fn sandy_feed(sim: &mut Dyssol<MemoryEngine>) {
    set_end_time(sim, 20.0);
    sim.set_unit_feed("Granulator", None, &sand_and_water(), Some(0.0)).unwrap();
    let later = StreamData::new()
        .composition("Sand [solid]", 4.0)
        .composition("Water [liquid]", 3.0)
        .distribution("Size", vec![1.0, 1.0, 2.0, 0.0, 0.0]);
    sim.set_unit_feed("Granulator", None, &later, Some(10.0)).unwrap();
    sim.set_unit_feed("Granulator", None, &StreamData::new().composition("Sand [solid]", 9.0), Some(5.0))
        .unwrap();
}

#[test]
fn feed_series_round_trip() {
    let mut sim = common::sim();
    sandy_feed(&mut sim);
    let read = sim.get_unit_feed_series("Granulator", None).unwrap();
    assert_eq!(read.overall.timepoints, vec![0.0, 5.0, 10.0, 20.0]);

    // Drop t = 5 and raise the sand flow at t = 10
    let mut edited = drop_time(&read, 5.0);
    edited.composition.series.get_mut("Sand [solid]").unwrap()[1] = 6.0;
    sim.set_unit_feed_series("Granulator", None, &edited).unwrap();

    let back = sim.get_unit_feed_series("Granulator", None).unwrap();
    assert_eq!(back.overall.timepoints, vec![0.0, 10.0, 20.0], "unlisted points are removed");
    assert_eq!(back.composition.get("Sand [solid]").unwrap(), &[2.0, 6.0, 4.0]);
    assert_eq!(back.composition.get("Water [liquid]").unwrap(), &[3.0, 3.0, 3.0]);
    assert_eq!(back.overall.get("massflow").unwrap(), &[5.0, 9.0, 7.0]);
    assert_eq!(back.overall.get("temperature"), edited.overall.get("temperature"));
    let size = &back.distributions.get("Size").unwrap()[1];
    assert_abs_diff_eq!(size[2], 0.5, epsilon = 1e-12);

    // The initial copy got the same history
    assert_eq!(sim.initialize(), "");
    assert_eq!(sim.get_unit_feed_series("Granulator", None).unwrap(), back);
}

#[test]
fn malformed_feed_series_changes_nothing() {
    let mut sim = common::sim();
    sandy_feed(&mut sim);
    let read = sim.get_unit_feed_series("Granulator", None).unwrap();

    let mut short = drop_time(&read, 5.0);
    short.composition.series.get_mut("Sand [solid]").unwrap().pop();
    assert!(matches!(
        sim.set_unit_feed_series("Granulator", None, &short),
        Err(DyssolError::SizeMismatch(_))
    ));

    let mut shifted = drop_time(&read, 5.0);
    shifted.composition.timepoints[1] = 11.0;
    assert!(matches!(
        sim.set_unit_feed_series("Granulator", None, &shifted),
        Err(DyssolError::InvalidArgument(_))
    ));

    let mut bad_label = drop_time(&read, 5.0);
    let sand = bad_label.composition.series.shift_remove("Sand [solid]").unwrap();
    bad_label.composition.series.insert("Sand [plasma]".to_string(), sand);
    assert!(sim.set_unit_feed_series("Granulator", None, &bad_label).is_err());

    assert_eq!(sim.get_unit_feed_series("Granulator", None).unwrap(), read);
}

use dyssol::engine::{Flowsheet, GridClasses, GridDimension, ModelDescriptor, PhaseDescriptor, PortDirection};
use dyssol::parameters::ComboParameter;
use dyssol::{
    DistrType, Dyssol, MemoryEngine, MemoryFlowsheet, MemoryMaterials, MemoryModels, MemoryUnit,
    ParameterValue, Phase, StreamData, UnitParameter,
};

fn granulator() -> MemoryUnit {
    let model = ModelDescriptor {
        key: "M_GRAN".to_string(),
        name: "Granulator".to_string(),
        author: "Demo".to_string(),
    };
    MemoryUnit::new("Granulator", Some(model))
        .with_parameter(UnitParameter::new(
            "Kernel",
            "",
            ParameterValue::Combo(ComboParameter::new(&["Constant", "Kinetic"], "Constant")),
        ))
        .with_parameter(UnitParameter::new("Beta0", "1/s", ParameterValue::ConstDouble(1.0)))
        .with_parameter(UnitParameter::new("Rate constant", "1/s", ParameterValue::ConstDouble(0.5)))
        .with_group("Kernel", "Constant", &["Beta0"])
        .with_group("Kernel", "Kinetic", &["Rate constant"])
        .with_port("In", PortDirection::Input, Some("Inlet"))
        .with_port("Out", PortDirection::Output, Some("Product"))
        .with_feed("InletFeed")
        .with_holdup("Holdup")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Engine-side setup: one granulator between two streams.
    let mut plant = MemoryFlowsheet::new();
    plant.set_compounds(vec!["C_SAND".to_string(), "C_WATER".to_string()]);
    plant.set_phases(vec![
        PhaseDescriptor { state: Phase::Solid, name: "solid".to_string() },
        PhaseDescriptor { state: Phase::Liquid, name: "liquid".to_string() },
    ]);
    plant.set_grid(vec![GridDimension {
        kind: DistrType::Size,
        classes: GridClasses::Numeric(vec![0.0, 1e-4, 2e-4, 4e-4]),
    }]);
    plant.add_unit(granulator());
    plant.add_stream("Inlet").add_stream("Product");

    let materials = MemoryMaterials::with_compounds(&[("C_SAND", "Sand"), ("C_WATER", "Water")]);
    let mut sim = Dyssol::with_engine(MemoryEngine::new(plant, materials, MemoryModels::default()));

    println!("=== Flowsheet ===\n");
    println!("{}\n", sim.debug_flowsheet());

    // ── Parameters ──────────────────────────────────────────────────
    println!("Active parameters:");
    for (name, entry) in sim.get_unit_parameters("Granulator")? {
        println!("  {name} = {entry}");
    }
    sim.set_unit_parameter("Granulator", "Kernel", "Kinetic")?;
    sim.set_unit_parameter("Granulator", "Rate constant", 0.8)?;
    println!("\nAfter switching the kernel:");
    for (name, entry) in sim.get_unit_parameters("Granulator")? {
        println!("  {name} = {entry}");
    }

    // ── Feed ────────────────────────────────────────────────────────
    let feed = StreamData::new()
        .overall("temperature", 320.0)
        .composition("Sand [solid]", 2.0)
        .composition("Water [liquid]", 0.5)
        .distribution("Size", vec![1.0, 2.0, 1.0]);
    sim.set_unit_feed("Granulator", None, &feed, None)?;
    println!("\nFeed at t=0:\n{}\n", sim.get_unit_feed("Granulator", None, 0.0)?);

    // ── Simulation ──────────────────────────────────────────────────
    let check = sim.validate_calculation_sequence();
    if !check.is_empty() {
        println!("Sequence check: {check}");
    }
    sim.simulate(Some(600.0))?;
    if let Some(elapsed) = sim.last_simulation_time() {
        println!("Simulated 600 s in {:.3} ms", elapsed.as_secs_f64() * 1e3);
    }
    println!("Options: {:?}", sim.get_options());
    Ok(())
}

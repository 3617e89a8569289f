use dyssol::engine::{Flowsheet, ModelDescriptor, PhaseDescriptor, PortDirection};
use dyssol::{
    Dyssol, MemoryEngine, MemoryFlowsheet, MemoryMaterials, MemoryModels, MemoryUnit, Phase,
    StreamData,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let model = ModelDescriptor {
        key: "M_TANK".to_string(),
        name: "Tank".to_string(),
        author: "Demo".to_string(),
    };
    let mut plant = MemoryFlowsheet::new();
    plant.set_compounds(vec!["C_WATER".to_string(), "C_NACL".to_string()]);
    plant.set_phases(vec![
        PhaseDescriptor { state: Phase::Solid, name: "solid".to_string() },
        PhaseDescriptor { state: Phase::Liquid, name: "liquid".to_string() },
    ]);
    plant.add_unit(
        MemoryUnit::new("Tank", Some(model))
            .with_port("In", PortDirection::Input, Some("Brine"))
            .with_feed("Brine feed")
            .with_holdup("Content"),
    );
    plant.add_stream("Brine");

    let materials = MemoryMaterials::with_compounds(&[("C_WATER", "Water"), ("C_NACL", "Sodium chloride")]);
    let mut sim = Dyssol::with_engine(MemoryEngine::new(plant, materials, MemoryModels::default()));

    // ── Holdup at two time points ──────────────────────────────────
    let start = StreamData::new()
        .overall("temperature", 293.15)
        .composition("Water [liquid]", 10.0);
    let later = StreamData::new()
        .overall("temperature", 313.15)
        .composition("Water [liquid]", 8.0)
        .composition("Sodium chloride [solid]", 1.0);
    sim.set_unit_holdup("Tank", Some("Content"), &start, Some(0.0))?;
    sim.set_unit_holdup("Tank", Some("Content"), &later, Some(60.0))?;

    println!("=== Holdup 'Content' ===\n");
    println!("t = 30 s (interpolated):\n{}\n", sim.get_unit_holdup("Tank", None, 30.0)?);

    // ── All-times projection, extended to the end time ─────────────
    let mut options = sim.get_options();
    options.insert("endSimulationTime".to_string(), 120.0.into());
    sim.set_options(&options)?;
    println!("Series:\n{}\n", sim.get_unit_holdup_series("Tank", None)?);

    // ── Records feed back into writes ──────────────────────────────
    let snapshot = sim.get_unit_holdup("Tank", None, 60.0)?;
    sim.set_stream("Brine", &StreamData::from(snapshot), None)?;
    println!("Stream 'Brine' at t=0:\n{}", sim.get_stream("Brine", 0.0)?);
    Ok(())
}

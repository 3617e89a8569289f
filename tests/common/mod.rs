#![allow(dead_code)]

use dyssol::engine::{Flowsheet, GridClasses, GridDimension, ModelDescriptor, PhaseDescriptor, PortDirection};
use dyssol::parameters::{ComboParameter, DependentValues};
use dyssol::{
    DistrType, Dyssol, MemoryEngine, MemoryFlowsheet, MemoryMaterials, MemoryModels, MemoryUnit,
    ParameterValue, Phase, UnitParameter,
};

/// Five size classes.
pub const SIZE_LIMITS: [f64; 6] = [0.0, 1e-4, 2e-4, 4e-4, 8e-4, 1.6e-3];

pub fn materials() -> MemoryMaterials {
    MemoryMaterials::with_compounds(&[
        ("C_SAND", "Sand"),
        ("C_WATER", "Water"),
        ("C_AIR", "Air"),
        ("C_NACL", "Sodium chloride"),
    ])
}

pub fn granulator_model() -> ModelDescriptor {
    ModelDescriptor {
        key: "M_GRAN".to_string(),
        name: "Granulator".to_string(),
        author: "SPE TUHH".to_string(),
    }
}

pub fn granulator() -> MemoryUnit {
    let combo = |items: &[&str], selected: &str| ComboParameter::new(items, selected);
    MemoryUnit::new("Granulator", Some(granulator_model()))
        .with_parameter(UnitParameter::new(
            "Kernel",
            "",
            ParameterValue::Combo(combo(&["Constant", "Kinetic", "Brownian"], "Constant")),
        ))
        .with_parameter(UnitParameter::new("Beta0", "1/s", ParameterValue::ConstDouble(1.0)))
        .with_parameter(UnitParameter::new("Rate constant", "1/s", ParameterValue::ConstDouble(0.5)))
        .with_parameter(UnitParameter::new("Seeds", "", ParameterValue::ConstUint64(10)))
        .with_parameter(UnitParameter::new("Offset", "", ParameterValue::ConstInt64(-3)))
        .with_parameter(UnitParameter::new("Label", "", ParameterValue::String("batch".to_string())))
        .with_parameter(UnitParameter::new("Verbose", "", ParameterValue::Checkbox(false)))
        .with_parameter(UnitParameter::new("Main compound", "", ParameterValue::Compound("C_SAND".to_string())))
        .with_parameter(UnitParameter::new("Classes", "", ParameterValue::ListInt64(vec![1, 2])))
        .with_parameter(UnitParameter::new("Limits", "", ParameterValue::ListUint64(vec![5])))
        .with_parameter(UnitParameter::new("Weights", "kg", ParameterValue::ListDouble(vec![0.5, 1.5])))
        .with_parameter(UnitParameter::new(
            "Efficiency",
            "-",
            ParameterValue::TimeDependent(DependentValues::from_pairs(&[(0.0, 0.5), (60.0, 0.8)])),
        ))
        .with_parameter(UnitParameter::new(
            "Moisture curve",
            "-",
            ParameterValue::ParamDependent {
                param_name: "Weights".to_string(),
                values: DependentValues {
                    params: vec![],
                    values: vec![0.1, 0.2],
                },
            },
        ))
        .with_parameter(UnitParameter::new("Reactions", "", ParameterValue::Reaction(Vec::new())))
        .with_parameter(UnitParameter::new(
            "Solver",
            "",
            ParameterValue::Solver(combo(&["Newton", "Picard"], "Newton")),
        ))
        .with_group("Kernel", "Constant", &["Beta0"])
        .with_group("Kernel", "Kinetic", &["Rate constant"])
        .with_port("In", PortDirection::Input, Some("S_in"))
        .with_port("Out", PortDirection::Output, Some("S_out"))
        .with_feed("InletFeed")
        .with_feed("Recycle")
        .with_holdup("Holdup")
        .with_stream("Internal")
}

/// Second unit; its model is not in the registry.
pub fn splitter() -> MemoryUnit {
    let model = ModelDescriptor {
        key: "M_SPLIT".to_string(),
        name: "Splitter".to_string(),
        author: String::new(),
    };
    MemoryUnit::new("Splitter", Some(model))
        .with_port("In", PortDirection::Input, Some("S_out"))
        .with_port("Out1", PortDirection::Output, None)
}

pub fn flowsheet() -> MemoryFlowsheet {
    let mut fs = MemoryFlowsheet::new();
    fs.set_compounds(vec!["C_SAND".to_string(), "C_WATER".to_string()]);
    fs.set_phases(vec![
        PhaseDescriptor { state: Phase::Solid, name: "solid".to_string() },
        PhaseDescriptor { state: Phase::Liquid, name: "liquid".to_string() },
    ]);
    fs.set_grid(vec![GridDimension {
        kind: DistrType::Size,
        classes: GridClasses::Numeric(SIZE_LIMITS.to_vec()),
    }]);
    fs.add_unit(granulator()).add_unit(splitter());
    fs.add_stream("S_in").add_stream("S_out");
    fs
}

pub fn engine() -> MemoryEngine {
    MemoryEngine::new(
        flowsheet(),
        materials(),
        MemoryModels::with_models(vec![granulator_model()]),
    )
}

pub fn sim() -> Dyssol<MemoryEngine> {
    Dyssol::with_engine(engine())
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

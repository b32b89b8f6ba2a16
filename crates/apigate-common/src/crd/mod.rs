//! Custom Resource Definitions consumed by Gate processing

mod gate;

pub use gate::{Gate, GatePhase, GateRule, GateSpec, GateStatus, ServiceSpec};

// Adapters layer: concrete implementations for the outside world (processes, filesystem).

pub mod process;
pub mod workspace;

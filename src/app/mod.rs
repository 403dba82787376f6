// Application layer: wires the core pipeline results into the report outputs.

pub mod report;

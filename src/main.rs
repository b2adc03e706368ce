use std::process::ExitCode;

fn main() -> ExitCode {
    seismic_gate_lib::run()
}

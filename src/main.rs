use anyhow::{bail, Context, Result};
use flow_correction::{correct, CorrectionInput, CorrectionParameters};
use std::env;

const USAGE: &str = "Usage: BASE ROOM SETPOINT [DECREASE CORRECTION HYSTERESIS]";

fn parse(name: &str, arg: &str) -> Result<f64> {
    arg.parse::<f64>()
        .with_context(|| format!("{}: not a number: {}", name, arg))
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let params = match args.len() {
        3 => CorrectionParameters::default(),
        6 => CorrectionParameters::new(
            parse("decrease", &args[3])?,
            parse("correction", &args[4])?,
            parse("hysteresis", &args[5])?,
        )?,
        _ => bail!(USAGE),
    };

    let input = CorrectionInput::new(
        parse("base", &args[0])?,
        parse("room", &args[1])?,
        parse("setpoint", &args[2])?,
    );
    let result = correct(input, params)?;

    println!(
        "diff={:.2} zone={} flow={:.1}",
        result.diff, result.zone, result.flow_temperature
    );
    Ok(())
}

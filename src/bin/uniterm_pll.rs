//! Uniterm PLL calculator
//!
//! Prints iCE40 PLL divider settings for an input and output frequency, or
//! for a board and display mode.

use std::io;
use std::process::ExitCode;

use uniterm::platform::{Platform, PllParams};
use uniterm::video::Timings;
use uniterm::BuildError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut json = false;
    let mut positional = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-j" | "--json" => json = true,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            },
            _ => positional.push(arg.as_str()),
        }
    }

    let (f_in, f_out) = match resolve(&positional) {
        Ok(freqs) => freqs,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            return ExitCode::FAILURE;
        },
    };

    let params = match PllParams::solve(f_in, f_out) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    if json {
        match serde_json::to_string_pretty(&params) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing parameters: {}", e);
                return ExitCode::FAILURE;
            },
        }
    } else {
        println!("F_PLLIN:  {:10.3} MHz (given)", params.f_in / 1e6);
        println!("F_PLLOUT: {:10.3} MHz (requested)", params.req_f_out / 1e6);
        println!("F_PLLOUT: {:10.3} MHz (achieved, {:.0} ppm)", params.f_out / 1e6, params.ppm);
        println!();
        println!("FEEDBACK: {}", params.feedback_path);
        println!("F_PFD:    {:10.3} MHz", params.f_pfd / 1e6);
        println!();
        println!("DIVR: {:2}", params.divr);
        println!("DIVF: {:3}", params.divf);
        println!("DIVQ: {:1}", params.divq);
        println!();
        println!("FILTER_RANGE: {}", params.filter_range);
    }

    ExitCode::SUCCESS
}

/// Either two frequencies in MHz or a board name and a display mode
fn resolve(args: &[&str]) -> Result<(f64, f64), String> {
    match args {
        [a, b] => {
            if let (Ok(f_in), Ok(f_out)) = (a.parse::<f64>(), b.parse::<f64>()) {
                return Ok((f_in * 1e6, f_out * 1e6));
            }
            let platform: Platform = a.parse().map_err(|e: BuildError| e.to_string())?;
            let timings = Timings::profile(b).map_err(|e| e.to_string())?;
            Ok((platform.clock_hz(), timings.pclk_hz()))
        },
        _ => Err("expected two arguments".to_string()),
    }
}

fn print_help() {
    println!(
        r#"Uniterm PLL Calculator

Usage: uniterm-pll [OPTIONS] <F_IN_MHZ> <F_OUT_MHZ>
       uniterm-pll [OPTIONS] <PLATFORM> <RESOLUTION>

Options:
  -j, --json    Print the parameters as JSON
  -h, --help    Show this help message

Examples:
  uniterm-pll 12 25.175
  uniterm-pll tinyfpga 800x480"#
    );
}

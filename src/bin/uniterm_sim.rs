//! Uniterm headless simulator
//!
//! Clocks the terminal with bytes fed over its UART and prints the
//! resulting character grid, optionally dumping a frame as PPM.

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use uniterm::flash::{FlashImage, FlashLayout};
use uniterm::{Config, Snapshot, Toplevel};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut config_file: Option<PathBuf> = None;
    let mut input_file: Option<PathBuf> = None;
    let mut flash_file: Option<PathBuf> = None;
    let mut layout_file: Option<PathBuf> = None;
    let mut ppm_file: Option<PathBuf> = None;
    let mut frames = 1u64;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1).map(PathBuf::from);
        match args[i].as_str() {
            "-c" | "--config" => {
                config_file = value;
                i += 1;
            },
            "-i" | "--input" => {
                input_file = value;
                i += 1;
            },
            "-f" | "--flash" => {
                flash_file = value;
                i += 1;
            },
            "-l" | "--layout" => {
                layout_file = value;
                i += 1;
            },
            "-p" | "--ppm" => {
                ppm_file = value;
                i += 1;
            },
            "-n" | "--frames" => {
                i += 1;
                if i < args.len() {
                    frames = args[i].parse().unwrap_or(1);
                }
            },
            "-j" | "--json" => json = true,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            },
            other => {
                eprintln!("Unknown argument '{}'", other);
                print_help();
                return ExitCode::FAILURE;
            },
        }
        i += 1;
    }

    let config = match &config_file {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => Config::load_or_default(),
    };
    let params = match config.build() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        },
    };

    let layout = match &layout_file {
        Some(path) => match read_layout(path) {
            Ok(layout) => layout,
            Err(e) => {
                eprintln!("Error reading layout '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => FlashLayout::default(),
    };
    if let Err(e) = layout.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let image = match &flash_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => FlashImage::from_bytes(layout, data),
            Err(e) => {
                eprintln!("Error reading flash image '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None => FlashImage::test_pattern(layout),
    };

    let input = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            },
        },
        None if io::stdin().is_terminal() => Vec::new(),
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        },
    };

    let mut top = Toplevel::new(&params, image);
    let frame_cycles = params.timings.frame_cycles();
    top.send(&input);

    // every byte takes ten bit times; allow for arbiter waits on top
    let budget = (input.len() as u64 + 1) * u64::from(params.divisor) * 20 + 4 * frame_cycles;
    if !top.run_until_settled(budget) {
        tracing::warn!("input not fully printed after {} cycles", budget);
    }

    let mut capture = None;
    for _ in 0..frames {
        capture = Some(top.run_frame());
    }

    let stats = top.stats();
    tracing::info!(
        "{} cycles, {} frames, {} codepoints, {} fills, {} overruns",
        stats.cycles,
        stats.frames,
        stats.codepoints,
        stats.fills_started,
        stats.fill_overruns
    );

    if let (Some(path), Some(capture)) = (&ppm_file, &capture) {
        let written = File::create(path).and_then(|f| capture.write_ppm(BufWriter::new(f)));
        if let Err(e) = written {
            eprintln!("Error writing '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let snapshot = Snapshot::capture(&top);
    if json {
        match snapshot.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing snapshot: {}", e);
                return ExitCode::FAILURE;
            },
        }
    } else {
        println!("Glyph grid ({}x{}):", snapshot.cols, snapshot.rows);
        println!("Cursor: ({}, {})", snapshot.cursor.y, snapshot.cursor.x);
        println!("---");
        print!("{}", snapshot.render_hex());
        println!("---");
    }

    ExitCode::SUCCESS
}

fn read_layout(path: &Path) -> Result<FlashLayout, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_help() {
    println!(
        r#"Uniterm Simulator

Usage: uniterm-sim [OPTIONS]

Options:
  -c, --config <PATH>   Load configuration from a JSON file
  -i, --input <PATH>    Bytes to send over the UART (default: stdin)
  -f, --flash <PATH>    Raw flash image (default: synthetic test font)
  -l, --layout <PATH>   Flash layout as JSON (default: built-in layout)
  -n, --frames <N>      Frames to run after the input is printed (default: 1)
  -j, --json            Print the glyph grid snapshot as JSON
  -p, --ppm <PATH>      Write the last frame as a PPM image
  -h, --help            Show this help message

Set RUST_LOG=debug for component tracing.

Examples:
  printf 'Hello' | uniterm-sim
  uniterm-sim -i text.txt -f flash.bin -l layout.json -p frame.ppm"#
    );
}

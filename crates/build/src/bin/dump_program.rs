//! Program dumping tool
//!
//! This binary compiles a unified `.program` file and prints the generated
//! vertex and fragment stages, or the compiled IR and slot tables as JSON.

use glprog_build::{CompiledShader, GlslVersion, ProgramSource, PropertyContext, ShaderConfig, Viewport, program_file_to_source};
use serde::Serialize;
use std::{env, process};

/// JSON document written with `--json`
#[derive(Debug, Serialize)]
struct ProgramDump<'a> {
    shader: &'a CompiledShader,
    program: &'a ProgramSource,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {program} <program_file> [--config <config.yaml>] [--gles] [--json] [--verbose]");
    eprintln!("Compiles a unified shader program and prints the generated stages");
    eprintln!("  program_file: Path to the .program source");
    eprintln!("  --config:     YAML file with the target version and default properties");
    eprintln!("  --gles:       Generate GLSL ES 3.00 regardless of the config");
    eprintln!("  --json:       Print the compiled IR and slot tables as JSON");
    eprintln!("  --verbose:    Log cache and generation details");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let program_file = &args[1];
    let mut config_file = None;
    let mut gles = false;
    let mut json = false;
    let mut verbose = false;

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" => match rest.next() {
                Some(path) => config_file = Some(path.clone()),
                None => {
                    print_usage(&args[0]);
                    process::exit(1);
                }
            },
            "--gles" => gles = true,
            "--json" => json = true,
            "--verbose" => verbose = true,
            other => {
                eprintln!("Error: Unknown argument '{other}'");
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install log subscriber: {e}");
    }

    let mut config = match config_file {
        Some(path) => match ShaderConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{path}': {e}");
                process::exit(1);
            }
        },
        None => ShaderConfig::default(),
    };
    if gles {
        config.version = GlslVersion::Gles300;
    }

    // Engine properties get placeholder dimensions so every program can be generated offline
    let properties = PropertyContext::from_viewport(&Viewport {
        scene: (1920, 1080),
        container: (1920, 1080),
        content: (1920, 1080),
    });

    let (shader, program) = match program_file_to_source(program_file, &config, &properties) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error processing '{program_file}': {e}");
            process::exit(1);
        }
    };

    if json {
        let dump = ProgramDump {
            shader: &shader,
            program: &program,
        };
        match serde_json::to_string_pretty(&dump) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing program: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("// ---- vertex ----");
        println!("{}", program.vertex);
        println!("// ---- fragment ----");
        println!("{}", program.fragment);
    }
}

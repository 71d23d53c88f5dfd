// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Simple CLI for applying projections
//!
//! A command-line interface for applying JSON projection documents to JSON data.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use octofhir_projection::{Projection, ProjectionEngine, Variables};
use serde_json::Value as JsonValue;
use std::fs;
use std::io::{self, Read};
use std::process;

#[derive(Parser)]
#[command(name = "octofhir-projection")]
#[command(about = "Simple CLI for applying declarative projections to JSON data")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a projection to JSON data
    Project {
        /// JSON file containing the projection
        #[arg(short = 'P', long)]
        projection: String,
        /// JSON file containing the data (reads from stdin if not provided)
        #[arg(short, long)]
        file: Option<String>,
        /// JSON file with instance context variables
        #[arg(short, long)]
        context: Option<String>,
        /// JSON file with global context variables
        #[arg(short, long)]
        global: Option<String>,
        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
        /// Suppress informational messages
        #[arg(short, long)]
        quiet: bool,
    },
    /// Check that a projection document can be loaded
    Check {
        /// JSON file containing the projection
        #[arg(short = 'P', long)]
        projection: String,
        /// Suppress informational messages
        #[arg(short, long)]
        quiet: bool,
    },
}

#[tokio::main]
async fn main() {
    // Setup human-panic for better error messages
    human_panic::setup_panic!();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Project {
            projection,
            file,
            context,
            global,
            pretty,
            quiet,
        } => {
            let options = ProjectOptions {
                projection: &projection,
                file: file.as_deref(),
                context: context.as_deref(),
                global: global.as_deref(),
                pretty,
                quiet,
            };
            if let Err(e) = handle_project(options).await {
                eprintln!("Error: {e:#}");
                process::exit(1);
            }
        }
        Commands::Check { projection, quiet } => {
            handle_check(&projection, quiet);
        }
    }
}

struct ProjectOptions<'a> {
    projection: &'a str,
    file: Option<&'a str>,
    context: Option<&'a str>,
    global: Option<&'a str>,
    pretty: bool,
    quiet: bool,
}

async fn handle_project(options: ProjectOptions<'_>) -> Result<()> {
    let projection = load_projection(options.projection)?;

    let data = match options.file {
        Some(filename) => read_json(filename)?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Error reading from stdin")?;
            serde_json::from_str(&buffer).context("Error parsing JSON data")?
        }
    };

    let instance = options.context.map(read_json).transpose()?.map(Variables::from_json);
    let engine = match options.global {
        Some(filename) => ProjectionEngine::with_global(Variables::from_json(read_json(filename)?)),
        None => ProjectionEngine::new(),
    };

    let result = engine
        .create(projection)
        .project(data, instance)
        .await
        .context("Error applying projection")?;

    if !options.quiet {
        eprintln!("Projection: {}", options.projection);
        eprintln!("Result:");
    }

    let json = result.map(|value| value.to_json()).unwrap_or(JsonValue::Null);
    let output = if options.pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    println!("{output}");
    Ok(())
}

fn handle_check(filename: &str, quiet: bool) {
    match load_projection(filename) {
        Ok(projection) => {
            if !quiet {
                println!("✓ Projection loaded successfully");
                println!("Projection: {filename}");
                println!("Definition: {projection:?}");
            } else {
                println!("VALID");
            }
        }
        Err(e) => {
            if !quiet {
                eprintln!("✗ Invalid projection: {e:#}");
                eprintln!("Projection: {filename}");
            } else {
                eprintln!("INVALID");
            }
            process::exit(1);
        }
    }
}

fn load_projection(filename: &str) -> Result<Projection> {
    let document = read_json(filename)?;
    Projection::from_json(document).with_context(|| format!("Error loading projection '{filename}'"))
}

fn read_json(filename: &str) -> Result<JsonValue> {
    let content = fs::read_to_string(filename).with_context(|| format!("Error reading file '{filename}'"))?;
    serde_json::from_str(&content).with_context(|| format!("Error parsing JSON in '{filename}'"))
}

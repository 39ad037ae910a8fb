//! d2save-cli - Command-line interface for d2save
//!
//! A command-line tool for inspecting Diablo II: Resurrected character and
//! shared stash files.

use clap::{Parser, Subcommand};
use d2save::{decode_character, decode_stash, read_header, Character, Stash, TableSet};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File counts above this get a progress bar
const PROGRESS_THRESHOLD: usize = 3;

#[derive(Parser)]
#[command(name = "d2save-cli")]
#[command(about = "A CLI tool for reading Diablo II: Resurrected save files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header of a character file
    Info {
        /// Character file (.d2s)
        input: PathBuf,
    },

    /// Decode one or more character files
    Character {
        /// Reference tables (JSON)
        #[arg(short, long)]
        tables: PathBuf,

        /// Character files (.d2s)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the decoded records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a shared stash file
    Stash {
        /// Reference tables (JSON)
        #[arg(short, long)]
        tables: PathBuf,

        /// Shared stash file (.d2i)
        input: PathBuf,

        /// Print the decoded record as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Info { input } => show_file_info(&input, cli.verbose),
        Commands::Character {
            tables,
            files,
            json,
        } => decode_characters(&tables, &files, json, cli.quiet),
        Commands::Stash {
            tables,
            input,
            json,
        } => decode_stash_file(&tables, &input, json, cli.quiet),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    pretty_env_logger::formatted_builder()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_tables(path: &Path) -> Result<TableSet, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Tables file '{}' does not exist", path.display()).into());
    }
    Ok(TableSet::load(path)?)
}

fn read_input(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file '{}' does not exist", path.display()).into());
    }
    Ok(fs::read(path)?)
}

fn show_file_info(input: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let data = read_input(input)?;
    let header = read_header(&data).map_err(|e| format!("Not a character file: {}", e))?;

    println!("Character File Information:");
    println!("  File: {}", input.display());
    println!("  Size: {} bytes", data.len());
    println!("  Version: {:?}", header.version);
    println!("  Name: {}", header.name);
    println!("  Class: {:?}", header.class);
    println!("  Level: {}", header.level);
    println!("  Expansion: {}", header.status.expansion);
    println!("  Hardcore: {}", header.status.hardcore);
    if let Some(mercenary) = &header.mercenary {
        println!(
            "  Mercenary: type {} ({})",
            mercenary.kind,
            if mercenary.dead { "dead" } else { "alive" }
        );
    }

    if verbose {
        println!("  Recorded size: {} bytes", header.file_size);
        println!("  Checksum: {:#010x}", header.checksum);
        println!("  Map id: {:#010x}", header.map_id);
    }

    Ok(())
}

fn decode_characters(
    tables: &Path,
    files: &[PathBuf],
    json: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = load_tables(tables)?;
    let start_time = Instant::now();

    let progress = if !quiet && !json && files.len() > PROGRESS_THRESHOLD {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb.set_message("Decoding...");
        Some(pb)
    } else {
        None
    };

    let mut characters = Vec::with_capacity(files.len());
    for path in files {
        let data = read_input(path)?;
        let character = decode_character(&data, &tables)
            .map_err(|e| format!("Decoding '{}' failed: {}", path.display(), e))?;
        characters.push((path, character));
        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(ref pb) = progress {
        pb.finish_with_message("Decoding complete");
    }

    if json {
        let records: Vec<&Character> = characters.iter().map(|(_, c)| c).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if !quiet {
        for (path, character) in &characters {
            print_character(path, character);
        }
        println!("Decoded {} file(s) in {:.2?}", characters.len(), start_time.elapsed());
    }

    Ok(())
}

fn print_character(path: &Path, character: &Character) {
    let header = &character.header;
    println!("{}", path.display());
    println!("  {} - level {} {:?}", header.name, header.level, header.class);
    println!(
        "  Experience: {}  Gold: {} (+{} stashed)",
        character.attributes.experience, character.attributes.gold, character.attributes.stashed_gold
    );
    if let Some(waypoints) = &character.waypoints {
        println!(
            "  Waypoints: {} / {} / {}",
            waypoints.count(0),
            waypoints.count(1),
            waypoints.count(2)
        );
    }
    println!("  Items: {}", character.items.len());
    for item in &character.items {
        println!("    {} [{}]", item.name, item.code);
    }
    for bonus in &character.set_bonuses {
        println!(
            "  Set: {} ({} equipped, {} bonuses)",
            bonus.set_name,
            bonus.equipped,
            bonus.properties.len()
        );
    }
    if character.has_affix_overflow() {
        println!("  Note: an item uses a reserved affix id");
    }
    if !character.checksum_valid {
        println!("  Note: checksum does not match");
    }
}

fn decode_stash_file(
    tables: &Path,
    input: &Path,
    json: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = load_tables(tables)?;
    let data = read_input(input)?;
    let stash = decode_stash(&data, &tables).map_err(|e| format!("Decoding failed: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stash)?);
    } else if !quiet {
        print_stash(input, &stash);
    }

    Ok(())
}

fn print_stash(path: &Path, stash: &Stash) {
    println!("{}", path.display());
    println!("  Gold: {}", stash.total_gold());
    for (index, tab) in stash.tabs.iter().enumerate() {
        println!("  Tab {}: {} item(s), {} gold", index + 1, tab.items.len(), tab.gold);
    }
    if let Some(chronicle) = &stash.chronicle {
        println!("  Chronicle: {} record(s)", chronicle.len());
    }
}

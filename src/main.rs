use log::{debug, info};
use starsfile::battle::BattleReplay;
use starsfile::{ScanConfig, StarsFile, StarsKeystream};
use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

struct Options {
    path: String,
    show_blocks: bool,
    config_path: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        path: args[1].clone(),
        show_blocks: false,
        config_path: None,
    };
    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--blocks" => options.show_blocks = true,
            "--config" => match rest.next() {
                Some(path) => options.config_path = Some(path.clone()),
                None => return Err("--config needs a file path".to_string()),
            },
            other => return Err(format!("Unknown option: {}", other)),
        }
    }
    Ok(options)
}

fn read_file(path: &str) -> Vec<u8> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            match e.kind() {
                std::io::ErrorKind::NotFound => {
                    eprintln!("Error: File not found: {}", path)
                }
                std::io::ErrorKind::PermissionDenied => {
                    eprintln!("Error: Permission denied reading: {}", path)
                }
                _ => eprintln!("Error: Cannot open '{}': {}", path, e),
            }
            std::process::exit(1);
        }
    };
    let mut bytes = Vec::new();
    if let Err(e) = file.read_to_end(&mut bytes) {
        eprintln!("Error: Cannot read '{}': {}", path, e);
        std::process::exit(1);
    }
    bytes
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("starsdump - decode and verify Stars! game files");
        println!();
        println!("Usage: {} <file> [--blocks] [--config scan.toml]", args[0]);
        println!("Examples:");
        println!("  {} game.m1", args[0]);
        println!("  {} game.x2 --blocks", args[0]);
        println!();
        println!("--blocks lists every block with a one-line summary.");
        println!("--config reads battle scan limits from a TOML file.");
        return Ok(());
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(2);
        }
    };

    let config = match &options.config_path {
        Some(path) => ScanConfig::load(Path::new(path))?,
        None => ScanConfig::default(),
    };

    debug!("Reading {}", options.path);
    let bytes = read_file(&options.path);

    let file = match StarsFile::parse(&bytes, &mut StarsKeystream::new()) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {}: {}", options.path, e);
            std::process::exit(1);
        }
    };

    if let Some(header) = file.header() {
        print!("{}", header);
    }

    println!();
    println!("Blocks ({} total, {} opaque):", file.blocks.len(), file.opaque_count());
    for (kind, count) in file.block_counts() {
        println!("  {:>3} {:<28} {}", kind.id(), format!("{:?}", kind), count);
    }

    if options.show_blocks {
        println!();
        for block in &file.blocks {
            let truncated = match block.truncated_len {
                Some(len) => format!(" (truncated, {} bytes)", len),
                None => String::new(),
            };
            println!(
                "{:#07x} {:<24} {}{}",
                block.raw.offset,
                format!("{:?}", block.kind()),
                block.record.summary(),
                truncated
            );
        }
    }

    let battles = file.battles();
    if !battles.is_empty() {
        println!();
        println!("Battles (phase counts are approximate):");
        for recording in &battles {
            let summary = BattleReplay::decode(recording, &config).summary();
            println!(
                "  battle {}: {} stacks, {} action bytes, {} phases",
                recording.battle.battle_id,
                recording.battle.stacks.len(),
                recording.actions.len(),
                summary.phases
            );
        }
    }

    println!();
    let encoded = file.to_bytes(&mut StarsKeystream::new())?;
    if encoded == bytes {
        info!("Re-encoded {} bytes identically", encoded.len());
        println!("Re-encode check: identical ({} bytes)", encoded.len());
        Ok(())
    } else {
        let first_diff = encoded
            .iter()
            .zip(bytes.iter())
            .position(|(a, b)| a != b)
            .unwrap_or_else(|| encoded.len().min(bytes.len()));
        eprintln!(
            "Re-encode check: FAILED, first difference at {:#06x} ({} vs {} bytes)",
            first_diff,
            encoded.len(),
            bytes.len()
        );
        std::process::exit(1);
    }
}

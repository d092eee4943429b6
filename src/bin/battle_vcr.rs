use log::debug;
use starsfile::battle::{BattleEvent, BattleReplay, EventKind, GridPos, Phase, PositionSource};
use starsfile::records::BattleRecording;
use starsfile::{ScanConfig, StarsFile, StarsKeystream};
use std::env;
use std::fs;
use std::path::Path;

fn show_pos(pos: Option<GridPos>) -> String {
    match pos {
        Some(p) => p.to_string(),
        None => "off board".to_string(),
    }
}

fn print_stacks(recording: &BattleRecording) {
    let battle = &recording.battle;
    println!(
        "Battle {} at ({}, {}), {} rounds, {} v {} stacks",
        battle.battle_id,
        battle.x,
        battle.y,
        battle.rounds,
        battle.side1_stacks,
        battle.side2_stacks
    );
    println!("  stack owner design fleet ships armor shields start");
    for (i, s) in battle.stacks.iter().enumerate() {
        println!(
            "  {:>5} {:>5} {:>6} {:>5} {:>5} {:>5} {:>7} {}",
            i,
            s.owner + 1,
            s.design,
            s.fleet + 1,
            s.ship_count,
            s.armor,
            s.shields,
            show_pos(starsfile::battle::pos_to_grid(s.initial_position))
        );
    }
}

fn print_phase(phase: &Phase) {
    let source = match phase.position_source {
        PositionSource::Observed => "",
        PositionSource::LastKnown => " (last known)",
        PositionSource::Unknown => "",
    };
    println!(
        "  {:>4} r{:<2} stack {} {:?} -> {} at {}{}{}",
        phase.number,
        phase.round,
        phase.actor,
        phase.action,
        phase.target,
        show_pos(phase.position),
        source,
        if phase.damage > 0 {
            format!(", {} damage", phase.damage)
        } else {
            String::new()
        }
    );
}

fn print_event(event: &BattleEvent) {
    let text = match event.kind {
        EventKind::Action {
            action,
            actor,
            target,
        } => format!("stack {} {:?} -> {}", actor, action, target),
        EventKind::Damage {
            damage,
            target,
            position,
            ..
        } => format!("{} damage to stack {} at {}", damage, target, show_pos(position)),
        EventKind::Position { stack, position } => {
            format!("stack {} at {}", stack, show_pos(position))
        }
    };
    println!("  {:#06x} r{:<2} {}", event.offset, event.round, text);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("battle-vcr - replay battles recorded in a Stars! turn file");
        println!();
        println!("Usage: {} <file> [--events] [--config scan.toml]", args[0]);
        println!();
        println!("Phases are reconstructed heuristically and are approximate.");
        println!("--events also prints the raw event scan.");
        return Ok(());
    }

    let path = &args[1];
    let mut show_events = false;
    let mut config = ScanConfig::default();
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--events" => show_events = true,
            "--config" if i + 1 < args.len() => {
                config = ScanConfig::load(Path::new(&args[i + 1]))?;
                i += 1;
            }
            other => {
                eprintln!("Error: Unknown or incomplete option: {}", other);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    debug!("Reading {}", path);
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot read '{}': {}", path, e);
            std::process::exit(1);
        }
    };
    let file = match StarsFile::parse(&bytes, &mut StarsKeystream::new()) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let battles = file.battles();
    if battles.is_empty() {
        println!("No battles recorded in {}", path);
        return Ok(());
    }

    for recording in &battles {
        print_stacks(recording);
        let replay = BattleReplay::decode(recording, &config);
        println!();
        println!("Phases (approximate):");
        for phase in &replay.phases {
            print_phase(phase);
        }
        if show_events {
            println!();
            println!("Events:");
            for event in &replay.events {
                print_event(event);
            }
        }
        println!();
        print!("{}", replay.summary());
        println!();
    }
    Ok(())
}

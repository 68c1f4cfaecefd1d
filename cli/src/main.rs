use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use kujibiki_core::{
    groups_csv, parse_names_text, partition_roster, DrawError, DrawMode, Participant,
    RaffleEngine, Roster, SplitMix64,
};
use rand::Rng;

#[derive(Parser)]
#[command(name = "kujibiki-cli", version, about = "Raffle and grouping tools for participant rosters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Draw {
        #[arg(long)]
        roster: PathBuf,
        #[arg(long, default_value_t = 1)]
        count: usize,
        #[arg(long)]
        allow_repeats: bool,
        #[arg(long)]
        seed: Option<String>,
    },
    Groups {
        #[arg(long)]
        roster: PathBuf,
        #[arg(long)]
        size: usize,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Draw {
            roster,
            count,
            allow_repeats,
            seed,
        } => {
            let roster = load_roster(&roster)?;
            if roster.is_empty() {
                eprintln!("roster is empty, nothing to draw");
                return Ok(());
            }
            let mut rng = SplitMix64::new(resolve_seed(seed.as_deref())?);
            let mut engine = RaffleEngine::new(roster.entries());
            if allow_repeats {
                engine.set_mode(DrawMode::WithReplacement, roster.entries());
            }
            for index in 1..=count {
                match run_draw(&mut engine, roster.entries(), &mut rng) {
                    Ok(winner) => println!("{index}. {}", winner.name),
                    Err(DrawError::EmptyPool) => {
                        eprintln!("pool ran dry after {} draws", index - 1);
                        break;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            if !allow_repeats {
                println!("remaining pool: {}", engine.pool_len());
            }
        }
        Commands::Groups {
            roster,
            size,
            seed,
            csv,
        } => {
            let roster = load_roster(&roster)?;
            let mut rng = SplitMix64::new(resolve_seed(seed.as_deref())?);
            let groups = partition_roster(roster.entries(), size, &mut rng)?;
            for group in &groups {
                println!("{} ({} 人)", group.name, group.members.len());
                for member in &group.members {
                    println!("  {}", member.name);
                }
            }
            if let Some(path) = csv {
                fs::write(&path, groups_csv(&groups))?;
                println!("csv written to {}", path.display());
            }
        }
    }

    Ok(())
}

fn load_roster(path: &Path) -> Result<Roster, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let names = parse_names_text(&text);
    let mut roster = Roster::new(rand::rng().random());
    roster.append_names(&names);
    Ok(roster)
}

// Ticks the engine through a full spin cycle without sleeping; the final
// tick settles the winner.
fn run_draw(
    engine: &mut RaffleEngine,
    roster: &[Participant],
    rng: &mut SplitMix64,
) -> Result<Participant, DrawError> {
    engine.begin_spin(roster)?;
    loop {
        if let Some(winner) = engine.spin_tick(roster, rng) {
            return Ok(winner);
        }
        if !engine.is_spinning() {
            return Err(DrawError::EmptyPool);
        }
    }
}

fn resolve_seed(raw: Option<&str>) -> Result<u64, Box<dyn std::error::Error>> {
    match raw {
        Some(raw) => parse_seed_arg(raw),
        None => Ok(rand::rng().random()),
    }
}

fn parse_seed_arg(raw: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u64>()?
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn seed_arg_accepts_decimal_and_hex() {
        assert_eq!(parse_seed_arg("42").unwrap(), 42);
        assert_eq!(parse_seed_arg(" 0xFF ").unwrap(), 255);
        assert_eq!(parse_seed_arg("0X10").unwrap(), 16);
        assert!(parse_seed_arg("banana").is_err());
        assert!(parse_seed_arg("0xZZ").is_err());
    }

    #[test]
    fn roster_file_loads_with_import_rules() {
        let path =
            std::env::temp_dir().join(format!("kujibiki-roster-test-{}", std::process::id()));
        let mut file = fs::File::create(&path).expect("create temp roster");
        writeln!(file, "  王小明  ").expect("write line");
        writeln!(file).expect("write line");
        writeln!(file, "\"李大華\"").expect("write line");
        drop(file);

        let roster = load_roster(&path).expect("load roster");
        let names: Vec<&str> = roster.entries().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["王小明", "李大華"]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut roster = Roster::new(1);
        roster.append_names(["A", "B", "C", "D"]);

        let run = |seed: u64| {
            let mut rng = SplitMix64::new(seed);
            let mut engine = RaffleEngine::new(roster.entries());
            let mut names = Vec::new();
            while let Ok(winner) = run_draw(&mut engine, roster.entries(), &mut rng) {
                names.push(winner.name);
            }
            names
        };

        assert_eq!(run(7), run(7));
        assert_eq!(run(7).len(), 4);
    }
}

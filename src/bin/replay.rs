// Re-runs the decision engine over a JSONL debug log
//
//   replay <log_file> [--turns 5,10 | --validate 5:up,10:left|right] [--verbose] [--config Snake.toml]
//
// With neither --turns nor --validate every logged turn is replayed and the
// report compares replayed moves and strategies with the logged ones.

use std::env;
use std::process;
use std::time::Instant;

use tournament_snake::config::Config;
use tournament_snake::replay::ReplayEngine;
use tournament_snake::simple_profiler;
use tournament_snake::types::Direction;

const USAGE: &str = "usage: replay <log_file> [--turns T1,T2 | --validate T:MOVE[|MOVE],...] [--verbose] [--config PATH]";

#[derive(Debug, PartialEq)]
enum Mode {
    All,
    Turns(Vec<i32>),
    /// Turn paired with every move that counts as correct
    Validate(Vec<(i32, Vec<Direction>)>),
}

#[derive(Debug)]
struct Args {
    log_file: String,
    config_path: String,
    verbose: bool,
    mode: Mode,
}

fn parse_turn(s: &str) -> Result<i32, String> {
    s.trim()
        .parse()
        .map_err(|e| format!("bad turn '{}': {}", s.trim(), e))
}

fn parse_expectation(pair: &str) -> Result<(i32, Vec<Direction>), String> {
    let (turn, moves) = pair
        .split_once(':')
        .ok_or_else(|| format!("expected turn:move, got '{}'", pair.trim()))?;
    let moves = moves
        .split('|')
        .map(|m| Direction::parse(m.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((parse_turn(turn)?, moves))
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut rest = args.iter();
    let log_file = rest.next().ok_or("missing log file")?.clone();
    let mut parsed = Args {
        log_file,
        config_path: "Snake.toml".to_string(),
        verbose: false,
        mode: Mode::All,
    };

    while let Some(flag) = rest.next() {
        let mut value = || rest.next().ok_or(format!("{} needs a value", flag));
        match flag.as_str() {
            "--verbose" => parsed.verbose = true,
            "--config" => parsed.config_path = value()?.clone(),
            "--turns" => {
                let turns = value()?.split(',').map(parse_turn).collect::<Result<_, _>>()?;
                parsed.mode = Mode::Turns(turns);
            }
            "--validate" => {
                let expected = value()?
                    .split(',')
                    .map(parse_expectation)
                    .collect::<Result<_, _>>()?;
                parsed.mode = Mode::Validate(expected);
            }
            other => return Err(format!("unknown option '{}'", other)),
        }
    }

    Ok(parsed)
}

fn run(args: Args) -> Result<(), String> {
    let config = Config::from_file(&args.config_path).unwrap_or_else(|e| {
        log::warn!("Config {} unusable ({}), using defaults", args.config_path, e);
        Config::default_hardcoded()
    });

    let engine = ReplayEngine::new(config, args.verbose);
    let entries = engine.load_log_file(&args.log_file)?;
    if entries.is_empty() {
        return Err(format!("{} has no entries", args.log_file));
    }
    println!("{}: {} entries", args.log_file, entries.len());

    match args.mode {
        Mode::All => engine.print_report(&engine.replay_all(&entries)),
        Mode::Turns(turns) => engine.print_report(&engine.replay_turns(&entries, &turns)?),
        Mode::Validate(expected) => {
            engine.validate_expected_moves(&entries, &expected)?;
            println!("{} expected move(s) matched", expected.len());
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help") {
        println!("{}", USAGE);
        return;
    }

    let args = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("error: {}\n{}", e, USAGE);
        process::exit(2);
    });

    let started = Instant::now();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    // BATTLESNAKE_PROFILE=1 adds a per-stage timing breakdown
    if simple_profiler::is_profiling_enabled() {
        simple_profiler::merge_thread_local();
        simple_profiler::print_report(started.elapsed().as_millis() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults_to_replaying_everything() {
        let parsed = parse_args(&args(&["game.jsonl"])).unwrap();
        assert_eq!(parsed.mode, Mode::All);
        assert_eq!(parsed.config_path, "Snake.toml");
        assert!(!parsed.verbose);
    }

    #[test]
    fn test_validate_accepts_alternatives() {
        let parsed = parse_args(&args(&["game.jsonl", "--validate", "5:up,10:Left|right", "--verbose"])).unwrap();
        assert_eq!(
            parsed.mode,
            Mode::Validate(vec![
                (5, vec![Direction::Up]),
                (10, vec![Direction::Left, Direction::Right]),
            ])
        );
        assert!(parsed.verbose);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["game.jsonl", "--turns"])).is_err());
        assert!(parse_args(&args(&["game.jsonl", "--turns", "3,x"])).is_err());
        assert!(parse_args(&args(&["game.jsonl", "--validate", "3-up"])).is_err());
        assert!(parse_args(&args(&["game.jsonl", "--fast"])).is_err());
    }
}

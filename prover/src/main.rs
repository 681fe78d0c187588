//! Rollup transition validator CLI
//!
//! Checks a transfer witness file, or builds and checks a sample transfer.

use anyhow::{Context, Result, bail};
use ark_std::rand::{SeedableRng, rngs::StdRng};
use log::{error, info};
use std::{env, fs, process};

use rollup_config::ValidatorConfig;
use rollup_prover::{
    AccountTree, DefaultValidator, PublicInputs, SigningKey, TransitionWitness, ValidationResult,
    hasher_for,
};

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = match ValidatorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            process::exit(2);
        }
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let Some(cmd) = args.get(1) else {
        print_usage();
        return;
    };

    let outcome = match cmd.as_str() {
        "check" => match args.get(2) {
            Some(path) => check(&config, path),
            None => {
                println!("Usage: prover check <witness.json>");
                return;
            }
        },
        "demo" => demo(&config, args.get(2).map(String::as_str)),
        "config" => {
            print!("{}", ValidatorConfig::generate_sample());
            Ok(true)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(true)
        }
        _ => {
            println!("Unknown command: {}", cmd);
            println!();
            print_usage();
            process::exit(2);
        }
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            process::exit(2);
        }
    }
}

fn print_usage() {
    println!("Rollup transition validator");
    println!();
    println!("USAGE:");
    println!("  prover <command> [args]");
    println!();
    println!("COMMANDS:");
    println!("  check <witness.json>   Validate a transfer witness");
    println!("  demo [out.json]        Build, validate and optionally save a sample transfer");
    println!("  config                 Print a sample config.toml");
    println!("  help                   Show this message");
    println!();
    println!("ENVIRONMENT:");
    println!("  ROLLUP_CONFIG          Path to config.toml");
    println!("  ROLLUP_TREE_DEPTH      Account tree depth (default 5)");
    println!("  ROLLUP_HASH            mimc | poseidon");
    println!("  ROLLUP_LOG / RUST_LOG  Log level");
}

/// Validate a witness file; `Ok(false)` when the witness is rejected
fn check(config: &ValidatorConfig, path: &str) -> Result<bool> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let witness = TransitionWitness::from_json(&json)
        .with_context(|| format!("Failed to parse witness {}", path))?;

    Ok(report(config, &witness))
}

/// Sender {nonce 3, balance 100, index 2} pays 40 to receiver
/// {nonce 7, balance 10, index 5}
fn demo(config: &ValidatorConfig, out: Option<&str>) -> Result<bool> {
    let mut rng = StdRng::seed_from_u64(0);
    let sender = SigningKey::random(&mut rng);
    let receiver = SigningKey::random(&mut rng);

    let mut tree = AccountTree::new(hasher_for(config.hash.kind), config.tree.depth);
    tree.insert_at(2, 3, 100, sender.public_key())?;
    tree.insert_at(5, 7, 10, receiver.public_key())?;

    let witness = tree.transfer(2, 5, 40, &sender)?;
    info!(
        "sender {} -> {}, receiver {} -> {}",
        witness.sender_before.balance,
        witness.sender_after.balance,
        witness.receiver_before.balance,
        witness.receiver_after.balance
    );

    if let Some(path) = out {
        fs::write(path, witness.to_json()?).with_context(|| format!("Failed to write {}", path))?;
        info!("Witness written to {}", path);
    }

    let valid = report(config, &witness);
    if !valid {
        bail!("freshly built witness was rejected");
    }
    Ok(valid)
}

fn print_public_inputs(inputs: &PublicInputs) {
    println!("  root_before: {}", inputs.root_before);
    println!("  root_after:  {}", inputs.root_after);
}

fn report(config: &ValidatorConfig, witness: &TransitionWitness) -> bool {
    let validator = DefaultValidator::from_config(config);
    let inputs = witness.public_inputs();

    match validator.check(witness) {
        ValidationResult::Valid => {
            info!(
                "Transfer of {} accepted (depth {}, {:?})",
                witness.transfer.amount,
                validator.depth(),
                config.hash.kind
            );
            println!("VALID");
            print_public_inputs(&inputs);
            true
        }
        ValidationResult::Invalid(violations) => {
            println!("INVALID");
            print_public_inputs(&inputs);
            for v in &violations {
                println!("  - {}", v);
            }
            false
        }
    }
}

//! CLI command implementations.
//!
//! Each invocation loads the state file and runs one engine operation.
//! Mutating commands go through `StateFile::update`, which holds the file
//! lock from load to save.

use anyhow::Context;
use clap::{Parser, Subcommand};
use quadra_types::{Address, Timestamp};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::QuadraConfig;
use crate::output::*;
use crate::store::StateFile;

/// Main CLI.
#[derive(Parser, Debug)]
#[command(name = "quadra")]
#[command(about = "Quadratic voting: spend credits, get floor(sqrt(credits)) votes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Config file path (defaults to ./quadra.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// State file path (overrides storage.state_file)
    #[arg(long, global = true, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Current time in Unix seconds (defaults to the system clock)
    #[arg(long, global = true, value_name = "SECS")]
    pub now: Option<Timestamp>,

    /// Log filter (overrides logging.level)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty state file
    Init {
        /// Admin identity (overrides engine.admin)
        #[arg(long)]
        admin: Option<Address>,
        /// Credits per voter (overrides engine.initial_credits)
        #[arg(long)]
        credits: Option<u64>,
        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// Register a voter (admin only)
    Register {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        voter: Address,
    },

    /// Create a proposal (admin only)
    Propose {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Voting duration in seconds
        #[arg(long)]
        duration: u64,
    },

    /// Spend credits on a proposal
    Vote {
        #[arg(long)]
        voter: Address,
        #[arg(long)]
        proposal: u64,
        #[arg(long)]
        credits: u64,
    },

    /// Execute a closed proposal (admin only)
    Execute {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        proposal: u64,
    },

    /// Show one proposal
    Proposal {
        id: u64,
    },

    /// List all proposals
    Proposals,

    /// Show a voter's credits
    Voter {
        address: Address,
        /// Also show the credits spent on this proposal
        #[arg(long)]
        proposal: Option<u64>,
    },

    /// Print the effective configuration
    Config,
}

/// Current time: the `--now` override or the system clock.
pub fn current_time(now: Option<Timestamp>) -> anyhow::Result<Timestamp> {
    match now {
        Some(now) => Ok(now),
        None => {
            let secs = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .context("System clock is before the Unix epoch")?
                .as_secs();
            Ok(Timestamp::new(secs))
        }
    }
}

/// Execute a parsed command against the configured state file.
pub fn execute(cli: Cli, config: &QuadraConfig) -> anyhow::Result<()> {
    let state = StateFile::new(
        cli.state
            .clone()
            .unwrap_or_else(|| config.storage.state_file.clone()),
    );
    let now = current_time(cli.now)?;
    let json = cli.json;

    match cli.command {
        Commands::Init { admin, credits, force } => {
            let mut engine_config = config.engine_config(admin)?;
            if let Some(credits) = credits {
                engine_config.initial_credits = credits;
            }
            let engine = state.init(engine_config, force)?;
            if json {
                print_json(engine.config())?;
            } else {
                print_success(&format!("Initialized state at '{}'", state.path().display()));
                println!("Admin:           {}", engine.admin());
                println!("Initial credits: {}", engine.config().initial_credits);
            }
        }

        Commands::Register { caller, voter } => {
            let (engine, ()) = state.update(|engine| Ok(engine.register_voter(&caller, voter)?))?;
            match engine.get_voter_info(&voter) {
                Some(info) if json => print_json(&info)?,
                Some(info) => {
                    print_success(&format!("Registered voter {}", voter));
                    print_voter(&info);
                }
                None => anyhow::bail!("Voter {} missing after registration", voter),
            }
        }

        Commands::Propose { caller, title, description, duration } => {
            let (engine, id) = state.update(|engine| {
                Ok(engine.create_proposal(&caller, &title, &description, duration, now)?)
            })?;
            let view = engine
                .get_proposal(id)
                .with_context(|| format!("Proposal {} missing after creation", id))?;
            if json {
                print_json(&view)?;
            } else {
                print_success(&format!("Created proposal #{}", id));
                print_proposal(&view, quadra_voting::ProposalStatus::Open, now);
            }
        }

        Commands::Vote { voter, proposal, credits } => {
            let (_, receipt) =
                state.update(|engine| Ok(engine.cast_vote(voter, proposal, credits, now)?))?;
            if json {
                print_json(&receipt)?;
            } else {
                print_success("Vote cast");
                print_receipt(&receipt);
            }
        }

        Commands::Execute { caller, proposal } => {
            let (engine, ()) =
                state.update(|engine| Ok(engine.execute_proposal(&caller, proposal, now)?))?;
            let view = engine
                .get_proposal(proposal)
                .with_context(|| format!("Proposal {} missing after execution", proposal))?;
            if json {
                print_json(&view)?;
            } else {
                print_success(&format!(
                    "Executed proposal #{} with {} votes",
                    proposal, view.total_votes
                ));
            }
        }

        Commands::Proposal { id } => {
            let engine = state.load()?;
            let view = engine
                .get_proposal(id)
                .with_context(|| format!("Proposal {} not found", id))?;
            let status = engine
                .proposal_status(id, now)
                .with_context(|| format!("Proposal {} not found", id))?;
            if json {
                print_json(&serde_json::json!({ "proposal": view, "status": status }))?;
            } else {
                print_proposal(&view, status, now);
            }
        }

        Commands::Proposals => {
            let engine = state.load()?;
            let rows: Vec<_> = engine
                .proposals()
                .into_iter()
                .filter_map(|view| engine.proposal_status(view.id, now).map(|s| (view, s)))
                .collect();
            if json {
                let views: Vec<_> = rows.iter().map(|(view, _)| view).collect();
                print_json(&views)?;
            } else if rows.is_empty() {
                print_info("No proposals yet");
            } else {
                print_proposal_table(&rows, now);
            }
        }

        Commands::Voter { address, proposal } => {
            let engine = state.load()?;
            let info = engine
                .get_voter_info(&address)
                .with_context(|| format!("Voter {} is not registered", address))?;
            let spent = proposal.map(|id| (id, engine.voter_credits_on(id, &address)));
            if json {
                print_json(&serde_json::json!({
                    "voter": info,
                    "proposal_credits": spent.and_then(|(_, credits)| credits),
                }))?;
            } else {
                print_voter(&info);
                match spent {
                    Some((id, Some(credits))) => println!("Spent on #{}: {}", id, credits),
                    Some((id, None)) => println!("Spent on #{}: not voted", id),
                    None => {}
                }
            }
        }

        Commands::Config => {
            let mut effective = config.clone();
            effective.storage.state_file = state.path().to_path_buf();
            if json {
                print_json(&effective)?;
            } else {
                print!("{}", toml::to_string_pretty(&effective)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quadra_voting::VotingError;
    use tempfile::TempDir;

    const ADMIN: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const ALICE: &str = "0x0101010101010101010101010101010101010101";

    fn run(state: &std::path::Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["quadra", "--state", state.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        execute(cli, &QuadraConfig::default())
    }

    #[test]
    fn test_cli_parses_addresses_and_time() {
        let cli = Cli::try_parse_from([
            "quadra", "--now", "1700000000", "vote", "--voter", ALICE, "--proposal", "1",
            "--credits", "36",
        ])
        .unwrap();
        assert_eq!(cli.now, Some(Timestamp::new(1_700_000_000)));
        match cli.command {
            Commands::Vote { voter, proposal, credits } => {
                assert_eq!(voter, ALICE.parse::<Address>().unwrap());
                assert_eq!((proposal, credits), (1, 36));
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["quadra", "voter", "not-an-address"]).is_err());
    }

    #[test]
    fn test_current_time_override() {
        assert_eq!(current_time(Some(Timestamp::new(5))).unwrap(), Timestamp::new(5));
        assert!(current_time(None).unwrap() > Timestamp::new(1_600_000_000));
    }

    #[test]
    fn test_full_session_through_state_file() {
        let temp_dir = TempDir::new().unwrap();
        let state = temp_dir.path().join("state.json");

        run(&state, &["init", "--admin", ADMIN]).unwrap();
        run(&state, &["register", "--caller", ADMIN, "--voter", ALICE]).unwrap();
        run(&state, &["--now", "1000", "propose", "--caller", ADMIN, "--title", "Park", "--duration", "3600"]).unwrap();
        run(&state, &["--now", "1001", "vote", "--voter", ALICE, "--proposal", "1", "--credits", "36"]).unwrap();

        let err = run(&state, &["--now", "1002", "vote", "--voter", ALICE, "--proposal", "1", "--credits", "4"])
            .unwrap_err();
        assert_eq!(err.downcast_ref::<VotingError>(), Some(&VotingError::AlreadyVoted));

        let err = run(&state, &["--now", "1002", "execute", "--caller", ADMIN, "--proposal", "1"]).unwrap_err();
        assert_eq!(err.downcast_ref::<VotingError>(), Some(&VotingError::VotingStillOpen));
        run(&state, &["--now", "4601", "execute", "--caller", ADMIN, "--proposal", "1"]).unwrap();

        run(&state, &["--now", "4601", "proposals"]).unwrap();
        run(&state, &["--json", "voter", ALICE, "--proposal", "1"]).unwrap();

        let engine = StateFile::new(&state).load().unwrap();
        let view = engine.get_proposal(1).unwrap();
        assert!(view.executed);
        assert_eq!(view.total_votes, 6);
        assert_eq!(engine.get_voter_info(&ALICE.parse().unwrap()).unwrap().used_credits, 36);
    }

    #[test]
    fn test_commands_require_init() {
        let temp_dir = TempDir::new().unwrap();
        let state = temp_dir.path().join("state.json");
        assert!(run(&state, &["proposals"]).is_err());
        assert!(run(&state, &["init"]).is_err(), "init without an admin must fail");
    }

    #[test]
    fn test_init_credits_override() {
        let temp_dir = TempDir::new().unwrap();
        let state = temp_dir.path().join("state.json");
        run(&state, &["init", "--admin", ADMIN, "--credits", "400"]).unwrap();
        let engine = StateFile::new(&state).load().unwrap();
        assert_eq!(engine.config().initial_credits, 400);
    }
}

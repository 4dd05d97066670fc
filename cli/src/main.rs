mod error;
mod inputs;
mod keys;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use got_deploy::{deploy, ChainSnapshot, DeployConfig};
use got_distributor::{BlockClock, ClaimStatus, Distributor};
use got_merkle::{format_hash, hash_leaf, parse_hash, MerkleTree};
use got_storage::StateStore;
use got_token::{format_units, parse_units, Address, Amount, TokenHost, TokenRegistry};

use crate::error::CliError;

/// GOT reward distributor CLI
#[derive(Parser)]
#[command(name = "gotd", version, about = "GOT reward distributor command-line interface")]
struct Cli {
    /// Directory holding the chain snapshot
    #[arg(long, global = true, default_value = "gotd-data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new Ed25519 keypair
    Keygen {
        /// Output file for the key
        #[arg(short, long, default_value = "gotd.key")]
        output: PathBuf,
    },

    /// Deploy the reward token and a funded distributor from a config file
    Deploy {
        /// Deploy config (.toml or .json)
        #[arg(long)]
        config: PathBuf,

        /// Replace an existing deployment in the data dir
        #[arg(long)]
        force: bool,
    },

    /// Merkle allowlist tooling
    Merkle {
        #[command(subcommand)]
        command: MerkleCommands,
    },

    /// Claim the reward owed to the key's address
    Claim {
        /// Key file of the claimant
        #[arg(long)]
        key: PathBuf,

        #[command(flatten)]
        proof: ProofArgs,
    },

    /// Owner-only administration
    Admin {
        /// Key file of the owner
        #[arg(long)]
        key: PathBuf,

        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Read distributor state
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },

    /// Simulated chain controls
    Chain {
        #[command(subcommand)]
        command: ChainCommands,
    },
}

#[derive(clap::Args)]
struct ProofArgs {
    /// Proof sibling hashes (hex), comma separated
    #[arg(long, value_delimiter = ',')]
    proof: Vec<String>,

    /// Proof bundle produced by `merkle proof`
    #[arg(long, conflicts_with = "proof")]
    proof_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum MerkleCommands {
    /// Compute the root of an allowlist (one address per line)
    Root {
        #[arg(long)]
        members: PathBuf,
    },

    /// Produce the proof bundle for one member
    Proof {
        #[arg(long)]
        members: PathBuf,

        #[arg(long)]
        account: Address,

        /// Write the bundle here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a proof against a root
    Verify {
        #[arg(long)]
        root: String,

        #[arg(long)]
        account: Address,

        #[command(flatten)]
        proof: ProofArgs,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Hand ownership to another address
    TransferOwnership {
        #[arg(long)]
        new_owner: Address,
    },

    /// Switch the reward token
    SetToken {
        #[arg(long)]
        token: Address,
    },

    /// Set the per-period rate (decimal token amount)
    SetRate {
        #[arg(long)]
        rate: String,
    },

    /// Set the claim cooldown in blocks
    SetCooldown {
        #[arg(long)]
        blocks: u64,
    },

    /// Upsert stake entries from a file of `address,amount` lines
    SetStakes {
        #[arg(long)]
        file: PathBuf,
    },

    /// Replace the Merkle root
    RotateRoot {
        #[arg(long)]
        root: String,
    },

    /// Withdraw reward tokens to the owner (decimal token amount)
    Withdraw {
        #[arg(long)]
        amount: String,
    },
}

#[derive(Subcommand)]
enum QueryCommands {
    /// Distributor configuration and balance
    Info,

    /// Reward-token balance of an address
    Balance {
        #[arg(long)]
        address: Address,
    },

    /// Cooldown status of an address
    Status {
        #[arg(long)]
        address: Address,
    },

    /// Staked amount of an address
    Stake {
        #[arg(long)]
        address: Address,
    },

    /// Amount a claim would pay right now
    Pending {
        #[arg(long)]
        address: Address,

        #[command(flatten)]
        proof: ProofArgs,
    },

    /// Every address in the stake registry
    Stakers,

    /// Last claim height of every address that has claimed
    Claims,
}

#[derive(Subcommand)]
enum ChainCommands {
    /// Advance the simulated chain
    Advance {
        #[arg(long)]
        blocks: u64,
    },

    /// Print the current block height
    Height,

    /// Delete the stored deployment
    Reset,
}

type LiveDistributor = Distributor<TokenRegistry, Box<dyn BlockClock>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    let result = match cli.command {
        Commands::Keygen { output } => cmd_keygen(&output),
        Commands::Deploy { config, force } => cmd_deploy(&data_dir, &config, force),
        Commands::Merkle { command } => match command {
            MerkleCommands::Root { members } => cmd_merkle_root(&members),
            MerkleCommands::Proof {
                members,
                account,
                output,
            } => cmd_merkle_proof(&members, &account, output.as_deref()),
            MerkleCommands::Verify {
                root,
                account,
                proof,
            } => cmd_merkle_verify(&root, &account, &proof),
        },
        Commands::Claim { key, proof } => cmd_claim(&data_dir, &key, &proof),
        Commands::Admin { key, command } => cmd_admin(&data_dir, &key, command),
        Commands::Query { command } => cmd_query(&data_dir, command),
        Commands::Chain { command } => match command {
            ChainCommands::Advance { blocks } => cmd_chain_advance(&data_dir, blocks),
            ChainCommands::Height => cmd_chain_height(&data_dir),
            ChainCommands::Reset => cmd_chain_reset(&data_dir),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_keygen(output: &Path) -> Result<(), CliError> {
    let key = keys::generate();
    keys::write(output, &key)?;

    println!("Generated new Ed25519 keypair");
    println!("  Address: {}", key.address);
    println!("  Key saved to: {}", output.display());
    Ok(())
}

fn cmd_deploy(data_dir: &Path, config_path: &Path, force: bool) -> Result<(), CliError> {
    let config = DeployConfig::from_file(config_path)?;
    let store = StateStore::open(data_dir)?;
    if ChainSnapshot::exists(&store) && !force {
        return Err(CliError::InvalidInput(format!(
            "{} already holds a deployment; pass --force to replace it",
            data_dir.display()
        )));
    }
    let deployment = deploy(&config)?;
    deployment.snapshot().save(&store)?;

    let distributor = &deployment.distributor;
    let decimals = token_decimals(distributor);
    println!("Deployment complete");
    println!("  Token: {} ({})", deployment.token, config.token.symbol);
    println!("  Distributor: {}", distributor.address());
    println!("  Owner: {}", distributor.owner());
    println!("  Eligibility: {}", distributor.eligibility_mode());
    println!(
        "  Funded: {}",
        format_units(distributor.contract_balance()?, decimals)
    );
    println!("  Height: {}", distributor.current_height());
    println!("  Data dir: {}", data_dir.display());
    Ok(())
}

fn cmd_merkle_root(members: &Path) -> Result<(), CliError> {
    let members = inputs::read_members(members)?;
    let tree = MerkleTree::from_accounts(members.iter().map(|m| m.as_bytes()))?;
    println!("{}", format_hash(&tree.root()));
    Ok(())
}

fn cmd_merkle_proof(members: &Path, account: &Address, output: Option<&Path>) -> Result<(), CliError> {
    let members = inputs::read_members(members)?;
    let tree = MerkleTree::from_accounts(members.iter().map(|m| m.as_bytes()))?;
    let bundle = tree.bundle_for_account(account.as_bytes())?;
    let json = serde_json::to_string_pretty(&bundle)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Proof for {account} written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_merkle_verify(root: &str, account: &Address, proof: &ProofArgs) -> Result<(), CliError> {
    let root = parse_hash(root)?;
    let proof = resolve(proof)?;
    let valid = got_merkle::verify(&proof, &root, hash_leaf(account.as_bytes()));
    println!("{}", if valid { "valid" } else { "invalid proof" });
    Ok(())
}

fn cmd_claim(data_dir: &Path, key: &Path, proof: &ProofArgs) -> Result<(), CliError> {
    let caller = keys::load(key)?;
    let proof = resolve(proof)?;
    with_distributor(data_dir, |distributor| {
        let receipt = distributor.claim(&caller, &proof)?;
        let decimals = token_decimals(distributor);
        println!("Claimed {}", format_units(receipt.amount, decimals));
        println!("  Claimant: {}", receipt.claimant);
        println!("  Height: {}", receipt.height);
        println!("  Next claim at: {}", receipt.next_claim_at);
        Ok(())
    })
}

fn cmd_admin(data_dir: &Path, key: &Path, command: AdminCommands) -> Result<(), CliError> {
    let caller = keys::load(key)?;
    with_distributor(data_dir, |distributor| {
        let decimals = token_decimals(distributor);
        match command {
            AdminCommands::TransferOwnership { new_owner } => {
                distributor.transfer_ownership(&caller, new_owner)?
            }
            AdminCommands::SetToken { token } => distributor.update_reward_token(&caller, token)?,
            AdminCommands::SetRate { rate } => {
                distributor.update_distribution_rate(&caller, parse_units(&rate, decimals)?)?
            }
            AdminCommands::SetCooldown { blocks } => {
                distributor.update_claim_cooldown(&caller, blocks)?
            }
            AdminCommands::SetStakes { file } => {
                let (addresses, amounts) =
                    inputs::parse_stakes(&std::fs::read_to_string(file)?, decimals)?;
                distributor.update_stake_registry(&caller, &addresses, &amounts)?
            }
            AdminCommands::RotateRoot { root } => {
                distributor.rotate_merkle_root(&caller, parse_hash(&root)?)?
            }
            AdminCommands::Withdraw { amount } => {
                distributor.withdraw(&caller, parse_units(&amount, decimals)?)?
            }
        }
        Ok(())
    })
}

fn cmd_query(data_dir: &Path, command: QueryCommands) -> Result<(), CliError> {
    let store = StateStore::open(data_dir)?;
    let distributor = ChainSnapshot::load(&store)?.restore()?;
    let decimals = token_decimals(&distributor);
    let units = |amount: Amount| format_units(amount, decimals);

    match command {
        QueryCommands::Info => {
            println!("Distributor: {}", distributor.address());
            println!("  Owner: {}", distributor.owner());
            println!("  Reward token: {}", distributor.reward_token());
            println!("  Rate: {}", units(distributor.distribution_rate()));
            println!("  Cooldown: {} blocks", distributor.claim_cooldown());
            println!("  Policy: {:?}", distributor.policy());
            println!("  Eligibility: {}", distributor.eligibility_mode());
            if let Some(root) = distributor.merkle_root() {
                println!("  Merkle root: {}", format_hash(&root));
            }
            if let Some(registry) = distributor.eligibility().registry() {
                println!(
                    "  Stakers: {} ({} staked)",
                    registry.len(),
                    units(registry.total_staked())
                );
            }
            println!("  Balance: {}", units(distributor.contract_balance()?));
            println!("  Height: {}", distributor.current_height());
        }
        QueryCommands::Balance { address } => {
            let balance = distributor
                .host()
                .balance_of(&distributor.reward_token(), &address)?;
            println!("{}", units(balance));
        }
        QueryCommands::Status { address } => match distributor.claim_status(&address) {
            ClaimStatus::NeverClaimed => println!("never claimed"),
            ClaimStatus::Ready { last_claim } => {
                println!("ready (last claim at block {last_claim})")
            }
            ClaimStatus::Cooling {
                last_claim,
                ready_at,
            } => println!("cooling (last claim at block {last_claim}, ready at block {ready_at})"),
        },
        QueryCommands::Stake { address } => match distributor.staked_amount(&address) {
            Some(amount) => println!("{}", units(amount)),
            None => println!("no staked amount"),
        },
        QueryCommands::Pending { address, proof } => {
            let proof = resolve(&proof)?;
            println!("{}", units(distributor.pending_reward(&address, &proof)?));
        }
        QueryCommands::Stakers => match distributor.eligibility().registry() {
            Some(registry) => {
                for (account, amount) in registry.iter() {
                    println!("{account} {}", units(*amount));
                }
            }
            None => println!("merkle eligibility has no stake registry"),
        },
        QueryCommands::Claims => {
            for (account, height) in distributor.claim_records() {
                println!("{account} {height}");
            }
        }
    }
    Ok(())
}

fn cmd_chain_advance(data_dir: &Path, blocks: u64) -> Result<(), CliError> {
    let store = StateStore::open(data_dir)?;
    let mut snapshot = ChainSnapshot::load(&store)?;
    let height = snapshot.advance(blocks)?;
    snapshot.save(&store)?;
    println!("Height: {height}");
    Ok(())
}

fn cmd_chain_height(data_dir: &Path) -> Result<(), CliError> {
    let store = StateStore::open(data_dir)?;
    println!("{}", ChainSnapshot::load(&store)?.current_height());
    Ok(())
}

fn cmd_chain_reset(data_dir: &Path) -> Result<(), CliError> {
    let store = StateStore::open(data_dir)?;
    if ChainSnapshot::discard(&store)? {
        println!("Deployment removed from {}", data_dir.display());
    } else {
        println!("Nothing deployed in {}", data_dir.display());
    }
    Ok(())
}

/// Load the snapshot, run `f` against a live distributor, log its events and
/// persist the result. Nothing is written when `f` fails.
fn with_distributor<F>(data_dir: &Path, f: F) -> Result<(), CliError>
where
    F: FnOnce(&mut LiveDistributor) -> Result<(), CliError>,
{
    let store = StateStore::open(data_dir)?;
    let mut snapshot = ChainSnapshot::load(&store)?;
    let mut distributor = snapshot.restore()?;

    f(&mut distributor)?;

    for event in distributor.drain_events() {
        tracing::info!(event = %serde_json::to_string(&event)?, "distributor event");
    }
    snapshot.record(&distributor);
    snapshot.save(&store)?;
    Ok(())
}

fn resolve(args: &ProofArgs) -> Result<Vec<got_merkle::Hash>, CliError> {
    inputs::resolve_proof(&args.proof, args.proof_file.as_deref())
}

fn token_decimals(distributor: &Distributor<TokenRegistry, impl BlockClock>) -> u8 {
    distributor
        .host()
        .get(&distributor.reward_token())
        .map_or(0, |ledger| ledger.metadata().decimals)
}

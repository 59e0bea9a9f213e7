use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueHint};
use deedlock_core::interface::{load_escrow_data, save_escrow_data, ListingParams, Snapshot};
use deedlock_core::{Address, AssetId};

const DEFAULT_SNAPSHOT_PATH: &str = "./deedlock.json";
const DEFAULT_LISTING_PARAMS_PATH: &str = "./listing_params.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();
    let path = cli.snapshot;

    if let Commands::Init { escrow } = cli.command {
        save_escrow_data(&path, &Snapshot::new(escrow))?;
        tracing::info!("Initialized escrow registry at {escrow}");
        return Ok(());
    }

    let mut snapshot: Snapshot = load_escrow_data(&path)?;
    let Snapshot {
        escrow,
        deeds,
        ledger,
    } = &mut snapshot;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Mint { asset, owner } => {
            deeds.mint(asset, owner)?;
            tracing::info!("Minted asset {asset} to {owner}");
        }
        Commands::Fund { who, amount } => {
            ledger.credit(who, amount)?;
            tracing::info!("Funded {who} with {amount}");
        }
        Commands::List { caller, params } => {
            let params: ListingParams = load_escrow_data(&params)?;
            escrow.list(deeds, caller, params.asset, params.terms())?;
            tracing::info!("Listed asset {} for sale", params.asset);
        }
        Commands::Deposit {
            caller,
            asset,
            amount,
        } => {
            // The attached value leaves the depositor's balance first;
            // on any failure the snapshot is not saved, so nothing moves.
            ledger.debit(caller, amount)?;
            escrow.deposit_funds(caller, asset, amount)?;
            tracing::info!("Deposited {amount} into sale of asset {asset}");
        }
        Commands::Inspect {
            caller,
            asset,
            passed,
        } => {
            escrow.update_inspection(caller, asset, passed)?;
            tracing::info!(
                "Recorded inspection {} for asset {asset}",
                if passed { "pass" } else { "fail" }
            );
        }
        Commands::Approve { caller, asset } => {
            escrow.approve_sale(caller, asset)?;
            tracing::info!("Recorded approval from {caller} for asset {asset}");
        }
        Commands::Finalize { asset } => {
            escrow.finalize_sale(deeds, ledger, asset)?;
            tracing::info!("Finalized sale of asset {asset}");
        }
        Commands::Cancel { caller, asset } => {
            escrow.cancel_sale(caller, asset)?;
            tracing::info!("Cancelled sale of asset {asset}");
        }
        Commands::Withdraw { caller, asset } => {
            escrow.withdraw_funds(ledger, caller, asset)?;
            tracing::info!("Withdrew residual funds for asset {asset}");
        }
        Commands::Show { asset } => {
            let sale = escrow
                .sale(asset)
                .with_context(|| format!("no sale listed for asset {asset}"))?;
            println!("{}", serde_json::to_string_pretty(sale)?);
            for event in escrow.events() {
                println!("{event}");
            }
            return Ok(());
        }
    }

    save_escrow_data(&path, &snapshot)
}

#[derive(Parser)]
#[command(name = "deedlock-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Registry snapshot file, created by `init` and updated by every
    /// mutating command.
    #[arg(short, long, global = true,
        value_parser,
        default_value = DEFAULT_SNAPSHOT_PATH,
        value_hint = ValueHint::FilePath)]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh snapshot with the escrow registered at the given address
    Init { escrow: Address },

    /// Register a new asset under an owner
    Mint { asset: AssetId, owner: Address },

    /// Credit an identity's cash balance
    Fund { who: Address, amount: u64 },

    /// List an asset for sale under the terms in a params file
    List {
        caller: Address,

        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_LISTING_PARAMS_PATH,
            value_hint = ValueHint::FilePath)]
        params: PathBuf,
    },

    /// Attach funds to a sale as its buyer or lender
    Deposit {
        caller: Address,
        asset: AssetId,
        amount: u64,
    },

    /// Record the inspector's verdict
    Inspect {
        caller: Address,
        asset: AssetId,
        #[arg(action = clap::ArgAction::Set)]
        passed: bool,
    },

    /// Record an approval from the buyer, seller, or lender
    Approve { caller: Address, asset: AssetId },

    /// Settle an approved sale: pay the seller, move custody to the buyer
    Finalize { asset: AssetId },

    /// Unwind a sale from the awaiting-funds or awaiting-approval state
    Cancel { caller: Address, asset: AssetId },

    /// Settle the residual balance of a cancelled sale
    Withdraw { caller: Address, asset: AssetId },

    /// Print a sale's record and the registry event log
    Show { asset: AssetId },
}

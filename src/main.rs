use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use roll_call::store::{self, keys};
use roll_call::{
    logging, parse_table, parse_text, run_pick, FileStore, History, Pick, PickError, Policy, Roster, Selector, TableOptions,
};

/// Picks names from a class roster.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the roster, policy and history
    #[arg(long, env = "ROLL_CALL_STORE", default_value = ".roll-call")]
    store: PathBuf,

    /// More log output; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the roster with names read from a file
    Import {
        file: PathBuf,
        /// Read a comma- or tab-separated table instead of a plain name list
        #[arg(long)]
        table: bool,
        /// The table has no header row; columns are named A, B, C, ...
        #[arg(long, requires = "table")]
        no_headers: bool,
        /// Name column, by header text or letter (detected from headers if omitted)
        #[arg(long, requires = "table")]
        name_column: Option<String>,
        /// Id column, by header text or letter
        #[arg(long, requires = "name_column")]
        id_column: Option<String>,
    },
    /// Pick names using the stored policy
    Pick {
        /// Override the number of names to pick
        #[arg(long)]
        count: Option<usize>,
        /// Seed the random generator for a repeatable pick
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show past picks, most recent first
    History {
        /// Print as JSON with row numbers and a timestamp
        #[arg(long)]
        export: bool,
    },
    /// Forget all past picks
    ClearHistory,
    /// Show or change the selection policy
    Policy {
        #[command(subcommand)]
        action: Option<PolicyCommand>,
    },
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Print the current policy
    Show,
    /// Always pick this id first
    Always { id: String },
    /// Never pick this id unless it is also always picked
    Never { id: String },
    /// Drop this id from the always and never lists
    Release { id: String },
    /// Set the weight for an id (0 stops it being drawn)
    Weight { id: String, weight: u32 },
    /// Number of names per pick
    Count { count: usize },
    /// Make recently picked names less likely
    AvoidRepeat {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut store = FileStore::open(&args.store)
        .with_context(|| format!("cannot open store at {}", args.store.display()))?;
    info!(store = %store.dir().display(), "opened store");

    match args.command {
        Command::Import { file, table, no_headers, name_column, id_column } => {
            let input = fs::read_to_string(&file)
                .with_context(|| format!("cannot read {}", file.display()))?;
            let roster = if table {
                let options = TableOptions {
                    has_headers: !no_headers,
                    name_column: name_column.as_deref(),
                    id_column: id_column.as_deref(),
                };
                parse_table(&input, &options)?
            } else {
                parse_text(&input)?
            };
            store::save(&mut store, keys::ROSTER, &roster)?;
            println!("imported {} names", roster.len());
        }
        Command::Pick { count, seed } => {
            let result = match seed {
                Some(seed) => run_pick(&mut store, &mut Selector::seeded(seed), count),
                None => run_pick(&mut store, &mut Selector::from_entropy(), count),
            };
            let selection = match result {
                Err(PickError::EmptyRoster) => bail!("the roster is empty; run `roll-call import <file>` first"),
                other => other?,
            };
            if selection.is_empty() {
                println!("no eligible entries: every name is excluded");
                return Ok(());
            }
            for pick in selection.picks() {
                let marker = match pick {
                    Pick::Forced(_) => " (always)",
                    Pick::Recycled(_) => " (repeat)",
                    Pick::Drawn(_) => "",
                };
                println!("{} [{}]{}", pick.entry().name, pick.entry().id, marker);
            }
        }
        Command::History { export } => {
            let history: History = store::load(&store, keys::HISTORY, History::new());
            if export {
                println!("{}", store::export_history(&history, Utc::now())?);
            } else if history.is_empty() {
                println!("no picks yet");
            } else {
                for entry in history.iter() {
                    println!("{} [{}]", entry.name, entry.id);
                }
            }
        }
        Command::ClearHistory => {
            store::clear_history(&mut store)?;
            println!("history cleared");
        }
        Command::Policy { action } => {
            let policy: Policy = store::load(&store, keys::SETTINGS, Policy::default());
            let roster: Roster = store::load(&store, keys::ROSTER, Roster::default());
            let updated = match action.unwrap_or(PolicyCommand::Show) {
                PolicyCommand::Show => {
                    println!("{}", serde_json::to_string_pretty(&policy)?);
                    return Ok(());
                }
                PolicyCommand::Always { id } => policy.force_include(known(&roster, id)),
                PolicyCommand::Never { id } => policy.force_exclude(known(&roster, id)),
                PolicyCommand::Release { id } => policy.release(&id),
                PolicyCommand::Weight { id, weight } => policy.with_weight(known(&roster, id), weight),
                PolicyCommand::Count { count } => policy.with_selection_count(count),
                PolicyCommand::AvoidRepeat { enabled } => policy.with_avoid_repeat(enabled),
            };
            updated.validate()?;
            store::save(&mut store, keys::SETTINGS, &updated)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}

fn known(roster: &Roster, id: String) -> String {
    if !roster.contains(&id) {
        warn!(%id, "id is not in the current roster");
    }
    id
}

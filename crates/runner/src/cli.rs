//! Command line surface

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use shotgun_core::{Instruction, QueryFilter, Side};
use std::path::PathBuf;

use crate::batch::load_batch;
use crate::error::{Result, RunError};

/// One click order submission across every configured brokerage.
#[derive(Parser, Debug)]
#[command(name = "shotgun")]
#[command(about = "Submit one order to many brokerages at once", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Submit every order in a JSON batch file
    #[arg(long = "from-file", value_name = "PATH")]
    pub from_file: Option<PathBuf>,

    /// Targets configuration (default: built-in brokerage table)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Restrict to these targets (repeatable)
    #[arg(short = 't', long = "target", global = true, value_name = "NAME")]
    pub targets: Vec<String>,

    /// Show what would be sent without contacting any target
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,

    /// Trade against simulated paper accounts named after each target
    #[arg(long, alias = "mock-brokers", global = true)]
    pub paper: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Buy on every target
    Buy(OrderArgs),
    /// Sell on every target
    Sell(OrderArgs),
    /// Show holdings, optionally for one symbol
    Holdings {
        symbol: Option<String>,
    },
    /// Log in to every target and report which sessions are active
    Health {
        /// Drop cached sessions and results and log in again
        #[arg(long)]
        reconnect: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct OrderArgs {
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,
    pub symbol: String,
    /// Limit price; market order when omitted
    pub price: Option<Decimal>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// What the user asked for, validated
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Trade(Vec<Instruction>),
    Holdings(QueryFilter),
    Health { reconnect: bool },
}

impl Cli {
    pub fn request(&self) -> Result<Request> {
        match (&self.command, &self.from_file) {
            (Some(_), Some(_)) => Err(RunError::Usage(
                "--from-file cannot be combined with a command".into(),
            )),
            (None, Some(path)) => Ok(Request::Trade(load_batch(path)?)),
            (None, None) => Err(RunError::Usage(
                "nothing to do: give buy/sell/holdings/health or --from-file".into(),
            )),
            (Some(Command::Buy(args)), None) => Ok(Request::Trade(vec![args.instruction(Side::Buy)?])),
            (Some(Command::Sell(args)), None) => {
                Ok(Request::Trade(vec![args.instruction(Side::Sell)?]))
            }
            (Some(Command::Holdings { symbol }), None) => Ok(Request::Holdings(
                symbol.as_ref().map_or_else(QueryFilter::all, QueryFilter::symbol),
            )),
            (Some(Command::Health { reconnect }), None) => Ok(Request::Health {
                reconnect: *reconnect,
            }),
        }
    }
}

impl OrderArgs {
    fn instruction(&self, side: Side) -> Result<Instruction> {
        Instruction::new(side, self.quantity, &self.symbol, self.price)
            .map_err(|e| RunError::Validation(vec![e.to_string()]))
    }
}

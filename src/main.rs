use clap::{Args, Parser, Subcommand};
use lakiremit::application::session::{SessionContext, TransferSession};
use lakiremit::config::{DEFAULT_RECIPIENT_NAME, FlowConfig};
use lakiremit::domain::amount::TransferAmount;
use lakiremit::domain::bank::{Bank, default_banks, find_bank};
use lakiremit::domain::conversion::{convert, format_etb};
use lakiremit::domain::flow::FlowState;
use lakiremit::domain::ports::RateSourceRef;
use lakiremit::domain::reference::DEFAULT_TRANSACTION_PREFIX;
use lakiremit::domain::transfer::{DestinationBank, PaymentDetails, SenderProfile};
use lakiremit::error::{RemitError, ValidationError};
use lakiremit::infrastructure::in_memory::StaticRateTable;
use lakiremit::interfaces::csv::bank_reader::BankReader;
use lakiremit::interfaces::csv::bank_writer::BankWriter;
use lakiremit::logging::setup_logging;
use miette::{IntoDiagnostic, Result, miette};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "USD to ETB transfer quotes and simulated transfers", long_about = None)]
struct Cli {
    /// Rate table CSV (id,name,short_name,logo,rate,bonus,color). Defaults to the built-in table.
    #[arg(long, global = true, env = "LAKIREMIT_RATES")]
    rates: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rate table as CSV
    Rates {
        /// How long the simulated rate refresh takes
        #[arg(long, env = "LAKIREMIT_RATE_REFRESH_DELAY_MS", default_value_t = 1000)]
        refresh_delay_ms: u64,
    },
    /// Show what an amount converts to at a bank
    Quote {
        /// Amount in USD
        #[arg(long)]
        amount: String,
        /// Bank id; the first bank in the table when omitted
        #[arg(long)]
        bank: Option<String>,
    },
    /// Run a complete simulated transfer and print the receipt
    Send(SendArgs),
}

#[derive(Args)]
struct SendArgs {
    /// Amount in USD
    #[arg(long)]
    amount: String,
    #[arg(long)]
    bank: Option<String>,
    /// Recipient account number
    #[arg(long)]
    account: String,
    #[arg(long, default_value = "")]
    reason: String,
    #[arg(long)]
    sender_name: Option<String>,
    #[arg(long)]
    sender_email: Option<String>,
    /// Send to an account at another bank
    #[arg(long)]
    other_bank: bool,
    /// Print the receipt as JSON
    #[arg(long)]
    json: bool,
    #[arg(long, env = "LAKIREMIT_PROCESSING_DELAY_MS", default_value_t = 4000)]
    processing_delay_ms: u64,
    #[arg(long, env = "LAKIREMIT_VERIFICATION_DELAY_MS", default_value_t = 1000)]
    verification_delay_ms: u64,
    #[arg(long, env = "LAKIREMIT_TX_PREFIX", default_value = DEFAULT_TRANSACTION_PREFIX)]
    tx_prefix: String,
    #[arg(long, env = "LAKIREMIT_RECIPIENT_NAME", default_value = DEFAULT_RECIPIENT_NAME)]
    recipient_name: String,
}

impl SendArgs {
    fn config(&self) -> FlowConfig {
        FlowConfig {
            processing_delay: Duration::from_millis(self.processing_delay_ms),
            verification_delay: Duration::from_millis(self.verification_delay_ms),
            transaction_prefix: self.tx_prefix.clone(),
            recipient_name: self.recipient_name.clone(),
            ..FlowConfig::default()
        }
    }
}

fn load_banks(path: Option<&PathBuf>) -> Result<Arc<[Bank]>> {
    match path {
        Some(path) => BankReader::from_path(path)
            .and_then(BankReader::into_table)
            .into_diagnostic(),
        None => Ok(default_banks()),
    }
}

async fn print_rates(source: RateSourceRef) -> Result<()> {
    info!("Loading rates");
    let banks = source.refresh().await.into_diagnostic()?;
    let stdout = io::stdout();
    BankWriter::new(stdout.lock())
        .write_banks(banks.iter())
        .into_diagnostic()
}

async fn send(banks: Arc<[Bank]>, args: SendArgs) -> Result<()> {
    let config = args.config();
    let sender = SenderProfile {
        display_name: args.sender_name.clone(),
        email: args.sender_email.clone(),
    };
    let session =
        TransferSession::new(SessionContext::simulated(banks, Some(sender), &config))
            .into_diagnostic()?;

    if !session.edit(|f| f.update_amount(&args.amount)).await.into_diagnostic()? {
        return Err(miette!("Invalid amount: {}", args.amount));
    }
    if let Some(bank) = &args.bank {
        session.edit(|f| f.select_bank(bank)).await.into_diagnostic()?;
    }
    if !session.edit(|f| f.start()).await.into_diagnostic()? {
        return Err(RemitError::from(ValidationError::AmountNotPositive)).into_diagnostic();
    }

    let destination = if args.other_bank {
        DestinationBank::Other
    } else {
        DestinationBank::Primary
    };
    session
        .edit(|f| {
            f.set_destination(destination)?;
            f.set_account_number(args.account.as_str())?;
            f.set_reason(args.reason.as_str())
        })
        .await
        .into_diagnostic()?;

    if session.check_account().await.into_diagnostic()? {
        session.settle_verification().await;
    }
    session
        .edit(|f| f.continue_to_summary())
        .await
        .into_diagnostic()?;

    session.confirm().await.into_diagnostic()?;
    if session.settle_processing().await != FlowState::CollectingPayment {
        let error = session
            .snapshot()
            .await
            .request
            .and_then(|request| request.last_error)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(miette!("Transfer failed: {error}"));
    }

    let receipt = session
        .pay(PaymentDetails::default())
        .await
        .into_diagnostic()?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&receipt).into_diagnostic()?
        );
    } else {
        println!("{receipt}");
    }
    session.dismiss().await.into_diagnostic()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();
    let banks = load_banks(cli.rates.as_ref())?;

    match cli.command {
        Command::Rates { refresh_delay_ms } => {
            let config = FlowConfig {
                rate_refresh_delay: Duration::from_millis(refresh_delay_ms),
                ..FlowConfig::default()
            };
            let table = StaticRateTable::from_config(banks, &config).into_diagnostic()?;
            print_rates(Arc::new(table)).await?;
        }
        Command::Quote { amount, bank } => {
            let bank = match &bank {
                Some(id) => find_bank(&banks, id).into_diagnostic()?,
                None => &banks[0],
            };
            let mut entry = TransferAmount::new();
            if !entry.update(amount.trim()) {
                return Err(miette!("Invalid amount: {amount}"));
            }
            let result = convert(entry.value(), bank).into_diagnostic()?;
            println!("Bank: {} (1 USD = {} ETB)", bank.name, bank.rate.normalize());
            println!("Converted: {} ETB", format_etb(result.converted));
            println!("Bonus: {} ETB", format_etb(result.bonus));
            println!("Total: {} ETB", format_etb(result.total));
        }
        Command::Send(args) => send(banks, args).await?,
    }

    Ok(())
}

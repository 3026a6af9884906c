// File: services/vetbook_cli/src/main.rs
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use vetbook_common::{logging, require_token, validation_error, VetbookError};
use vetbook_config::{load_config, AppConfig};
use vetbook_reconciler::{BookingReconciler, CancelOutcome};

mod app_state;
mod output;
mod prompt;

use app_state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Book and manage vet appointments")]
struct Cli {
    /// Log in with this email before running the command
    #[arg(long, global = true, requires = "password")]
    email: Option<String>,

    #[arg(long, global = true, requires = "email")]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the issued token and role
    Login,
    /// Create a user account, then log in with it
    Register {
        /// Your full name
        #[arg(long)]
        name: String,
    },
    /// List bookable slots
    Slots,
    /// List your appointments
    Bookings,
    /// Book a slot
    Book {
        #[arg(long)]
        slot: i64,
        /// Contact phone number
        #[arg(long)]
        phone: String,
        /// What happened to your pet
        #[arg(long)]
        message: String,
    },
    /// Cancel one of your upcoming appointments
    Cancel {
        id: i64,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Manage your schedule (doctors and admins)
    Doctor {
        #[command(subcommand)]
        command: DoctorCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DoctorCommand {
    /// List your slots, booked ones included
    Slots,
    /// Publish a new slot
    Add {
        /// Start time, RFC 3339 (e.g. 2030-03-04T10:30:00Z)
        #[arg(long)]
        at: DateTime<Utc>,
        /// Length in minutes; defaults to booking.default_slot_minutes
        #[arg(long)]
        duration: Option<u32>,
    },
    /// Delete an unbooked slot
    Remove {
        id: i64,
        #[arg(long, short)]
        yes: bool,
    },
    /// List appointments booked on your slots
    Appointments,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init_with_level(logging::parse_level(&config.logging.level));
    debug!("using booking service at {}", config.api.base_url);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_precondition() {
                debug!("rejected before sending ({:?}): {}", e.kind(), e);
            } else {
                error!("command failed ({:?}): {}", e.kind(), e);
            }
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Arc<AppConfig>) -> Result<(), VetbookError> {
    let state = AppState::new(config)?;

    let needs_credentials = matches!(cli.command, Command::Login | Command::Register { .. });
    match (cli.email, cli.password) {
        (Some(email), Some(password)) => {
            if let Command::Register { name } = &cli.command {
                let user = state.register(name, &email, &password).await?;
                println!("Registered {}.", user.display_name());
            }
            let login = state.login(&email, &password).await?;
            if needs_credentials {
                output::print_login(&login);
                return Ok(());
            }
        }
        _ if needs_credentials => {
            return Err(validation_error("this command needs --email and --password"));
        }
        _ => {}
    }

    match cli.command {
        Command::Login | Command::Register { .. } => Ok(()),
        Command::Slots => {
            let reconciler = state.reconciler();
            reconciler.load_available_slots().await?;
            output::print_slots(&reconciler.available_slots());
            Ok(())
        }
        Command::Bookings => {
            require_token(state.session.as_ref())?;
            let reconciler = state.reconciler();
            reconciler.load_user_bookings().await?;
            output::print_bookings(&reconciler.booking_views());
            Ok(())
        }
        Command::Book {
            slot,
            phone,
            message,
        } => {
            let reconciler = state.reconciler();
            reconciler.load_available_slots().await?;
            let booking = reconciler.submit_booking(slot, &phone, &message).await?;
            output::print_booked(&booking);
            warn_if_stale(&reconciler);
            Ok(())
        }
        Command::Cancel { id, yes } => {
            require_token(state.session.as_ref())?;
            let reconciler = state.reconciler();
            reconciler.load_user_bookings().await?;
            match reconciler.cancel_booking(id, prompt::confirmer(yes).as_ref()).await? {
                CancelOutcome::Cancelled => println!("Appointment #{} cancelled.", id),
                CancelOutcome::Declined => println!("Nothing was cancelled."),
            }
            warn_if_stale(&reconciler);
            Ok(())
        }
        Command::Doctor { command } => run_doctor(&state, command).await,
    }
}

fn warn_if_stale(reconciler: &BookingReconciler) {
    if let Some(reason) = reconciler.stale_reason() {
        eprintln!("warning: {}", reason);
    }
}

async fn run_doctor(state: &AppState, command: DoctorCommand) -> Result<(), VetbookError> {
    let schedule = state.schedule();
    match command {
        DoctorCommand::Slots => {
            schedule.refresh().await?;
            output::print_slots(&schedule.slots());
        }
        DoctorCommand::Add { at, duration } => {
            let minutes = duration.unwrap_or_else(|| schedule.default_slot_minutes());
            let slot = schedule.add_slot(at, minutes).await?;
            println!("Published slot:");
            println!("{}", output::format_slot(&slot));
        }
        DoctorCommand::Remove { id, yes } => {
            schedule.refresh().await?;
            if schedule.remove_slot(id, prompt::confirmer(yes).as_ref()).await? {
                println!("Slot #{} deleted.", id);
            } else {
                println!("Nothing was deleted.");
            }
        }
        DoctorCommand::Appointments => {
            output::print_appointments(&schedule.appointments().await?);
        }
    }
    Ok(())
}

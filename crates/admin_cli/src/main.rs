use std::{error::Error, io::Write, path::PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, EntryFilter, LedgerKind, Money};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ledgerly_admin")]
#[command(about = "Admin utilities for Ledgerly (accounts, categories, budget repair, exports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./ledgerly.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Category(Category),
    Budget(Budget),
    /// Write a ledger as CSV.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create an already verified account.
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
    List(KindArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: LedgerKind,
    #[arg(long)]
    name: String,
    /// Monthly limit, expense categories only (e.g. `250` or `99,90`).
    #[arg(long)]
    budget_limit: Option<Money>,
}

#[derive(Args, Debug)]
struct KindArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: LedgerKind,
}

#[derive(Args, Debug)]
struct Budget {
    #[command(subcommand)]
    command: BudgetCommand,
}

#[derive(Subcommand, Debug)]
enum BudgetCommand {
    /// Compare stored budgets with the expense ledger.
    Verify,
    /// Rewrite every budget from the expense ledger.
    Recompute,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: LedgerKind,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    category_id: Option<Uuid>,
    /// Inclusive, `YYYY-MM-DD`.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Inclusive, `YYYY-MM-DD`.
    #[arg(long)]
    to: Option<NaiveDate>,
}

fn parse_kind(raw: &str) -> Result<LedgerKind, String> {
    LedgerKind::try_from(raw).map_err(|err| err.to_string())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_drifts(drifts: &[engine::BudgetDrift]) {
    for drift in drifts {
        let stored = drift
            .stored
            .map_or_else(|| "missing".to_string(), |m| m.to_string());
        let marker = if drift.is_consistent() { "ok" } else { "DRIFT" };
        println!(
            "{marker:>5}  {:<24} stored {stored:>14}  expected {:>14}",
            drift.category, drift.expected
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = prompt_password_twice()?;
            let registration = engine.register(&args.email, &password).await?;
            engine
                .verify_email(&registration.verification_token)
                .await?;
            println!(
                "created user: {} ({})",
                registration.user.email, registration.user.id
            );
        }
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => {
            let category = engine
                .create_category(args.kind, &args.name, args.budget_limit)
                .await?;
            println!("created {} category: {} ({})", args.kind, category.name, category.id);
        }
        Command::Category(Category {
            command: CategoryCommand::List(args),
        }) => {
            for category in engine.list_categories(args.kind).await? {
                let limit = category
                    .budget_limit
                    .map_or_else(String::new, |limit| format!("  limit {limit}"));
                println!("{}  {}{limit}", category.id, category.name);
            }
        }
        Command::Budget(Budget {
            command: BudgetCommand::Verify,
        }) => {
            let drifts = engine.verify_budgets().await?;
            print_drifts(&drifts);
            if drifts.iter().any(|drift| !drift.is_consistent()) {
                std::process::exit(1);
            }
        }
        Command::Budget(Budget {
            command: BudgetCommand::Recompute,
        }) => {
            let repaired = engine.recompute_budgets().await?;
            if repaired.is_empty() {
                println!("all budgets consistent");
            } else {
                print_drifts(&repaired);
                println!("repaired {} budget(s)", repaired.len());
            }
        }
        Command::Export(args) => {
            let filter = EntryFilter {
                category_id: args.category_id,
                from: args.from,
                to: args.to,
            };
            let csv = engine.export_entries(args.kind, &filter).await?;
            std::fs::write(&args.out, csv)?;
            println!("wrote {} export to {}", args.kind, args.out.display());
        }
    }

    Ok(())
}

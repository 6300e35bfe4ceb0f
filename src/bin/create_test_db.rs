use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use tally_rs::{
    NewTransaction, PasswordHash, TransactionType, ValidatedPassword, create_transaction,
    create_user, initialize_db,
};

const TEST_EMAIL: &str = "test@example.com";
const TEST_PASSWORD: &str = "test";

/// A utility for creating a test database for the REST API server of tally_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user {TEST_EMAIL} with the password '{TEST_PASSWORD}'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;
    let user = create_user(EmailAddress::new_unchecked(TEST_EMAIL), password_hash, &conn)?;

    println!("Creating test transactions...");

    let now = OffsetDateTime::now_utc();
    let transactions = [
        (TransactionType::Income, 2500.0, "salary", Duration::days(14)),
        (TransactionType::Expense, 1200.0, "rent", Duration::days(13)),
        (TransactionType::Expense, 86.4, "groceries", Duration::days(6)),
        (TransactionType::Expense, 42.0, "power bill", Duration::days(1)),
        (TransactionType::Income, 60.0, "sold old bike", Duration::hours(3)),
        (TransactionType::Expense, 5.5, "coffee", Duration::ZERO),
    ];

    for (transaction_type, amount, remark, age) in transactions {
        create_transaction(
            user.id,
            NewTransaction {
                transaction_type,
                amount,
                remark: Some(remark.to_owned()),
                date: now - age,
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}

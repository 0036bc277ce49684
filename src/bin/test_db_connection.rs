//! Test the destination database connection
//!
//! Run with: cargo run --bin test_db_connection

use std::process::ExitCode;
use yelp_loader::db::{connect, Destination};
use yelp_loader::schema::{BUSINESS_TABLE, REVIEW_TABLE};
use yelp_loader::{ConnectionParams, LoadError};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("🔌 Testing database connection...\n");

    let params = ConnectionParams::from_env();
    println!("📡 Connecting to: {}", params.display_url());

    let mut destination = match connect(&params).await {
        Ok(Some(destination)) => destination,
        Ok(None) => {
            eprintln!("❌ Connection parameters incomplete: {}", params.missing().join(", "));
            eprintln!("   Set the YELP_DB_* variables in your .env file, for example:");
            eprintln!("   YELP_DB_HOST=localhost");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            eprintln!("❌ Connection failed: {}", e);
            if let LoadError::Connection(_) = e {
                eprintln!("\n💡 Troubleshooting:");
                eprintln!("   1. Is PostgreSQL running? (check with: pg_isready)");
                eprintln!("   2. Is the database '{}' created?", params.database.as_deref().unwrap_or(""));
                eprintln!("   3. Are the username and password correct?");
                eprintln!("   4. Is port {} accessible?", params.port.as_deref().unwrap_or(""));
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("✅ Connected successfully!\n");

    for table in [BUSINESS_TABLE.name, REVIEW_TABLE.name] {
        match destination.count_rows(table).await {
            Ok(count) => println!("   📋 {}: {} rows", table, count),
            Err(e) => println!("   ⚠️  {} not found or error: {}", table, e),
        }
    }

    destination.close().await?;
    println!("\n✅ Database connection test completed successfully!");
    Ok(ExitCode::SUCCESS)
}

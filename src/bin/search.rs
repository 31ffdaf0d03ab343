use anyhow::Result;
use bible_db::db::Db;
use bible_db::search::search_verses;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "search")]
#[command(about = "Full-text search over the verses of a finished bible database")]
struct Args {
    /// Path to the finished database
    db_path: PathBuf,

    /// Words to search for
    #[arg(required = true)]
    query: Vec<String>,

    /// Only return verses of this translation code
    #[arg(short, long)]
    translation: Option<String>,

    /// Maximum number of verses to return
    #[arg(short = 'k', long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let query = args.query.join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let db = Db::read_only(&args.db_path);

    let start = Instant::now();
    let hits = search_verses(&db, &query, args.translation.as_deref(), args.limit).await?;
    let latency = start.elapsed();

    if hits.is_empty() {
        println!("No verses matched \"{}\" ({:?})", query, latency);
        return Ok(());
    }

    println!("\n{} verse(s) matched \"{}\" ({:?})\n", hits.len(), query, latency);
    for hit in &hits {
        println!("{:>3}. {} [{}]", hit.rank, hit.reference, hit.translation);
        println!("     {}", hit.text);
    }
    println!();

    Ok(())
}

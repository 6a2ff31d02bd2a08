use shadowbox_core::{CompletionLog, Database};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let log = CompletionLog::load(&db);
    let stats = log.stats(chrono::Local::now().date_naive());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

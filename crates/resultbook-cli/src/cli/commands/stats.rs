use super::{exit_codes, Ctx};
use resultbook_core::storage::LINES_KEY_PREFIX;

pub fn cmd_stats(ctx: &Ctx) -> anyhow::Result<i32> {
    let kv = ctx.open_store()?;
    let stats = kv.stats_best_effort()?;
    let line_docs = kv.keys(LINES_KEY_PREFIX)?.len();

    if ctx.json() {
        println!(
            "{}",
            serde_json::json!({
                "db": ctx.cfg.db_path.display().to_string(),
                "memory": ctx.memory,
                "keys": stats.keys,
                "bytes": stats.bytes,
                "lineDocuments": line_docs,
                "lastWriteAt": stats.last_write_at,
                "schemaVersion": stats.version,
            })
        );
        return Ok(exit_codes::OK);
    }

    let db = if ctx.memory {
        "<memory>".to_string()
    } else {
        ctx.cfg.db_path.display().to_string()
    };
    println!("Database: {}", db);
    println!(
        "Schema version: {}",
        stats.version.as_deref().unwrap_or("<unknown>")
    );
    println!(
        "Keys: {}",
        stats.keys.map(|k| k.to_string()).unwrap_or_else(|| "?".into())
    );
    println!("Line documents: {}", line_docs);
    println!(
        "Bytes: {}",
        stats.bytes.map(|b| b.to_string()).unwrap_or_else(|| "?".into())
    );
    println!(
        "Last write: {}",
        stats.last_write_at.as_deref().unwrap_or("never")
    );
    Ok(exit_codes::OK)
}

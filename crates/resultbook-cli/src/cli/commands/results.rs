use super::{exit_codes, Ctx};
use crate::cli::args::{ActivateArgs, AppArgs, ResultArgs, SaveArgs};
use anyhow::Context;
use resultbook_core::mapper::{build_lines_from_authorization, parse_records};
use resultbook_core::view::render_lines;
use resultbook_core::SaveResultRequest;
use std::io::Read;
use std::path::Path;

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input {}", path.display()))
    }
}

pub fn cmd_save(ctx: &Ctx, args: SaveArgs) -> anyhow::Result<i32> {
    let raw = read_input(&args.input)?;
    let records = match parse_records(&raw) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("input error: {}: {:#}", args.input.display(), e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let lines = build_lines_from_authorization(&records);
    let kept = lines.len();
    let dropped = records.len() - kept;

    let mut req = SaveResultRequest::new(args.application_id, lines)
        .with_summer(args.summer)
        .activate(args.activate);
    if let Some(label) = args.label {
        req = req.with_label(label);
    }

    let repo = ctx.open_repo()?;
    let result_id = repo.save_result(req)?;

    if ctx.json() {
        println!(
            "{}",
            serde_json::json!({
                "resultID": result_id,
                "applicationID": args.application_id,
                "lines": kept,
                "dropped": dropped,
                "isActive": args.activate,
            })
        );
    } else {
        println!("{}", result_id);
        eprintln!(
            "saved result {} for application {} ({} line(s), {} zero-unit record(s) dropped)",
            result_id, args.application_id, kept, dropped
        );
    }
    Ok(exit_codes::OK)
}

pub fn cmd_list(ctx: &Ctx, args: AppArgs) -> anyhow::Result<i32> {
    let repo = ctx.open_repo()?;
    let metas = repo.list_results_by_application(args.application_id);

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&metas)?);
        return Ok(exit_codes::OK);
    }

    if metas.is_empty() {
        eprintln!("no results for application {}", args.application_id);
    }
    for m in &metas {
        println!(
            "{:<10}  {}  {:<20}{}{}",
            m.result_id,
            m.created_at.to_rfc3339(),
            m.label.as_deref().unwrap_or("-"),
            if m.has_summer { "  summer" } else { "" },
            if m.is_active { "  (Active)" } else { "" }
        );
    }
    Ok(exit_codes::OK)
}

pub fn cmd_lines(ctx: &Ctx, args: ResultArgs) -> anyhow::Result<i32> {
    let repo = ctx.open_repo()?;
    let lines = repo.get_result_lines(args.result_id);

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else if lines.is_empty() {
        println!("{}", resultbook_core::view::NO_LINES_TEXT);
    } else {
        print!("{}", render_lines(&lines));
    }
    Ok(exit_codes::OK)
}

pub fn cmd_activate(ctx: &Ctx, args: ActivateArgs) -> anyhow::Result<i32> {
    let repo = ctx.open_repo()?;

    let owned = repo
        .get_result(args.result_id)
        .is_some_and(|m| m.application_id == args.application_id);
    if !owned {
        eprintln!(
            "result {} does not belong to application {}",
            args.result_id, args.application_id
        );
        return Ok(exit_codes::NOT_FOUND);
    }

    let changed = repo.set_active(args.application_id, args.result_id)?;
    if ctx.json() {
        println!(
            "{}",
            serde_json::json!({
                "applicationID": args.application_id,
                "resultID": args.result_id,
                "changed": changed,
            })
        );
    } else if changed {
        println!("activated {}", args.result_id);
    } else {
        println!("{} already active", args.result_id);
    }
    Ok(exit_codes::OK)
}

pub fn cmd_active(ctx: &Ctx, args: AppArgs) -> anyhow::Result<i32> {
    let repo = ctx.open_repo()?;
    let active = repo.get_active_result_id(args.application_id);

    if ctx.json() {
        println!(
            "{}",
            serde_json::json!({
                "applicationID": args.application_id,
                "resultID": active,
            })
        );
        return Ok(exit_codes::OK);
    }

    match active {
        Some(id) => {
            println!("{}", id);
            Ok(exit_codes::OK)
        }
        None => {
            eprintln!("no active result for application {}", args.application_id);
            Ok(exit_codes::NOT_FOUND)
        }
    }
}

pub fn cmd_next_id(ctx: &Ctx) -> anyhow::Result<i32> {
    let repo = ctx.open_repo()?;
    println!("{}", repo.next_result_id()?);
    Ok(exit_codes::OK)
}

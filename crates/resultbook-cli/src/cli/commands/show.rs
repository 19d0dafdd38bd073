use super::{exit_codes, Ctx};
use crate::cli::args::ShowArgs;
use resultbook_core::view;

pub fn cmd_show(ctx: &Ctx, args: ShowArgs) -> anyhow::Result<i32> {
    let repo = ctx.open_repo()?;
    let mut panel = view::refresh(&repo, args.application_id);

    if let Some(id) = args.select {
        if !panel.options.iter().any(|o| o.value == id) {
            eprintln!(
                "result {} is not listed for application {}",
                id, args.application_id
            );
            return Ok(exit_codes::NOT_FOUND);
        }
        view::select(&repo, &mut panel, Some(id));
    }

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&panel)?);
    } else {
        print!("{}", view::render_text(&panel));
    }
    Ok(exit_codes::OK)
}

use super::args::*;
use resultbook_core::config::{resolve_config, AppConfig, OutputFormat};
use resultbook_core::{ResultRepository, SqliteKv};

pub mod results;
pub mod show;
pub mod stats;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const NOT_FOUND: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

/// Resolved settings shared by every command.
pub struct Ctx {
    pub cfg: AppConfig,
    pub memory: bool,
}

impl Ctx {
    pub fn from_args(global: &GlobalArgs) -> anyhow::Result<Self> {
        let mut cfg = resolve_config(&global.config).map_err(|e| anyhow::anyhow!(e))?;

        if let Some(db) = &global.db {
            cfg.db_path = db.clone();
        }
        if let Some(level) = &global.log_level {
            cfg.log_level = level.clone();
        }
        if let Some(f) = &global.format {
            cfg.format = OutputFormat::parse(f)
                .ok_or_else(|| anyhow::anyhow!("unknown format '{}' (expected text|json)", f))?;
        }

        Ok(Self {
            cfg,
            memory: global.memory,
        })
    }

    pub fn json(&self) -> bool {
        self.cfg.format == OutputFormat::Json
    }

    pub fn open_store(&self) -> anyhow::Result<SqliteKv> {
        let kv = if self.memory {
            SqliteKv::memory()?
        } else {
            ensure_parent_dir(&self.cfg.db_path)?;
            SqliteKv::open(&self.cfg.db_path)?
        };
        kv.init_schema()?;
        tracing::debug!(
            event = "store.opened",
            db = %self.cfg.db_path.display(),
            memory = self.memory
        );
        Ok(kv)
    }

    pub fn open_repo(&self) -> anyhow::Result<ResultRepository<SqliteKv>> {
        Ok(ResultRepository::new(self.open_store()?))
    }
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    if let Command::Version = cli.cmd {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(exit_codes::OK);
    }

    let ctx = match Ctx::from_args(&cli.global) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    super::logging::init_logging(&ctx.cfg.log_level);

    match cli.cmd {
        Command::Save(args) => results::cmd_save(&ctx, args),
        Command::List(args) => results::cmd_list(&ctx, args),
        Command::Lines(args) => results::cmd_lines(&ctx, args),
        Command::Activate(args) => results::cmd_activate(&ctx, args),
        Command::Active(args) => results::cmd_active(&ctx, args),
        Command::NextId => results::cmd_next_id(&ctx),
        Command::Show(args) => show::cmd_show(&ctx, args),
        Command::Stats => stats::cmd_stats(&ctx),
        Command::Version => Ok(exit_codes::OK),
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

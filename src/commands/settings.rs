//! Configuration command

use super::{CommandResult, Context};

/// Print the effective configuration, optionally writing it to disk
pub fn config(ctx: &Context, init: bool) -> CommandResult {
    let text = toml::to_string_pretty(&ctx.config)?;
    println!("# {}", ctx.config_path.display());
    print!("{}", text);

    if init {
        ctx.config.save(&ctx.config_path)?;
        eprintln!("Wrote {}", ctx.config_path.display());
    }
    Ok(())
}

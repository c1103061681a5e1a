use anyhow::{bail, Context, Result};
use chess_arbiter::board::Color;
use chess_arbiter::console::ConsoleHandler;
use chess_arbiter::game::GameConfig;

fn main() -> Result<()> {
    let config = parse_args(std::env::args().skip(1))?;
    let mut console = ConsoleHandler::new(config)?;
    console.run()
}

/// `--depth <n>` and `--computer <white|black|none>`.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<GameConfig> {
    let mut config = GameConfig::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--depth" => {
                let value = args.next().context("--depth needs a value")?;
                let depth = value
                    .parse::<u32>()
                    .with_context(|| format!("invalid depth: {}", value))?;
                config = config.with_search_depth(depth);
            }
            "--computer" => {
                let value = args.next().context("--computer needs a value")?;
                let computer = match value.as_str() {
                    "none" => None,
                    other => Some(other.parse::<Color>().map_err(anyhow::Error::msg)?),
                };
                config = config.with_computer(computer);
            }
            other => bail!("unknown argument: {}", other),
        }
    }
    Ok(config)
}

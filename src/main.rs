use monster_battle_engine::{run, CliOptions};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: cargo run --release -- [--catalogue DIR|bundle.json] [--encounter encounter.json] \
[--options options.json] [--sims N] [--seed SEED] [--max-turns N] [--show-log]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut catalogue_path = PathBuf::from("catalogue");
    let mut encounter_path = PathBuf::from("encounter.json");
    let mut options_path = None;
    let mut sims = 100usize;
    let mut seed = 0u64;
    let mut max_turns = 200u32;
    let mut show_log = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--catalogue" => {
                catalogue_path = args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--catalogue requires a path (e.g. --catalogue data/)")
                })?;
            }
            "--encounter" => {
                encounter_path = args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--encounter requires a path (e.g. --encounter encounter.json)")
                })?;
            }
            "--options" => {
                options_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--options requires a path (e.g. --options options.json)")
                })?);
            }
            "--sims" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--sims requires a number"))?;
                sims = val.parse()?;
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                seed = val.parse()?;
            }
            "--max-turns" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--max-turns requires a number"))?;
                max_turns = val.parse()?;
            }
            "--show-log" => show_log = true,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    Ok(CliOptions {
        catalogue_path,
        encounter_path,
        options_path,
        sims,
        seed,
        max_turns,
        show_log,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let opts = parse_args()?;
    run(opts)
}

//! `summits` command line tool

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use summits_model::{humanize_amount, Address, Effort};
use summits_store::{
    render_svg, AimNetwork, LedgerSnapshot, MemoryLedger, RenderOptions, Selection, SummitsConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn cli() -> Command {
    Command::new("summits")
        .version(summits_store::VERSION)
        .about("Summits aim network tools")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (TOML)"),
        )
        .subcommand(
            Command::new("render")
                .about("Render a ledger snapshot to SVG")
                .arg(
                    Arg::new("snapshot")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Snapshot JSON file"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file; stdout if omitted"),
                )
                .arg(
                    Arg::new("level")
                        .long("level")
                        .default_value("2")
                        .value_parser(value_parser!(u32))
                        .help("Neighbour rings loaded around the home aim"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Load every aim instead of the home neighbourhood"),
                )
                .arg(
                    Arg::new("min-radius")
                        .long("min-radius")
                        .default_value("10")
                        .value_parser(value_parser!(f64))
                        .help("Smallest drawn aim radius"),
                ),
        )
        .subcommand(
            Command::new("amount")
                .about("Humanize an 18-decimal token amount")
                .arg(
                    Arg::new("value")
                        .required(true)
                        .value_parser(value_parser!(u128))
                        .help("Raw amount"),
                ),
        )
        .subcommand(
            Command::new("effort")
                .about("Parse an effort such as \"2w 3d\"")
                .arg(Arg::new("text").required(true).help("Effort text")),
        )
        .subcommand(Command::new("networks").about("List configured networks"))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summits=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<SummitsConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => SummitsConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SummitsConfig::default()),
    }
}

async fn render(config: SummitsConfig, args: &ArgMatches) -> Result<()> {
    let Some(path) = args.get_one::<PathBuf>("snapshot") else {
        bail!("missing snapshot path");
    };
    let level = args.get_one::<u32>("level").copied().unwrap_or(2);
    let min_radius = args.get_one::<f64>("min-radius").copied().unwrap_or(10.0);

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot = LedgerSnapshot::from_json(&json).context("parsing snapshot")?;
    let addresses: Vec<Address> = snapshot.aims.iter().map(|a| a.address.clone()).collect();
    let has_base = snapshot.base.is_some();

    let fallback: Address = "0x0".parse()?;
    let ledger = Arc::new(MemoryLedger::from_snapshot(snapshot, fallback));
    let network = AimNetwork::new(ledger, config);

    if args.get_flag("all") || !has_base {
        for address in &addresses {
            network.load_aim(address, 0).await?;
        }
    } else {
        network.load_home(level).await?;
    }
    tracing::info!(
        "Loaded {} aims and {} flows",
        network.with_graph(summits_model::Graph::aim_count),
        network.with_graph(summits_model::Graph::flow_count)
    );

    let options = RenderOptions::new().with_min_radius(min_radius);
    let svg = network.with_graph(|graph| render_svg(graph, Selection::None, &options));
    match args.get_one::<PathBuf>("out") {
        Some(out) => {
            std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
            tracing::info!("Wrote {}", out.display());
        }
        None => print!("{svg}"),
    }
    Ok(())
}

fn networks(config: &SummitsConfig) {
    for (key, info) in &config.networks {
        let marker = if *key == config.network { "*" } else { " " };
        println!(
            "{marker} {key:<10} {:<24} chain {} ({}) {}",
            info.name,
            info.chain_id,
            info.chain_id_hex(),
            info.url
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("render", args)) => render(config, args).await?,
        Some(("amount", args)) => {
            let Some(value) = args.get_one::<u128>("value") else {
                bail!("missing amount");
            };
            println!("{}", humanize_amount(*value));
        }
        Some(("effort", args)) => {
            let Some(text) = args.get_one::<String>("text") else {
                bail!("missing effort text");
            };
            let effort: Effort = text.parse()?;
            println!("{effort}");
        }
        Some(("networks", _)) => networks(&config),
        _ => bail!("unknown command"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn parses_render_arguments() {
        let matches = cli()
            .try_get_matches_from(["summits", "render", "net.json", "--level", "1", "--all"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "render");
        assert_eq!(args.get_one::<u32>("level"), Some(&1));
        assert!(args.get_flag("all"));
    }

    #[test]
    fn rejects_malformed_amount() {
        assert!(cli()
            .try_get_matches_from(["summits", "amount", "12abc"])
            .is_err());
    }
}

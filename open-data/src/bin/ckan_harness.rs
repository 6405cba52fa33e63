use std::sync::Arc;

use anyhow::Context;
use clap::{Arg, ArgAction, Command};

use open_data::ckan::portals;
use open_data::harness::{ConsoleReporter, Harness, HarnessOptions};
use open_data::{CkanPortals, ColorHelper, ColorMode, PortalConfig, Tone, logging};

fn build_cli() -> Command {
    Command::new("ckan-harness")
        .about("Integration test suite for the national CKAN portals")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("country")
                .long("country")
                .value_name("CODE")
                .help("Test a single portal (us, uk, au, it, br, lv, si, uy)"),
        )
        .arg(
            Arg::new("fast")
                .long("fast")
                .action(ArgAction::SetTrue)
                .help("Quick run: primary portals only, fewer portals per group"),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .value_name("WHEN")
                .help("Control color output")
                .value_parser(["auto", "always", "never"])
                .default_value("auto"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    logging::init(logging::DEFAULT_DIRECTIVE);

    let mut config = PortalConfig::from_env().context("reading CKAN_* settings")?;
    if let Some(color_str) = matches.get_one::<String>("color") {
        if let Ok(color_mode) = color_str.parse::<ColorMode>() {
            config = config.with_color_mode(color_mode);
        }
    }
    let colors = ColorHelper::new(config.color_mode);
    colored::control::set_override(colors.should_color_stdout());

    let mut options = HarnessOptions::new().with_fast(matches.get_flag("fast"));
    if let Some(country) = matches.get_one::<String>("country") {
        options = match options.with_country(country) {
            Ok(options) => options,
            Err(_) => {
                println!(
                    "{}",
                    colors.line(
                        Tone::Fail,
                        &format!("Invalid country: {}", country.to_lowercase())
                    )
                );
                println!("Valid countries: {}", portals::codes().join(", "));
                std::process::exit(1);
            }
        };
    }

    let api = Arc::new(CkanPortals::new(&config)?);
    let reporter = Arc::new(ConsoleReporter::new(colors));
    let report = Harness::new(api, reporter, options).run().await;

    std::process::exit(report.exit_code());
}

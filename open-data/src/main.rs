use anyhow::Context;
use chrono::NaiveDate;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use open_data::fiscal::{DatasetQuery, DateRange, FiscalDataClient, Series, catalogue};
use open_data::{ColorHelper, ColorMode, Envelope, FiscalDataConfig, Tone, logging};

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD form", value))
}

fn date_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("start-date")
                .long("start-date")
                .value_name("YYYY-MM-DD")
                .help("Earliest record_date to include")
                .value_parser(parse_date),
        )
        .arg(
            Arg::new("end-date")
                .long("end-date")
                .value_name("YYYY-MM-DD")
                .help("Latest record_date to include")
                .value_parser(parse_date),
        )
}

fn endpoint_arg() -> Arg {
    Arg::new("endpoint")
        .help("Endpoint path, e.g. v2/accounting/od/debt_to_penny")
        .value_name("ENDPOINT")
        .required(true)
}

fn build_cli() -> Command {
    Command::new("fiscal-data")
        .about("Query the U.S. Treasury FiscalData API; every command prints a JSON envelope")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("color")
                .long("color")
                .value_name("WHEN")
                .help("Control color output")
                .value_parser(["auto", "always", "never"])
                .default_value("auto")
                .global(true),
        )
        .subcommand(Command::new("catalogue").about("List every known endpoint"))
        .subcommand(
            Command::new("category")
                .about("List endpoints whose category contains NAME")
                .arg(Arg::new("name").value_name("NAME").required(true)),
        )
        .subcommand(date_args(
            Command::new("debt").about("Debt to the penny, most recent first"),
        ))
        .subcommand(date_args(
            Command::new("yields").about("Average interest rates on Treasury securities"),
        ))
        .subcommand(date_args(
            Command::new("monthly").about("Monthly Treasury statement (revenue collections)"),
        ))
        .subcommand(date_args(
            Command::new("interest").about("Interest expense on the public debt"),
        ))
        .subcommand(
            Command::new("dataset")
                .about("Fetch one page of any endpoint")
                .arg(endpoint_arg())
                .arg(
                    Arg::new("fields")
                        .long("fields")
                        .value_name("LIST")
                        .help("Comma-separated fields to return"),
                )
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .value_name("EXPR")
                        .help("Filter such as record_date:gte:2024-01-01"),
                )
                .arg(
                    Arg::new("sort")
                        .long("sort")
                        .value_name("FIELD")
                        .help("Sort field, '-' prefix for descending"),
                )
                .arg(
                    Arg::new("page-size")
                        .long("page-size")
                        .value_name("N")
                        .value_parser(value_parser!(u32).range(1..))
                        .default_value("100"),
                )
                .arg(
                    Arg::new("page-number")
                        .long("page-number")
                        .value_name("N")
                        .value_parser(value_parser!(u32).range(1..))
                        .default_value("1"),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("First few records of an endpoint")
                .arg(endpoint_arg()),
        )
        .subcommand(
            Command::new("search")
                .about("Search the endpoint catalogue by keyword")
                .arg(
                    Arg::new("query")
                        .value_name("QUERY")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(Command::new("test").about("Run the self-test against the live API"))
        .after_help(
            "EXAMPLES:\n\
             \x20 fiscal-data catalogue\n\
             \x20 fiscal-data debt --start-date 2024-01-01\n\
             \x20 fiscal-data dataset v2/accounting/od/debt_to_penny --page-size 10\n\
             \x20 fiscal-data search debt penny",
        )
}

fn date_range(matches: &ArgMatches) -> DateRange {
    DateRange::new(
        matches.get_one::<NaiveDate>("start-date").copied(),
        matches.get_one::<NaiveDate>("end-date").copied(),
    )
}

fn dataset_query(matches: &ArgMatches) -> DatasetQuery {
    let mut query = DatasetQuery::new();
    if let Some(fields) = matches.get_one::<String>("fields") {
        query = query.fields(fields);
    }
    if let Some(filter) = matches.get_one::<String>("filter") {
        query = query.filter(filter);
    }
    if let Some(sort) = matches.get_one::<String>("sort") {
        query = query.sort(sort);
    }
    if let Some(page_size) = matches.get_one::<u32>("page-size") {
        query = query.page_size(*page_size);
    }
    if let Some(page_number) = matches.get_one::<u32>("page-number") {
        query = query.page_number(*page_number);
    }
    query
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing <{}>", id))
}

async fn dispatch(client: &FiscalDataClient, matches: &ArgMatches) -> anyhow::Result<Envelope> {
    let envelope = match matches.subcommand() {
        Some(("catalogue", _)) => catalogue::get_catalogue(),
        Some(("category", sub)) => catalogue::get_datasets_by_category(required(sub, "name")?),
        Some(("debt", sub)) => client.series(Series::DebtToPenny, &date_range(sub)).await,
        Some(("yields", sub)) => client.series(Series::YieldRates, &date_range(sub)).await,
        Some(("monthly", sub)) => client.series(Series::MonthlyStatement, &date_range(sub)).await,
        Some(("interest", sub)) => client.series(Series::InterestExpense, &date_range(sub)).await,
        Some(("dataset", sub)) => {
            client
                .get_dataset_data(required(sub, "endpoint")?, &dataset_query(sub))
                .await
        }
        Some(("summary", sub)) => client.get_dataset_summary(required(sub, "endpoint")?).await,
        Some(("search", sub)) => {
            let query = sub
                .get_many::<String>("query")
                .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            catalogue::search_datasets(&query)
        }
        Some(("test", _)) => client.test_endpoints().await,
        Some((other, _)) => anyhow::bail!("unknown command '{}'", other),
        None => anyhow::bail!("no command given"),
    };
    Ok(envelope)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = build_cli().get_matches();
    logging::init(logging::DEFAULT_DIRECTIVE);

    let mut config = FiscalDataConfig::from_env().context("reading FISCAL_DATA_* settings")?;
    if let Some(color_str) = matches.get_one::<String>("color") {
        if let Ok(color_mode) = color_str.parse::<ColorMode>() {
            config = config.with_color_mode(color_mode);
        }
    }
    let colors = ColorHelper::new(config.color_mode);
    colored::control::set_override(colors.should_color_stdout());

    let client = FiscalDataClient::with_config(config)?;
    let envelope = dispatch(&client, &matches).await?;

    println!("{}", envelope.to_json_pretty()?);

    if let Some(err) = envelope.error() {
        eprintln!("{}", colors.line(Tone::Fail, &err.to_string()));
        std::process::exit(1);
    }
    Ok(())
}

use charthub::config::{self, RequestConfig};
use charthub::errors::{ChartHubError, Result as HubResult};
use charthub::models::range::Interval;
use charthub::providers::yahoo::YahooProvider;
use charthub::services::dashboard::DashboardService;

use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    // 创建基本的命令行应用
    let app = App::new("ChartHub")
        .version("1.0.0")
        .author("ChartHub Team")
        .about("Candlestick charts with moving averages in the terminal");

    // 添加子命令
    let app = app
        .subcommand(
            SubCommand::with_name("chart")
                .about("Fetch data once and render the chart")
                .arg(
                    Arg::with_name("symbol")
                        .short('s')
                        .long("symbol")
                        .value_name("SYMBOL")
                        .help("Ticker symbol to chart (e.g. AAPL)")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("period")
                        .short('p')
                        .long("period")
                        .value_name("PERIOD")
                        .help("Lookback period (1d,5d,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("start")
                        .long("start")
                        .value_name("DATE")
                        .help("Start date (YYYY-MM-DD), requires --end")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("end")
                        .long("end")
                        .value_name("DATE")
                        .help("End date (YYYY-MM-DD), requires --start")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("interval")
                        .short('i')
                        .long("interval")
                        .value_name("INTERVAL")
                        .help("Sampling interval (1m,2m,5m,15m,30m,60m,90m,1h,1d,5d,1wk,1mo,3mo)")
                        .takes_value(true)
                        .default_value("1d"),
                )
                .arg(
                    Arg::with_name("windows")
                        .short('w')
                        .long("windows")
                        .value_name("WINDOWS")
                        .help("Comma separated moving average windows")
                        .takes_value(true)
                        .default_value("10,50,100"),
                )
                .arg(
                    Arg::with_name("log-scale")
                        .long("log-scale")
                        .help("Plot prices on a base-10 logarithmic axis")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("tail")
                        .long("tail")
                        .value_name("ROWS")
                        .help("Number of recent rows to show in the preview table")
                        .takes_value(true)
                        .default_value("10"),
                ),
        )
        .subcommand(
            SubCommand::with_name("watch")
                .about("Render the chart and refresh it on a fixed interval")
                .arg(
                    Arg::with_name("symbol")
                        .short('s')
                        .long("symbol")
                        .value_name("SYMBOL")
                        .help("Ticker symbol to chart (e.g. AAPL)")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("period")
                        .short('p')
                        .long("period")
                        .value_name("PERIOD")
                        .help("Lookback period (1d,5d,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("start")
                        .long("start")
                        .value_name("DATE")
                        .help("Start date (YYYY-MM-DD), requires --end")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("end")
                        .long("end")
                        .value_name("DATE")
                        .help("End date (YYYY-MM-DD), requires --start")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("interval")
                        .short('i')
                        .long("interval")
                        .value_name("INTERVAL")
                        .help("Sampling interval (1m,2m,5m,15m,30m,60m,90m,1h,1d,5d,1wk,1mo,3mo)")
                        .takes_value(true)
                        .default_value("1d"),
                )
                .arg(
                    Arg::with_name("windows")
                        .short('w')
                        .long("windows")
                        .value_name("WINDOWS")
                        .help("Comma separated moving average windows")
                        .takes_value(true)
                        .default_value("10,50,100"),
                )
                .arg(
                    Arg::with_name("log-scale")
                        .long("log-scale")
                        .help("Plot prices on a base-10 logarithmic axis")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("tail")
                        .long("tail")
                        .value_name("ROWS")
                        .help("Number of recent rows to show in the preview table")
                        .takes_value(true)
                        .default_value("10"),
                )
                .arg(
                    Arg::with_name("refresh")
                        .short('r')
                        .long("refresh")
                        .value_name("SECONDS")
                        .help("Refresh interval in seconds (10-3600)")
                        .takes_value(true)
                        .default_value("60"),
                ),
        );

    let matches = app.get_matches();

    let config = if let Some(matches) = matches.subcommand_matches("chart") {
        Some(build_config(matches, false)?)
    } else if let Some(matches) = matches.subcommand_matches("watch") {
        Some(build_config(matches, true)?)
    } else {
        info!("No command specified. Use --help for usage information.");
        None
    };

    if let Some(config) = config {
        if let Err(e) = run(config).await {
            error!("charthub failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

/// 从命令行参数构造并校验请求配置
fn build_config(matches: &ArgMatches, live: bool) -> HubResult<RequestConfig> {
    let symbol = matches.value_of("symbol").unwrap_or_default();
    let range = config::range_from_options(
        matches.value_of("period"),
        matches.value_of("start"),
        matches.value_of("end"),
    )?;

    let interval = matches
        .value_of("interval")
        .unwrap_or("1d")
        .parse::<Interval>()?;
    let windows = parse_windows(matches.value_of("windows").unwrap_or("10,50,100"))?;
    let tail_rows = matches.value_of("tail").unwrap_or("10").parse::<usize>()?;

    let mut config = RequestConfig::new(symbol, range)
        .with_interval(interval)
        .with_windows(windows)
        .with_log_scale(matches.is_present("log-scale"))
        .with_live(live)
        .with_tail_rows(tail_rows);

    if live {
        let refresh_secs = matches.value_of("refresh").unwrap_or("60").parse::<u64>()?;
        config = config.with_refresh_secs(refresh_secs);
    }

    // 任何网络请求前先校验配置
    config.validate()?;

    Ok(config)
}

fn parse_windows(raw: &str) -> HubResult<Vec<usize>> {
    raw.split(',')
        .map(|w| {
            w.trim().parse::<usize>().map_err(|_| {
                ChartHubError::ConfigError(format!("invalid moving average window '{}'", w.trim()))
            })
        })
        .collect()
}

async fn run(config: RequestConfig) -> HubResult<()> {
    let live = config.live;
    info!(
        "Charting {} with {}, interval {}",
        config.symbol, config.range, config.interval
    );

    let provider = Arc::new(YahooProvider::new()?);
    let service = DashboardService::new(config, provider);

    if live {
        service.run_live().await
    } else {
        service.run_once().await
    }
}

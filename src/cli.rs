//! CLI definition and dispatch. Thin glue: build a data port, call the
//! domain, print JSON to stdout. Progress and errors go to stderr.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::alert::{AlertConfig, AlertMonitor};
use crate::domain::decision::DecisionEngine;
use crate::domain::error::TwinError;
use crate::domain::frame::IndicatorFrame;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::simulator::{self, EmaBounce, StrategySimulator};
use crate::domain::twin_state::TwinState;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "markettwin", about = "Stock digital twin: indicators, signals and decisions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the twin-state snapshot for a symbol
    State {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Ask the decision engine about a free-text goal
    Decide {
        #[arg(long)]
        goal: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Replay the EMA-bounce strategy over a symbol's history
    Simulate {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = simulator::DEFAULT_EMA_PERIOD)]
        ema: usize,
        #[arg(long, default_value_t = simulator::DEFAULT_RSI_BUY_BELOW)]
        rsi_buy: f64,
        #[arg(long, default_value_t = 10_000.0)]
        cash: f64,
        /// Replay through a cash-constrained portfolio instead
        #[arg(long)]
        portfolio: bool,
        #[arg(long, default_value_t = 10)]
        shares: u64,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Run the alert monitor
    Monitor {
        /// Alert rules TOML
        #[arg(short, long)]
        config: PathBuf,
        /// Single evaluation pass instead of the polling loop
        #[arg(long)]
        once: bool,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// List symbols available in the data source
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Show the stored date range for a symbol
    Info {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Load CSV files into the SQLite store
    Ingest {
        /// Directory of SYMBOL.csv files
        #[arg(long)]
        data_dir: PathBuf,
        /// Target database path
        #[arg(long)]
        db: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::State {
            symbol,
            config,
            data_dir,
            start,
            end,
        } => run_state(&symbol, config.as_ref(), data_dir.as_ref(), start, end),
        Command::Decide {
            goal,
            config,
            data_dir,
        } => run_decide(&goal, config.as_ref(), data_dir.as_ref()),
        Command::Simulate {
            symbol,
            ema,
            rsi_buy,
            cash,
            portfolio,
            shares,
            config,
            data_dir,
        } => run_simulate(
            &symbol,
            ema,
            rsi_buy,
            cash,
            portfolio,
            shares,
            config.as_ref(),
            data_dir.as_ref(),
        ),
        Command::Monitor {
            config,
            once,
            data_dir,
        } => run_monitor(&config, once, data_dir.as_ref()),
        Command::ListSymbols { config, data_dir } => {
            run_list_symbols(config.as_ref(), data_dir.as_ref())
        }
        Command::Info {
            symbol,
            config,
            data_dir,
        } => run_info(&symbol, config.as_ref(), data_dir.as_ref()),
        Command::Ingest { data_dir, db } => run_ingest(&data_dir, &db),
    }
}

/// `--data-dir` wins over `--config`; the INI picks SQLite via `[sqlite] path`
/// or a CSV directory via `[data] dir`.
fn build_data_port(
    config_path: Option<&PathBuf>,
    data_dir: Option<&PathBuf>,
) -> Result<Box<dyn DataPort>, TwinError> {
    if let Some(dir) = data_dir {
        return Ok(Box::new(CsvAdapter::new(dir.clone())));
    }

    let Some(path) = config_path else {
        return Err(TwinError::ConfigInvalid {
            reason: "a data source is required (--config or --data-dir)".into(),
        });
    };
    let config = FileConfigAdapter::from_file(path)?;

    if config.get_string("sqlite", "path").is_some() {
        #[cfg(feature = "sqlite")]
        {
            use crate::adapters::sqlite_adapter::SqliteAdapter;
            return Ok(Box::new(SqliteAdapter::from_config(&config)?));
        }
        #[cfg(not(feature = "sqlite"))]
        return Err(TwinError::ConfigInvalid {
            reason: "sqlite feature is required for [sqlite] data sources".into(),
        });
    }

    if let Some(dir) = config.get_string("data", "dir") {
        return Ok(Box::new(CsvAdapter::new(PathBuf::from(dir))));
    }

    Err(TwinError::ConfigInvalid {
        reason: format!("{} has neither [sqlite] path nor [data] dir", path.display()),
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), TwinError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fail(err: &TwinError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn run_state(
    symbol: &str,
    config: Option<&PathBuf>,
    data_dir: Option<&PathBuf>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ExitCode {
    let result = (|| -> Result<(), TwinError> {
        let port = build_data_port(config, data_dir)?;
        let bars = port.fetch_ohlcv(symbol, start, end)?;
        let state = TwinState::snapshot(symbol, bars).ok_or_else(|| TwinError::NoData {
            symbol: symbol.to_string(),
        })?;
        print_json(&state)
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_decide(goal: &str, config: Option<&PathBuf>, data_dir: Option<&PathBuf>) -> ExitCode {
    let result = (|| -> Result<(), TwinError> {
        let port = build_data_port(config, data_dir)?;
        let engine = DecisionEngine::new(port.as_ref());
        let outcome = engine.decide(goal)?;
        print_json(&outcome)
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_simulate(
    symbol: &str,
    ema: usize,
    rsi_buy: f64,
    cash: f64,
    portfolio: bool,
    shares: u64,
    config: Option<&PathBuf>,
    data_dir: Option<&PathBuf>,
) -> ExitCode {
    let result = (|| -> Result<(), TwinError> {
        let port = build_data_port(config, data_dir)?;
        let bars = port.fetch_ohlcv(symbol, None, None)?;
        if bars.is_empty() {
            return Err(TwinError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let mut frame = IndicatorFrame::standard(symbol, bars);
        let ema_series = calculate_ema(&frame.bars, ema);
        frame.add(ema_series);
        let strategy = EmaBounce {
            ema_period: ema,
            rsi_buy_below: rsi_buy,
        };

        if portfolio {
            let replayed = simulator::simulate_portfolio(&frame, &strategy, cash, shares)?;
            print_json(&replayed)
        } else {
            let report = StrategySimulator::new(cash).run(&frame, &strategy);
            print_json(&report)
        }
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_monitor(config_path: &PathBuf, once: bool, data_dir: Option<&PathBuf>) -> ExitCode {
    let result = (|| -> Result<(), TwinError> {
        let alert_config = AlertConfig::load(config_path)?;

        let port: Box<dyn DataPort> = if let Some(dir) = data_dir.or(alert_config.data_dir.as_ref())
        {
            Box::new(CsvAdapter::new(dir.clone()))
        } else if let Some(db) = &alert_config.db_path {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                Box::new(SqliteAdapter::open(db)?)
            }
            #[cfg(not(feature = "sqlite"))]
            {
                let _ = db;
                return Err(TwinError::ConfigInvalid {
                    reason: "sqlite feature is required for db_path data sources".into(),
                });
            }
        } else {
            return Err(TwinError::ConfigInvalid {
                reason: "monitor needs a data source (data_dir or db_path)".into(),
            });
        };

        let mut monitor = AlertMonitor::new(&alert_config, port.as_ref())?;
        if once {
            let alerts = monitor.tick()?;
            eprintln!("{} alert(s) dispatched", alerts.len());
            Ok(())
        } else {
            eprintln!(
                "monitoring {} symbol(s) every {}s",
                alert_config.symbols.len(),
                alert_config.check_interval
            );
            monitor.run()
        }
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_list_symbols(config: Option<&PathBuf>, data_dir: Option<&PathBuf>) -> ExitCode {
    let result = (|| -> Result<(), TwinError> {
        let port = build_data_port(config, data_dir)?;
        let symbols = port.list_symbols()?;
        if symbols.is_empty() {
            eprintln!("no symbols found");
        } else {
            for symbol in &symbols {
                println!("{symbol}");
            }
            eprintln!("{} symbol(s) found", symbols.len());
        }
        Ok(())
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_info(symbol: &str, config: Option<&PathBuf>, data_dir: Option<&PathBuf>) -> ExitCode {
    let result = (|| -> Result<(), TwinError> {
        let port = build_data_port(config, data_dir)?;
        match port.get_data_range(symbol)? {
            Some((min, max, count)) => {
                println!("{symbol}: {count} bars, {min} to {max}");
                Ok(())
            }
            None => Err(TwinError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    })();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_ingest(data_dir: &PathBuf, db: &PathBuf) -> ExitCode {
    #[cfg(feature = "sqlite")]
    {
        use crate::adapters::sqlite_adapter::SqliteAdapter;

        let result = (|| -> Result<usize, TwinError> {
            let source = CsvAdapter::new(data_dir.clone());
            let mut sink = SqliteAdapter::open(db)?;
            sink.initialize_schema()?;

            let mut total = 0;
            for symbol in source.list_symbols()? {
                let bars = source.fetch_ohlcv(&symbol, None, None)?;
                eprintln!("{}: {} bars", symbol, bars.len());
                total += bars.len();
                sink.insert_bars(&bars)?;
            }
            Ok(total)
        })();

        match result {
            Ok(total) => {
                eprintln!("ingested {total} bars into {}", db.display());
                ExitCode::SUCCESS
            }
            Err(e) => fail(&e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (data_dir, db);
        eprintln!("error: sqlite feature is required for ingest");
        ExitCode::from(1)
    }
}

use std::env;
use std::fs;
use std::io::{self, Write};

use anyhow::{anyhow, Error};
use clap::{values_t, App, AppSettings, Arg, ArgMatches};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use satlock::{Lit, LitIdx, Session, SessionConfig, Solution, Status};
use satlock_dimacs::DimacsParser;

mod config;

use config::ConfigBuilder;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging() {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .format(format)
        .filter(None, LevelFilter::Info);

    if let Ok(ref env_var) = env::var("SATLOCK_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn app() -> App<'static, 'static> {
    App::new("satlock")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The DIMACS CNF input file to use (stdin if omitted)'")
        .arg_from_usage("[config-file] --config=[FILE] 'Read session options from a TOML file'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("OPTION>=<VALUE")
                .help(
                    "Specify a single session option, see 'satlock -C help' for a list of options.",
                )
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::from_usage("[assume] -a --assume")
                .value_name("LIT")
                .help("Assume a literal for the solve call")
                .multiple(true)
                .number_of_values(1)
                .allow_hyphen_values(true),
        )
        .arg_from_usage("--all 'Enumerate all satisfying assignments'")
        .arg_from_usage(
            "[core-file] --core=[FILE] 'Write a clausal core of an unsatisfiable formula'",
        )
        .arg_from_usage(
            "[compact-trace-file] --compact-trace=[FILE] \
             'Write a binary proof of an unsatisfiable formula'",
        )
        .arg_from_usage(
            "[extended-trace-file] --extended-trace=[FILE] \
             'Write a textual proof of an unsatisfiable formula'",
        )
}

const REPORTS: [&str; 3] = ["core-file", "compact-trace-file", "extended-trace-file"];

fn session_config(matches: &ArgMatches) -> Result<SessionConfig, Error> {
    let mut builder = ConfigBuilder::new();

    if let Some(config_path) = matches.value_of("config-file") {
        builder.merge_file(config_path)?;
    }

    for config_option in values_t!(matches, "config-option", String).unwrap_or_default() {
        builder.merge_str(&config_option)?;
    }

    if REPORTS.iter().any(|&report| matches.is_present(report)) {
        builder.set("enable_trace_generation", true);
    }

    builder.build()
}

fn assumptions(matches: &ArgMatches) -> Result<Vec<Lit>, Error> {
    let mut lits = vec![];
    for value in values_t!(matches, "assume", String).unwrap_or_default() {
        let number: LitIdx = value
            .parse()
            .map_err(|_| anyhow!("invalid literal '{}'", value))?;
        let lit = Lit::try_from_dimacs(number)
            .ok_or_else(|| anyhow!("invalid literal '{}'", value))?;
        lits.push(lit);
    }
    Ok(lits)
}

fn print_solution(solution: &Solution) {
    print!("v");
    for lit in solution.lits() {
        print!(" {}", lit);
    }
    println!(" 0");
}

fn format_lits(lits: &[Lit]) -> String {
    lits.iter()
        .map(|lit| lit.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main_with_err() -> Result<i32, Error> {
    let matches = app().get_matches();

    if values_t!(matches, "config-option", String)
        .unwrap_or_default()
        .iter()
        .any(|option| option == "help")
    {
        print!("{}", SessionConfig::help());
        return Ok(0);
    }

    init_logging();
    info!("This is satlock {}", env!("CARGO_PKG_VERSION"));

    let config = session_config(&matches)?;
    let assumptions = assumptions(&matches)?;

    let formula = match matches.value_of("INPUT") {
        Some(path) => {
            info!("Reading file '{}'", path);
            DimacsParser::parse(fs::File::open(path)?)?
        }
        None => {
            info!("Reading from stdin");
            let stdin = io::stdin();
            let locked_stdin = stdin.lock();
            DimacsParser::parse(locked_stdin)?
        }
    };

    let session = Session::new(config)?;
    session.add_formula(&formula)?;
    info!(
        "{} variables, {} clauses",
        session.variables()?,
        session.added_original_clauses()?
    );

    for &lit in assumptions.iter() {
        session.assume(lit)?;
    }

    let status = if matches.is_present("all") {
        enumerate(&session)?
    } else {
        let (status, solution) = session.solve()?;
        report_status(status);
        if let Some(solution) = solution {
            print_solution(&solution);
        }
        status
    };

    if status == Status::Unsatisfiable {
        if !assumptions.is_empty() {
            println!("c failed assumptions: {}", format_lits(&session.failed_assumptions()?));
        }
        write_reports(&session, &matches)?;
    }

    info!("solve time {:?}", session.elapsed()?);
    session.delete();

    Ok(status.code())
}

fn report_status(status: Status) {
    match status {
        Status::Satisfiable => println!("s SATISFIABLE"),
        Status::Unsatisfiable => println!("s UNSATISFIABLE"),
        Status::Unknown => println!("s UNKNOWN"),
    }
}

/// Print every solution, returning the status as if only the first was asked for.
fn enumerate(session: &Session) -> Result<Status, Error> {
    let mut count = 0;
    for solution in session.solutions() {
        let solution = solution?;
        if count == 0 {
            report_status(Status::Satisfiable);
        }
        print_solution(&solution);
        count += 1;
    }
    info!("{} solutions", count);

    if count > 0 {
        return Ok(Status::Satisfiable);
    }
    let status = session
        .last_status()?
        .ok_or_else(|| anyhow!("no solve call was made"))?;
    report_status(status);
    Ok(status)
}

fn write_reports(session: &Session, matches: &ArgMatches) -> Result<(), Error> {
    if let Some(path) = matches.value_of("core-file") {
        info!("Writing clausal core to file '{}'", path);
        session.write_clausal_core(fs::File::create(path)?)?;
    }
    if let Some(path) = matches.value_of("compact-trace-file") {
        info!("Writing compact trace to file '{}'", path);
        session.write_compact_trace(fs::File::create(path)?)?;
    }
    if let Some(path) = matches.value_of("extended-trace-file") {
        info!("Writing extended trace to file '{}'", path);
        session.write_extended_trace(fs::File::create(path)?)?;
    }
    Ok(())
}

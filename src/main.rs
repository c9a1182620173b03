use std::path::PathBuf;
use std::process;

use clap::{Arg, ArgAction, Command};
use log::Level;

use logprobe::{Probe, ProbeError};

// the fourth Nagios code, used for everything that is not a scan verdict
const UNKNOWN: i32 = 3;

fn cli() -> Command {
    Command::new("logprobe")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Incremental, rotation-aware log-monitoring probe")
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .required(true)
                .help("Directory holding the cursor sidecar files"),
        )
        .arg(
            Arg::new("rotation-pattern")
                .long("rotation-pattern")
                .value_name("REGEX")
                .required(true)
                .help("Pattern matched against basenames of rotated siblings"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Explicit path of the current log"),
        )
        .arg(
            Arg::new("log-prefix")
                .long("log-prefix")
                .value_name("GLOB")
                .help("Glob used to discover the current log when --log-file is not given"),
        )
        .arg(
            Arg::new("warning-pattern")
                .long("warning-pattern")
                .value_name("REGEX")
                .help("Lines matching this raise the status to WARNING"),
        )
        .arg(
            Arg::new("critical-pattern")
                .long("critical-pattern")
                .value_name("REGEX")
                .help("Lines matching this raise the status to CRITICAL"),
        )
        .arg(
            Arg::new("ok-pattern")
                .long("ok-pattern")
                .value_name("REGEX")
                .help("Lines matching this clear previously accumulated errors"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .help("Probe diagnostics on stderr"),
        )
}

fn main() {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        Level::Debug
    } else {
        Level::Warn
    };
    simple_logger::init_with_level(level).ok();

    let probe = Probe::builder(
        matches.get_one::<String>("cache-dir").unwrap(/* required */),
        matches.get_one::<String>("rotation-pattern").unwrap(/* required */).as_str(),
    )
    .o_log_file(matches.get_one::<String>("log-file").map(PathBuf::from))
    .o_log_prefix(matches.get_one::<String>("log-prefix").cloned())
    .o_warning_pattern(matches.get_one::<String>("warning-pattern").cloned())
    .o_critical_pattern(matches.get_one::<String>("critical-pattern").cloned())
    .o_ok_pattern(matches.get_one::<String>("ok-pattern").cloned())
    .build();

    let probe = match probe {
        Ok(probe) => probe,
        Err(e) => exit_unknown(&e),
    };

    match probe.run() {
        Ok(outcome) => {
            println!(
                "LOG {} - {} critical, {} warning in {} lines",
                outcome.severity,
                outcome.tally.criticals,
                outcome.tally.warnings,
                outcome.tally.lines
            );
            process::exit(outcome.severity.exit_code());
        }
        Err(e) => exit_unknown(&e),
    }
}

// the status line goes to stdout even on failure, since that is what the
// invoking agent displays
fn exit_unknown(err: &ProbeError) -> ! {
    println!("LOG UNKNOWN - {err}");
    process::exit(UNKNOWN);
}

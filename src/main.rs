use std::{env, error, fs, io::Read, path::PathBuf, process};

use emu::vmu::{Vmu, VmuConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: vmu <bios> <flash> [--hle] [--entry ADDR] [--steps N] [--debug] [--log-file]";

/// Where log lines go: the console, or a file in the temp directory.
#[derive(Copy, Clone, PartialEq, Eq)]
enum LogKind {
    Stdout,
    File,
}

struct Args {
    bios: Option<String>,
    flash: Option<String>,
    config: VmuConfig,
    steps: Option<u64>,
    debug: bool,
    log_kind: LogKind,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        bios: None,
        flash: None,
        config: VmuConfig::default(),
        steps: None,
        debug: false,
        log_kind: LogKind::Stdout,
    };
    let mut positional = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--hle" => parsed.config.hle = true,
            "--debug" => parsed.debug = true,
            "--log-file" => parsed.log_kind = LogKind::File,
            "--steps" => {
                let value = args.next().ok_or("--steps needs a value")?;
                parsed.steps = Some(value.parse().map_err(|e| format!("--steps: {e}"))?);
            }
            "--entry" => {
                let value = args.next().ok_or("--entry needs a value")?;
                let value = value.trim_start_matches("0x");
                parsed.config.hle_entry =
                    u16::from_str_radix(value, 16).map_err(|e| format!("--entry: {e}"))?;
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            other => positional.push(other.to_owned()),
        }
    }

    let mut positional = positional.into_iter();
    parsed.bios = positional.next();
    parsed.flash = positional.next();

    Ok(parsed)
}

fn init_logging(kind: LogKind) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match kind {
        LogKind::Stdout => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
        LogKind::File => {
            let dir: PathBuf = env::temp_dir();
            let appender = tracing_appender::rolling::never(&dir, "vmu.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            println!("Logging to file: {:?}", dir.join("vmu.log"));
            Some(guard)
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn main() {
    println!("vmu v{}", env!("CARGO_PKG_VERSION"));

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            println!("{e}\n{USAGE}");
            process::exit(1);
        }
    };

    let _guard = init_logging(args.log_kind);

    let bios = match args.bios.as_deref().filter(|name| *name != "-") {
        Some(name) => load(name),
        None if args.config.hle => Vec::new(),
        None => {
            println!("no BIOS given :(\n{USAGE}");
            process::exit(1);
        }
    };
    let flash = args.flash.as_deref().map(load).unwrap_or_default();

    let mut vmu = match Vmu::new(bios, &flash, args.config) {
        Ok(vmu) => vmu,
        Err(e) => {
            tracing::error!("{e}");
            process::exit(3);
        }
    };
    vmu.set_debug(args.debug);

    let cycles = match args.steps {
        Some(steps) => (0..steps).map(|_| u64::from(vmu.step())).sum(),
        None => vmu.run_cycles(args.config.frequency as u64),
    };

    tracing::info!(
        "ran {} instructions in {cycles} cycles, PC = {:04X}",
        vmu.cpu.instruction_count(),
        vmu.cpu.program_counter()
    );

    let pending: Vec<_> = vmu.interrupts.borrow().pending().collect();
    if !pending.is_empty() {
        tracing::info!("interrupts still pending: {pending:?}");
    }
    if let Some(hz) = vmu.buzzer.borrow().frequency(vmu.cpu.frequency()) {
        tracing::info!("buzzer on at {hz:.1} Hz");
    }
}

fn load(name: &str) -> Vec<u8> {
    tracing::info!("loading {name}");
    match read_file(name) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!("{name}: {e}");
            process::exit(2);
        }
    }
}

fn read_file(filepath: &str) -> Result<Vec<u8>, Box<dyn error::Error>> {
    let mut f = fs::File::open(filepath)?;
    let mut buf = vec![];
    f.read_to_end(&mut buf)?;

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(line: &str) -> Result<Args, String> {
        parse_args(line.split_whitespace().map(String::from))
    }

    #[test]
    fn positional_and_flags() {
        let parsed = args("bios.bin game.vms --hle --entry 0x0130 --steps 10 --log-file").unwrap();
        assert_eq!(parsed.bios.as_deref(), Some("bios.bin"));
        assert_eq!(parsed.flash.as_deref(), Some("game.vms"));
        assert!(parsed.config.hle);
        assert_eq!(parsed.config.hle_entry, 0x0130);
        assert_eq!(parsed.steps, Some(10));
        assert!(parsed.log_kind == LogKind::File);
    }

    #[test]
    fn rejects_unknown_option() {
        assert!(args("bios.bin --turbo").is_err());
        assert!(args("bios.bin --steps").is_err());
    }
}

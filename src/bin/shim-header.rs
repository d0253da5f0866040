//! Emit the C interface of a backend for the binding generator.
//!
//! Usage:
//!   shim-header header --backend chibi [--out shim.h]
//!   shim-header symbols --backend guile
//!   shim-header read --backend chibi '(1 . 2)'
//!
//! Logging is controlled by `SCHEME_SHIM_LOG` (an `EnvFilter` directive).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use scheme_shim::chibi::util::form_to_string;
use scheme_shim::chibi::{Chibi, ChibiContext};
use scheme_shim::guile::{object_to_string, with_guile, GuileBackend};
use scheme_shim::model::{write_header, Backend};
use scheme_shim::ShimError;

#[derive(Parser, Debug)]
#[command(name = "shim-header")]
#[command(about = "Describe the exported functions of a scheme-shim backend")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a C header declaring every export
    Header {
        #[arg(long, value_enum)]
        backend: BackendName,
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List exported symbol names, one per line
    Symbols {
        #[arg(long, value_enum)]
        backend: BackendName,
    },
    /// Read one datum and print it back with its kind
    Read {
        #[arg(long, value_enum)]
        backend: BackendName,
        text: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendName {
    Chibi,
    Guile,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("SCHEME_SHIM_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn,scheme_shim=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn header<B: Backend>(out: Option<PathBuf>) -> Result<(), ShimError> {
    match out {
        Some(path) => {
            let mut file = BufWriter::new(File::create(&path)?);
            write_header::<B, _>(&mut file)?;
            file.flush()?;
            info!("wrote {} declarations to {}", B::exports().len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            write_header::<B, _>(&mut stdout.lock())?;
        }
    }
    Ok(())
}

fn symbols<B: Backend>() -> Result<(), ShimError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for export in B::exports() {
        writeln!(out, "{}", export.name)?;
    }
    Ok(())
}

fn read(backend: BackendName, text: &str) -> Result<(), ShimError> {
    let (printed, kind) = match backend {
        BackendName::Chibi => {
            let ctx = ChibiContext::new()?;
            let obj = ctx.read_str(text)?;
            (form_to_string(obj), Chibi::kind_of(obj))
        }
        BackendName::Guile => with_guile(|g| {
            g.read_string(text)
                .map(|obj| (object_to_string(obj), GuileBackend::kind_of(obj)))
        })??,
    };
    println!("{}\t{}", printed, kind);
    Ok(())
}

fn main() {
    init_logging();

    let args = Args::parse();
    let res = match args.command {
        Command::Header { backend, out } => match backend {
            BackendName::Chibi => header::<Chibi>(out),
            BackendName::Guile => header::<GuileBackend>(out),
        },
        Command::Symbols { backend } => match backend {
            BackendName::Chibi => symbols::<Chibi>(),
            BackendName::Guile => symbols::<GuileBackend>(),
        },
        Command::Read { backend, text } => read(backend, &text),
    };

    if let Err(err) = res {
        error!("{}", err);
        process::exit(1);
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pasm::error::{Error, FatalError};

/// Assembles `.as` source files for the 15-bit word target.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base names (no extension) of the `.as` files to assemble.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory to write `.am`/`.ob`/`.ent`/`.ext` files into.
    /// Defaults to alongside each input.
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Raise the log verbosity.
    #[arg(short, long)]
    verbose: bool,

    /// Keep the `.am` intermediate even when assembly fails.
    #[arg(long, default_value_t = true)]
    keep_expanded: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut any_failed = false;

    for base in &args.inputs {
        match assemble_one(base, args.out_dir.as_deref(), args.keep_expanded) {
            Ok(succeeded) => any_failed |= !succeeded,
            Err(Error::Fatal(err)) => {
                tracing::error!("{}", err);
                eprintln!("--- Fatal error: {} ---", err);
                return ExitCode::FAILURE;
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn sibling(base: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let file_name = base.file_name().map(PathBuf::from).unwrap_or_else(|| base.to_path_buf());
    let mut path = out_dir.map(Path::to_path_buf).unwrap_or_else(|| {
        base.parent().map(Path::to_path_buf).unwrap_or_default()
    });
    path.push(file_name);
    path.set_extension(extension);
    path
}

/// Assembles one base name through the full pipeline, writing whichever
/// artifacts the input earns. Returns `Ok(true)` on full success,
/// `Ok(false)` when the file produced diagnostics (non-fatal), and
/// `Err` only for resource failures.
fn assemble_one(base: &Path, out_dir: Option<&Path>, keep_expanded: bool) -> Result<bool, Error> {
    let span = tracing::info_span!("assemble", file = %base.display());
    let _guard = span.enter();

    let source_path = base.with_extension("as");
    let source = match fs::read_to_string(&source_path) {
        Ok(s) => s,
        Err(_) => {
            println!("--- file {} does not exist ---", source_path.display());
            return Ok(false);
        }
    };

    let output = pasm::assemble(&source);

    let am_path = sibling(base, out_dir, "am");
    if keep_expanded || output.artifacts.is_some() {
        fs::write(&am_path, &output.expanded).map_err(|source| {
            Error::Fatal(FatalError::Io { path: am_path.clone(), source })
        })?;
    }

    for diag in output.diagnostics.iter() {
        println!("--- {}, {} ---", source_path.display(), diag);
    }

    match output.artifacts {
        Some(artifacts) => {
            let ob_path = sibling(base, out_dir, "ob");
            fs::write(&ob_path, &artifacts.object)
                .map_err(|source| Error::Fatal(FatalError::Io { path: ob_path, source }))?;

            if let Some(entries) = artifacts.entries {
                let ent_path = sibling(base, out_dir, "ent");
                fs::write(&ent_path, &entries)
                    .map_err(|source| Error::Fatal(FatalError::Io { path: ent_path, source }))?;
            }
            if let Some(externals) = artifacts.externals {
                let ext_path = sibling(base, out_dir, "ext");
                fs::write(&ext_path, &externals)
                    .map_err(|source| Error::Fatal(FatalError::Io { path: ext_path, source }))?;
            }
            tracing::info!("assembled successfully");
            Ok(true)
        }
        None => {
            println!("--- no object file produced for {} ---", base.display());
            Ok(false)
        }
    }
}

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
mod auth;
use sealfile::batch::{self, JobReport};
use sealfile::container::{Container, HEADER_LEN};
use sealfile::crypto::TAG_LEN;
use sealfile::digest::{self, HashAlgorithm};
use sealfile::files::Job;
use sealfile::{FileCipher, Storage, caesar};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sealfile")]
#[command(
    version,
    about = "Password-based file encryption with AES-256-GCM and PBKDF2."
)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log filter directive, e.g. `sealfile=debug` (overrides -v)
    #[arg(long, global = true, value_name = "FILTER", env = "SEALFILE_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct FileArgs {
    /// Files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output path (only with a single input file)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Overwrite existing output files
    #[arg(short, long, default_value_t = false)]
    force: bool,
}

impl FileArgs {
    fn jobs(&self) -> Result<Vec<Job>> {
        if self.output.is_some() && self.files.len() > 1 {
            bail!("--output can only be used with a single input file");
        }

        Ok(self
            .files
            .iter()
            .map(|f| Job {
                input: f.clone(),
                output: self.output.clone(),
            })
            .collect())
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encrypts files, writing `<file>.enc`
    #[command(arg_required_else_help = true)]
    Encrypt {
        #[command(flatten)]
        args: FileArgs,
    },

    /// Decrypts files, stripping `.enc` from the name
    #[command(arg_required_else_help = true)]
    Decrypt {
        #[command(flatten)]
        args: FileArgs,
    },

    /// Shows the salt, nonce and ciphertext size of an encrypted file
    #[command(arg_required_else_help = true)]
    Inspect {
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Computes a SHA-1 or SHA-2 digest of a file or text
    #[command(arg_required_else_help = true)]
    Hash {
        /// sha1, sha256, sha384 or sha512
        algorithm: HashAlgorithm,

        /// File to hash
        #[arg(required_unless_present = "text")]
        file: Option<PathBuf>,

        /// Hash this text instead of a file
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        /// Expected digest; exits with status 1 on mismatch
        #[arg(long, value_name = "HEX")]
        compare: Option<String>,
    },

    /// Applies a Caesar shift to text
    #[command(arg_required_else_help = true)]
    Caesar {
        /// Places to rotate each letter (negative rotates back)
        #[arg(short, long, allow_negative_numbers = true)]
        shift: i32,

        text: String,
    },
}

#[derive(Serialize)]
struct InspectReport {
    file: String,
    size: usize,
    salt: String,
    nonce: String,
    ciphertext_len: usize,
    plaintext_len: Option<usize>,
}

/// `--log` (or `SEALFILE_LOG`) wins over `-v`; a bad directive is an error.
fn init_tracing(verbose: u8, log: Option<&str>) -> Result<()> {
    let filter = match (log, verbose) {
        (Some(directive), _) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{directive}'"))?,
        (None, 0) => EnvFilter::new("warn"),
        (None, 1) => EnvFilter::new("sealfile=info"),
        (None, _) => EnvFilter::new("sealfile=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
    Ok(())
}

fn print_reports(reports: &[JobReport], verb: &str) -> ExitCode {
    let mut failed = false;
    for report in reports {
        match &report.result {
            Ok(out) => println!("{verb} {} -> {}", report.input.display(), out.display()),
            Err(e) => {
                failed = true;
                eprintln!("error: {e:#}");
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();
    init_tracing(args.verbose, args.log.as_deref())?;

    match args.command {
        Commands::Encrypt { args } => {
            let jobs = args.jobs()?;
            let password = auth::read_password(true)?;
            let reports = batch::encrypt_files(&FileCipher::new(), &jobs, &password, args.force);
            Ok(print_reports(&reports, "encrypted"))
        }
        Commands::Decrypt { args } => {
            let jobs = args.jobs()?;
            let password = auth::read_password(false)?;
            let reports = batch::decrypt_files(&FileCipher::new(), &jobs, &password, args.force);
            Ok(print_reports(&reports, "decrypted"))
        }
        Commands::Inspect { file, json } => {
            let data = Storage::new(&file).load()?;
            let container = Container::decode(&data)
                .with_context(|| format!("{} is not an encrypted file", file.display()))?;

            let report = InspectReport {
                file: file.display().to_string(),
                size: data.len(),
                salt: hex::encode(container.salt()),
                nonce: hex::encode(container.nonce()),
                ciphertext_len: container.ciphertext().len(),
                plaintext_len: container.ciphertext().len().checked_sub(TAG_LEN),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("file:       {}", report.file);
                println!("size:       {} bytes ({HEADER_LEN} header)", report.size);
                println!("salt:       {}", report.salt);
                println!("nonce:      {}", report.nonce);
                println!("ciphertext: {} bytes", report.ciphertext_len);
                match report.plaintext_len {
                    Some(len) => println!("plaintext:  {len} bytes"),
                    None => println!("plaintext:  invalid (shorter than the {TAG_LEN}-byte tag)"),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Hash {
            algorithm,
            file,
            text,
            compare,
        } => {
            let data = match (text, file) {
                (Some(text), _) => text.into_bytes(),
                (None, Some(file)) => Storage::new(file).load()?,
                (None, None) => bail!("either a file or --text is required"),
            };
            tracing::debug!(%algorithm, bytes = data.len(), "hashing");
            let hash = digest::digest_hex(algorithm, &data);
            println!("{hash}");

            match compare {
                Some(expected) if digest::matches_digest(&hash, &expected) => {
                    println!("match");
                    Ok(ExitCode::SUCCESS)
                }
                Some(_) => {
                    println!("mismatch");
                    Ok(ExitCode::FAILURE)
                }
                None => Ok(ExitCode::SUCCESS),
            }
        }
        Commands::Caesar { shift, text } => {
            println!("{}", caesar::caesar_shift(&text, shift));
            Ok(ExitCode::SUCCESS)
        }
    }
}

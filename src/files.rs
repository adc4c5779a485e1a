//! Encrypting and decrypting files on disk.

use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Entropy, FileCipher, Storage};

/// Suffix appended to encrypted files.
pub const ENCRYPTED_SUFFIX: &str = ".enc";
/// Prefix used for decrypted files whose name lacks [`ENCRYPTED_SUFFIX`].
pub const DECRYPTED_PREFIX: &str = "decrypted_";

/// One file to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    /// Explicit destination; derived from `input` when `None`.
    pub output: Option<PathBuf>,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// `report.pdf` becomes `report.pdf.enc`.
pub fn encrypted_path(input: &Path) -> Result<PathBuf> {
    let mut name = file_name(input)?.to_os_string();
    name.push(ENCRYPTED_SUFFIX);
    Ok(input.with_file_name(name))
}

/// `report.pdf.enc` becomes `report.pdf`; any other name gets
/// [`DECRYPTED_PREFIX`] prepended.
pub fn decrypted_path(input: &Path) -> Result<PathBuf> {
    let name = file_name(input)?;

    let stripped = name
        .to_str()
        .and_then(|s| s.strip_suffix(ENCRYPTED_SUFFIX))
        .filter(|s| !s.is_empty());

    let out_name = match stripped {
        Some(s) => OsString::from(s),
        None => {
            let mut prefixed = OsString::from(DECRYPTED_PREFIX);
            prefixed.push(name);
            prefixed
        }
    };

    Ok(input.with_file_name(out_name))
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .with_context(|| format!("{} is not a file path", path.display()))
}

/// Where [`encrypt_file`] writes `job`.
pub fn encrypt_target(job: &Job) -> Result<PathBuf> {
    match &job.output {
        Some(p) => Ok(p.clone()),
        None => encrypted_path(&job.input),
    }
}

/// Where [`decrypt_file`] writes `job`.
pub fn decrypt_target(job: &Job) -> Result<PathBuf> {
    match &job.output {
        Some(p) => Ok(p.clone()),
        None => decrypted_path(&job.input),
    }
}

/// Encrypts `job.input` and writes the container next to it (or to
/// `job.output`). Returns the path written.
///
/// Without `overwrite` an existing output is never replaced, even one
/// that appears while the key is being derived.
pub fn encrypt_file<E: Entropy>(
    cipher: &FileCipher<E>,
    job: &Job,
    password: &str,
    overwrite: bool,
) -> Result<PathBuf> {
    let target = prepare_target(&job.input, &encrypt_target(job)?, overwrite)?;

    let plaintext = zeroize::Zeroizing::new(Storage::new(&job.input).load()?);
    debug!(input = %job.input.display(), bytes = plaintext.len(), "encrypting");

    let container = cipher
        .encrypt(&plaintext, password)
        .with_context(|| format!("cannot encrypt {}", job.input.display()))?;
    write_target(&target, &container, overwrite)?;

    info!(input = %job.input.display(), output = %target.path().display(), "encrypted");
    Ok(target.path().to_path_buf())
}

/// Decrypts `job.input` and writes the plaintext next to it (or to
/// `job.output`). Returns the path written.
///
/// Nothing is written when decryption fails.
pub fn decrypt_file<E: Entropy>(
    cipher: &FileCipher<E>,
    job: &Job,
    password: &str,
    overwrite: bool,
) -> Result<PathBuf> {
    let target = prepare_target(&job.input, &decrypt_target(job)?, overwrite)?;

    let container = Storage::new(&job.input).load()?;
    debug!(input = %job.input.display(), bytes = container.len(), "decrypting");

    let plaintext = cipher
        .decrypt(&container, password)
        .with_context(|| format!("cannot decrypt {}", job.input.display()))?;
    write_target(&target, &plaintext, overwrite)?;

    info!(input = %job.input.display(), output = %target.path().display(), "decrypted");
    Ok(target.path().to_path_buf())
}

fn write_target(target: &Storage, data: &[u8], overwrite: bool) -> Result<()> {
    if overwrite {
        target.save(data)
    } else {
        target.save_new(data).with_context(|| {
            format!(
                "{} was not written (use --force to overwrite)",
                target.path().display()
            )
        })
    }
}

fn prepare_target(input: &Path, output: &Path, overwrite: bool) -> Result<Storage> {
    if !input.is_file() {
        bail!("{} is not a readable file", input.display());
    }

    let target = Storage::new(output);
    if target.exists() {
        if fs::canonicalize(input)? == fs::canonicalize(output)? {
            bail!("refusing to overwrite input file {}", input.display());
        }
        if !overwrite {
            bail!(
                "{} already exists (use --force to overwrite)",
                output.display()
            );
        }
    }

    Ok(target)
}

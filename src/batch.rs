//! Processing many files in parallel.
//!
//! Each job derives its own key from its own salt, so jobs share
//! nothing but the password and run on the rayon pool without
//! coordination. A failing job does not stop the others.
//!
//! Outputs are resolved before anything runs: jobs that would write the
//! same file are all rejected, so no two workers ever race on a path.

use anyhow::{Result, bail};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::files::{self, Job};
use crate::{Entropy, FileCipher};

/// Outcome of one job.
#[derive(Debug)]
pub struct JobReport {
    pub input: PathBuf,
    /// Path written on success.
    pub result: Result<PathBuf>,
}

impl JobReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Encrypts every job. Reports come back in the order of `jobs`.
pub fn encrypt_files<E: Entropy>(
    cipher: &FileCipher<E>,
    jobs: &[Job],
    password: &str,
    overwrite: bool,
) -> Vec<JobReport> {
    let planned = plan(jobs, files::encrypt_target);
    run(jobs, planned, |job| {
        files::encrypt_file(cipher, job, password, overwrite)
    })
}

/// Decrypts every job. Reports come back in the order of `jobs`.
pub fn decrypt_files<E: Entropy>(
    cipher: &FileCipher<E>,
    jobs: &[Job],
    password: &str,
    overwrite: bool,
) -> Vec<JobReport> {
    let planned = plan(jobs, files::decrypt_target);
    run(jobs, planned, |job| {
        files::decrypt_file(cipher, job, password, overwrite)
    })
}

/// Pins every job to its output, failing the jobs whose output is
/// shared with another job.
fn plan(jobs: &[Job], target: fn(&Job) -> Result<PathBuf>) -> Vec<Result<Job>> {
    let outputs: Vec<Result<(PathBuf, PathBuf)>> = jobs
        .iter()
        .map(|job| {
            let output = target(job)?;
            let key = output_key(&output);
            Ok((output, key))
        })
        .collect();

    let mut claims: HashMap<PathBuf, usize> = HashMap::new();
    for (_, key) in outputs.iter().flatten() {
        *claims.entry(key.clone()).or_default() += 1;
    }

    jobs.iter()
        .zip(outputs)
        .map(|(job, resolved)| {
            let (output, key) = resolved?;
            if claims.get(&key).copied().unwrap_or(0) > 1 {
                bail!("{} is the output of more than one input", output.display());
            }
            Ok(job.clone().with_output(output))
        })
        .collect()
}

/// Identity of an output path: its existing parent directory resolved,
/// so `./out` and `dir/../out` compare equal.
fn output_key(path: &Path) -> PathBuf {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

fn run<F>(jobs: &[Job], planned: Vec<Result<Job>>, op: F) -> Vec<JobReport>
where
    F: Fn(&Job) -> Result<PathBuf> + Sync,
{
    jobs.par_iter()
        .zip(planned)
        .map(|(job, planned)| {
            let result = planned.and_then(|job| op(&job));
            if let Err(e) = &result {
                debug!(input = %job.input.display(), "{e:#}");
            }
            JobReport {
                input: job.input.clone(),
                result,
            }
        })
        .collect()
}

// src/runner.rs
//! Entry-point wrapper shared by the programs built on this crate

use crate::cli::{OptionBag, Options, UsageError};
use crate::config::Settings;
use crate::context::ScanContext;
use crate::logging;
use std::ffi::OsString;
use std::future::Future;
use tracing::{debug, error};

/// Why a run did not complete
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Usage(e) => e.exit_code(),
            RunError::Failed(_) => 1,
        }
    }
}

/// Command-line arguments as strings; bytes that aren't UTF-8 become U+FFFD
pub fn lossy_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

/// Log an error with its full cause chain
pub fn notify(err: &anyhow::Error) {
    error!("{:?}", err);
}

/// Parse options, set up logging and the run context, then call `method`.
///
/// Usage errors come back before `method` runs. Errors from `method` are
/// logged through [`notify`] and returned, so the caller picks the exit
/// code.
pub async fn run<I, S, F, Fut, T>(argv: I, additional: OptionBag, method: F) -> Result<T, RunError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    F: FnOnce(Options, ScanContext) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let options = Options::from_args_with(argv, additional)?;

    let level = logging::resolve_level(options.debug(), options.log())?;
    logging::configure_logging(level);
    debug!("Running with {:?}", options);

    run_method(options, method).await.map_err(|e| {
        notify(&e);
        RunError::Failed(e)
    })
}

async fn run_method<F, Fut, T>(options: Options, method: F) -> anyhow::Result<T>
where
    F: FnOnce(Options, ScanContext) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut settings = Settings::load(options.config_path())?;
    if let Some(timeout) = options.timeout() {
        settings.command_timeout_secs = Some(timeout);
    }

    let ctx = ScanContext::new(options.output_dir(), settings)?;
    method(options, ctx).await
}

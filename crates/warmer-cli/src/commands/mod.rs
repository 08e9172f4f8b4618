pub mod handle;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;

use warmer::Warmer;
use warmer_core::{DispatchConfig, SelfFunction};
use warmer_invoke::RemoteInvoker;

/// Options shared by every command that runs the warmer.
#[derive(Args, Debug, Clone, Default)]
pub struct WarmerArgs {
    /// Warmer config file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Name of this function (default: $AWS_LAMBDA_FUNCTION_NAME).
    #[arg(long)]
    pub function_name: Option<String>,
    /// Version of this function (default: $AWS_LAMBDA_FUNCTION_VERSION or $LATEST).
    #[arg(long)]
    pub function_version: Option<String>,
    /// Delay in milliseconds for fanned-out instances.
    #[arg(long)]
    pub delay: Option<u64>,
    /// Do not emit the warmer log record.
    #[arg(long)]
    pub no_log: bool,
    /// Upper bound for a single invocation, in milliseconds.
    #[arg(long, default_value = "30000")]
    pub timeout_ms: u64,
}

impl WarmerArgs {
    /// Config file (if any) with command-line overrides applied.
    pub fn dispatch_config(&self) -> anyhow::Result<DispatchConfig> {
        let mut config = match &self.config {
            Some(path) => DispatchConfig::from_file(path)?,
            None => DispatchConfig::default(),
        };
        if let Some(delay) = self.delay {
            config.delay_ms = delay;
        }
        if self.no_log {
            config.logging_enabled = false;
        }
        Ok(config)
    }

    pub fn self_function(&self) -> SelfFunction {
        let mut function = SelfFunction::from_env();
        if let Some(name) = &self.function_name {
            function.name = name.clone();
        }
        if let Some(version) = &self.function_version {
            function.version = version.clone();
        }
        function
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn build_warmer(&self, invoker: Arc<dyn RemoteInvoker>) -> anyhow::Result<Warmer> {
        Ok(Warmer::new(self.self_function(), invoker).with_config(self.dispatch_config()?))
    }
}

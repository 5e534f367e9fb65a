/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::context
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Carry configuration, logger, dry-run mode, and the host
    handle into every component as one explicit object.

  Security / Safety Notes:
    Dry-run is decided once at startup and is read-only for the
    rest of the invocation; there is no other process-wide
    mutable state.

  Dependencies:
    None beyond sibling modules.

  Operational Scope:
    Constructed in main after CLI parsing; components borrow it
    for the life of a subcommand.

  Revision History:
    2025-11-19 COD  Introduced explicit execution context.
  ------------------------------------------------------------
  SSE Principles Observed:
    - No ambient globals; dependencies passed explicitly
    - Dry-run enforced at the single mutation gateway
    - Soft failures modelled as values, not errors
============================================================*/

use std::sync::Arc;

use crate::config::SynPhiConfig;
use crate::error::Result;
use crate::host::{Host, RunOutput};
use crate::logger::Logger;

/// Tri-state outcome of an individual external operation. Hard
/// failures abort the command and travel as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    Success,
    SoftFailure(String),
}

impl OpOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OpOutcome::Success)
    }
}

/// Execution context shared by every component of one invocation.
pub struct Context {
    pub config: SynPhiConfig,
    pub logger: Logger,
    pub dry_run: bool,
    pub host: Arc<dyn Host>,
}

impl Context {
    pub fn new(
        config: SynPhiConfig,
        logger: Logger,
        dry_run: bool,
        host: Arc<dyn Host>,
    ) -> Self {
        Self {
            config,
            logger,
            dry_run,
            host,
        }
    }

    /// Run a read-only probe. Executes even in dry-run mode.
    pub async fn probe(&self, program: &str, args: &[String]) -> Result<RunOutput> {
        self.logger
            .debug("EXEC", format!("Probing: {}", render(program, args)));
        self.host.run(program, args).await
    }

    /// Run a mutating command, or describe it under dry-run.
    /// `None` means the call was skipped by dry-run.
    pub async fn run_mutating(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<Option<RunOutput>> {
        if self.dry_run {
            self.logger
                .info("DRYRUN", format!("Would run: {}", render(program, args)));
            return Ok(None);
        }
        self.logger
            .debug("EXEC", format!("Running: {}", render(program, args)));
        self.host.run(program, args).await.map(Some)
    }

}

pub fn render(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    }
}

/// Shorthand for building string argument vectors.
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($arg.to_string()),*]
    };
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::context_with;
    use crate::host::scripted::ScriptedHost;

    #[tokio::test]
    async fn dry_run_skips_mutations_but_not_probes() {
        let host = Arc::new(ScriptedHost::new());
        let ctx = context_with(host.clone(), true);

        let skipped = ctx
            .run_mutating("apt-get", &crate::args!["install", "-y", "php8.2-fpm"])
            .await
            .unwrap();
        assert!(skipped.is_none());
        assert!(!host.ran_matching("apt-get"));

        ctx.probe("php", &crate::args!["-v"]).await.unwrap();
        assert!(host.ran_matching("php -v"));
    }
}

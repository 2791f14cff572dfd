//! Shell command actions declared with `run` in a Takefile

use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;
use take_core::{Action, ActionContext, ShellOptions};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs one or more shell commands in order.
///
/// Each command is started as `<shell> -c <command> <target> <args...>`, so
/// the target's arguments are available as `$1`, `$2`, ... inside it.
#[derive(Debug, Clone)]
pub struct ShellAction {
    commands: Vec<String>,
    options: ShellOptions,
}

impl ShellAction {
    /// Create a shell action
    pub fn new(commands: Vec<String>, options: ShellOptions) -> Self {
        Self { commands, options }
    }

    /// The commands this action runs
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    async fn run_command(
        &self,
        command: &str,
        ctx: &ActionContext,
        args: &[String],
    ) -> anyhow::Result<()> {
        if self.options.echo {
            println!(
                "{}{}{}",
                self.options.echo_prefix, command, self.options.echo_suffix
            );
        }

        let mut cmd = Command::new(&self.options.shell);
        cmd.arg("-c")
            .arg(command)
            .arg(ctx.namespace.name().unwrap_or_default())
            .args(args)
            .env("TAKE_NAMESPACE", ctx.namespace.to_string())
            .stdin(Stdio::null())
            .stdout(output_mode(self.options.print_stdout))
            .stderr(output_mode(self.options.print_stderr));
        for (i, value) in ctx.matched.iter().enumerate() {
            cmd.env(format!("TAKE_MATCH_{i}"), value);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to start '{}'", self.options.shell))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(namespace = %ctx.namespace, "{}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(namespace = %ctx.namespace, stderr = true, "{}", line);
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| c.to_string());
            if self.options.abort_on_error_code {
                bail!("command '{}' exited with {}", command, code);
            }
            warn!(namespace = %ctx.namespace, command, code = %code, "command failed, continuing");
        }

        Ok(())
    }
}

fn output_mode(print: bool) -> Stdio {
    if print {
        Stdio::inherit()
    } else {
        Stdio::piped()
    }
}

#[async_trait]
impl Action for ShellAction {
    async fn execute(&self, ctx: &ActionContext, args: &[String]) -> anyhow::Result<()> {
        for command in &self.commands {
            self.run_command(command, ctx, args).await?;
        }
        Ok(())
    }
}

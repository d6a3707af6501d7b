use crate::{
    error::DashErrors,
    status::{quote_large_integers, InterfaceStats, IpLink, ServiceStatus, Snapshot},
};
use futures::Future;
use log::debug;
use regex::Regex;
use std::{io, pin::Pin};
use tokio::process::Command;

#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = io::Result<ExecResult>> + Send + 'a>>;

// CommandRunner is how the loader reaches the outside world. The system
// implementation spawns processes; tests feed canned output.
pub trait CommandRunner: Send + Sync {
    fn exec<'a>(&'a self, program: &'a str, args: &'a [String]) -> ExecFuture<'a>;
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn exec<'a>(&'a self, program: &'a str, args: &'a [String]) -> ExecFuture<'a> {
        Box::pin(async move {
            let output = Command::new(program).args(args).output().await?;
            Ok(ExecResult {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

pub struct Loader<R> {
    runner: R,
    interfaces_cmd: Invocation,
    status_cmd: Invocation,
    interface_pattern: Regex,
}

impl<R: CommandRunner> Loader<R> {
    pub fn new(
        runner: R,
        interfaces_cmd: Invocation,
        status_cmd: Invocation,
        interface_pattern: &str,
    ) -> Result<Self, DashErrors> {
        Ok(Self {
            runner,
            interfaces_cmd,
            status_cmd,
            interface_pattern: Regex::new(interface_pattern)?,
        })
    }

    /// Runs both commands concurrently and builds a snapshot. Failures on
    /// either side leave that half of the snapshot empty.
    pub async fn load(&self) -> Snapshot {
        let (ip_res, ts_res) = tokio::join!(
            self.run(&self.interfaces_cmd),
            self.run(&self.status_cmd)
        );

        let interfaces = ip_res
            .and_then(|out| parse_interfaces(&out, &self.interface_pattern))
            .unwrap_or_else(|e| {
                debug!("No interface data: {}", e);
                Vec::new()
            });
        let status = ts_res
            .and_then(|out| parse_status(&out))
            .map_err(|e| debug!("No service status: {}", e))
            .ok();

        Snapshot { interfaces, status }
    }

    async fn run(&self, cmd: &Invocation) -> Result<String, DashErrors> {
        let res = self.runner.exec(&cmd.program, &cmd.args).await?;
        if res.code != Some(0) {
            if !res.stderr.is_empty() {
                debug!("{}: {}", cmd.program, res.stderr.trim_end());
            }
            return Err(DashErrors::CommandFailed {
                program: cmd.program.clone(),
                code: res.code,
            });
        }
        if res.stdout.trim().is_empty() {
            return Err(DashErrors::EmptyOutput(cmd.program.clone()));
        }
        Ok(res.stdout)
    }
}

pub fn parse_interfaces(raw: &str, pattern: &Regex) -> Result<Vec<InterfaceStats>, DashErrors> {
    let links: Vec<IpLink> = serde_json::from_str(raw)?;
    Ok(links
        .iter()
        .filter(|link| pattern.is_match(&link.ifname))
        .map(IpLink::to_stats)
        .collect())
}

pub fn parse_status(raw: &str) -> Result<ServiceStatus, DashErrors> {
    Ok(serde_json::from_str(&quote_large_integers(raw))?)
}

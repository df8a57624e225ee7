//! Command line parsing.

use std::path::PathBuf;

use anyhow::{anyhow, bail};

use termlink_core::ConnectionParams;

/// Usage text printed for `--help`.
pub const USAGE: &str = "\
Usage: termlink [OPTIONS]

Options:
  --config <PATH>     YAML configuration file
  --host <HOST[:PORT]> Connect to a remote host instead of a local shell
  --user <USER>       Remote login name
  --action <NAME>     Dispatch a catalog action once connected (repeatable)
  --list-actions      Print the configured action catalogs and exit
  -h, --help          Print this help";

/// Parsed command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Configuration file
    pub config: Option<PathBuf>,
    /// Remote host token
    pub host: Option<String>,
    /// Remote user
    pub user: Option<String>,
    /// Actions to dispatch after connecting, in order
    pub actions: Vec<String>,
    /// Print catalogs and exit
    pub list_actions: bool,
    /// Print usage and exit
    pub help: bool,
}

impl CliOptions {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} requires a value"))
            };
            match arg.as_str() {
                "--config" => options.config = Some(PathBuf::from(value("--config")?)),
                "--host" => options.host = Some(value("--host")?),
                "--user" => options.user = Some(value("--user")?),
                "--action" => options.actions.push(value("--action")?),
                "--list-actions" => options.list_actions = true,
                "-h" | "--help" => options.help = true,
                other => bail!("unknown argument: {other}\n\n{USAGE}"),
            }
        }

        Ok(options)
    }

    /// Connection parameters selected by the command line.
    ///
    /// Without `--host` this selects the local shell.
    pub fn connection_params(&self) -> ConnectionParams {
        match &self.host {
            Some(host) => ConnectionParams::new(
                host.clone(),
                self.user.clone().unwrap_or_default(),
                None,
            ),
            None => ConnectionParams::local(),
        }
    }
}

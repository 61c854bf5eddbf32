//! Command-line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// JobScout - resilient scheduled fetch of marketplace job listings
#[derive(Parser, Debug)]
#[command(name = "jobscout", version, about)]
pub struct Cli {
    /// Configuration file (TOML or JSON); skips environment and path probing
    #[arg(long, global = true, env = "JOBSCOUT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply the schema and create the scheduler state if absent
    Init,
    /// Show the scheduler state and health summary
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Turn the kill switch on
    Enable,
    /// Turn the kill switch off; ticks skip until re-enabled
    Disable,
    /// Re-enable and close the circuit, keeping run history
    Reset,
    /// Run one guarded fetch attempt (for cron or systemd timers)
    Tick,
    /// Fire ticks on the configured cron schedule until interrupted
    Run {
        /// Override the configured cron expression (six fields, seconds first)
        #[arg(long)]
        cron: Option<String>,
    },
    /// Manage the stored OAuth credential
    #[command(subcommand)]
    Credentials(CredentialsCommand),
}

#[derive(Subcommand, Debug)]
pub enum CredentialsCommand {
    /// Seed the credential from an out-of-band authorization
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[arg(long, env = "JOBSCOUT_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,

    #[arg(long, env = "JOBSCOUT_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: String,

    /// Remaining access token lifetime in seconds
    #[arg(long, default_value_t = 3600)]
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_status_with_json_flag() {
        let cli = Cli::try_parse_from(["jobscout", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Status { json: true }));
        assert!(!cli.log_json);
    }

    #[test]
    fn global_options_follow_subcommand() {
        let cli =
            Cli::try_parse_from(["jobscout", "tick", "--config", "/etc/jobscout.toml", "--log-json"])
                .unwrap();
        assert!(matches!(cli.command, Command::Tick));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/jobscout.toml")));
        assert!(cli.log_json);
    }

    #[test]
    fn parses_credentials_import() {
        let cli = Cli::try_parse_from([
            "jobscout",
            "credentials",
            "import",
            "--access-token",
            "at",
            "--refresh-token",
            "rt",
            "--expires-in",
            "120",
        ])
        .unwrap();

        let Command::Credentials(CredentialsCommand::Import(args)) = cli.command else {
            panic!("expected credentials import");
        };
        assert_eq!(args.access_token, "at");
        assert_eq!(args.refresh_token, "rt");
        assert_eq!(args.expires_in, 120);
    }

    #[test]
    fn run_accepts_cron_override() {
        let cli = Cli::try_parse_from(["jobscout", "run", "--cron", "0 */15 * * * *"]).unwrap();
        assert!(matches!(cli.command, Command::Run { cron: Some(ref c) } if c == "0 */15 * * * *"));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["jobscout", "fetch-now"]).is_err());
    }
}

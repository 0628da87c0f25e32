//! zone-snapshot command line
//!
//! Creates, restores or downloads snapshots for a set of DNS zones, one zone
//! at a time. Details of every zone go to the log file; the terminal only
//! shows progress and the final pointer to the log.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use zone_snapshot::batch::TokioSleeper;
use zone_snapshot::client::Credentials;
use zone_snapshot::{Config, Error, HttpConnector, Invocation, Mode, Result, ZoneSource};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bulk DNS zone snapshot manager", long_about = None)]
#[command(group(
    ArgGroup::new("zone_source")
        .required(true)
        .args(["zones_file", "all_zones"])
))]
struct Cli {
    /// Username for password authentication
    #[arg(short, long)]
    username: Option<String>,

    /// Password for password authentication
    #[arg(short, long)]
    password: Option<String>,

    /// Bearer token (instead of username and password)
    #[arg(short, long)]
    token: Option<String>,

    /// Refresh token to renew the bearer token
    #[arg(short, long)]
    refresh_token: Option<String>,

    /// Restore zones to their most recent snapshot
    #[arg(short = 's', long, conflicts_with = "download")]
    restore: bool,

    /// Download existing snapshots into a zip archive
    #[arg(short, long)]
    download: bool,

    /// File with one zone name per line
    #[arg(short, long)]
    zones_file: Option<PathBuf>,

    /// Run against every zone in the account
    #[arg(short, long)]
    all_zones: bool,

    /// Log file, appended to on every run
    #[arg(short, long, default_value = "output.log")]
    log_file: PathBuf,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between task status checks
    #[arg(long)]
    poll_interval: Option<u64>,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.restore {
            Mode::Restore
        } else if self.download {
            Mode::Download
        } else {
            Mode::Create
        }
    }

    fn zone_source(&self) -> ZoneSource {
        match &self.zones_file {
            Some(path) => ZoneSource::File(path.clone()),
            None => ZoneSource::Account,
        }
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        if let Some(secs) = self.poll_interval {
            config.poll_interval = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        // The prompt has already told the operator
        Err(Error::Aborted(_)) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, code = e.error_code(), "run failed");
            eprintln!("Error: {}", e);
            if !e.is_user_input() {
                eprintln!("Check {} for more information.", cli.log_file.display());
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let credentials = Credentials::from_flags(
        cli.username.clone(),
        cli.password.clone(),
        cli.token.clone(),
        cli.refresh_token.clone(),
    )?;
    let config = cli.load_config()?;
    let mode = cli.mode();
    let invocation = Invocation {
        mode,
        source: cli.zone_source(),
        config: &config,
        log_file: Some(cli.log_file.as_path()),
    };

    let report = invocation
        .execute(
            &HttpConnector::new(credentials),
            &TokioSleeper,
            &mut std::io::stdin().lock(),
            &mut std::io::stdout(),
            |p| {
                eprintln!(
                    "[{}/{}] {} {}: {}",
                    p.position,
                    p.total,
                    mode.tag(),
                    p.zone,
                    p.outcome
                )
            },
        )
        .await?;

    if let Some(archive) = &report.archive {
        println!("Archive written to {}", archive.display());
    }
    println!(
        "Script completed. Check {} for more information.",
        cli.log_file.display()
    );
    Ok(())
}

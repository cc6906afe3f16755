use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve a wine catalog loaded from CSV over HTTP", long_about = None)]
pub struct Cli {
    /// Socket address the HTTP server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// CSV file the catalog is loaded from at startup.
    #[arg(long, default_value = "./winemag-data-130k-v2.csv")]
    pub csv: PathBuf,

    /// Seconds between metrics reports.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub metrics_interval_secs: u64,

    /// Milliseconds a request waits for the catalog manager before giving up.
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1..))]
    pub reply_timeout_ms: u64,
}

/// Runtime settings derived from the command line.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub listen: SocketAddr,
    pub csv: PathBuf,
    pub metrics_interval: Duration,
    pub reply_timeout: Duration,
}

impl Cli {
    pub fn catalog_config(&self) -> CatalogConfig {
        CatalogConfig {
            listen: self.listen,
            csv: self.csv.clone(),
            metrics_interval: Duration::from_secs(self.metrics_interval_secs),
            reply_timeout: Duration::from_millis(self.reply_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_service() {
        let config = Cli::parse_from(["wine_catalog"]).catalog_config();
        assert_eq!(config.listen, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.csv, PathBuf::from("./winemag-data-130k-v2.csv"));
        assert_eq!(config.metrics_interval, Duration::from_secs(60));
        assert_eq!(config.reply_timeout, Duration::from_secs(5));
    }

    #[test]
    fn flags_override_defaults() {
        let config = Cli::parse_from([
            "wine_catalog",
            "--listen",
            "127.0.0.1:0",
            "--csv",
            "data/wines.csv",
            "--metrics-interval-secs",
            "5",
            "--reply-timeout-ms",
            "250",
        ])
        .catalog_config();
        assert_eq!(config.listen.port(), 0);
        assert_eq!(config.csv, PathBuf::from("data/wines.csv"));
        assert_eq!(config.metrics_interval, Duration::from_secs(5));
        assert_eq!(config.reply_timeout, Duration::from_millis(250));
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Cli::try_parse_from(["wine_catalog", "--metrics-interval-secs", "0"]).is_err());
    }
}

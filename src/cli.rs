//! Command-line arguments.

use clap::{Parser, ValueEnum};

/// Names of the long-running services this binary can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceName {
    Web,
    Ingest,
}

impl ServiceName {
    /// Every service, in startup order.
    pub fn all() -> Vec<ServiceName> {
        vec![ServiceName::Web, ServiceName::Ingest]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Web => "web",
            ServiceName::Ingest => "ingest",
        }
    }
}

/// Output format for tracing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TracingFormat {
    /// Human-readable, colorized output.
    Pretty,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Parser)]
#[command(version, about = "Seoul citydata crowding ingestion and query service")]
pub struct Args {
    /// Log output format
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,

    /// Skip the ingestion scheduler and only serve the query API
    #[arg(long)]
    pub no_ingest: bool,
}

impl Args {
    /// Services enabled by the given flags.
    pub fn enabled_services(&self) -> Vec<ServiceName> {
        ServiceName::all()
            .into_iter()
            .filter(|s| !(self.no_ingest && *s == ServiceName::Ingest))
            .collect()
    }
}

fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ingest_drops_ingest_service() {
        let args = Args::parse_from(["crowdpulse", "--no-ingest"]);
        assert_eq!(args.enabled_services(), vec![ServiceName::Web]);
    }

    #[test]
    fn test_defaults_enable_everything() {
        let args = Args::parse_from(["crowdpulse", "--tracing", "json"]);
        assert_eq!(args.tracing, TracingFormat::Json);
        assert_eq!(args.enabled_services(), ServiceName::all());
    }
}

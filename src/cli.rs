use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "h4deck",
    version,
    about = "Terminal console for the H4 GitOps platform."
)]
pub struct CliArgs {
    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Append logs to this file; logs are discarded otherwise
    #[arg(long)]
    pub log_file: Option<String>,

    /// Simulated verification latency in milliseconds (overrides config)
    #[arg(long)]
    pub validation_delay_ms: Option<u64>,

    /// Prefill the login username
    #[arg(short, long)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn defaults_keep_logs_quiet() {
        let args = CliArgs::parse_from(["h4deck"]);
        assert_eq!(args.log_filter, "info");
        assert_eq!(args.log_file, None);
        assert_eq!(args.validation_delay_ms, None);
    }

    #[test]
    fn flags_are_parsed() {
        let args = CliArgs::parse_from([
            "h4deck",
            "--log-filter",
            "debug",
            "--validation-delay-ms",
            "0",
            "-u",
            "admin",
        ]);
        assert_eq!(args.log_filter, "debug");
        assert_eq!(args.validation_delay_ms, Some(0));
        assert_eq!(args.user.as_deref(), Some("admin"));
    }
}

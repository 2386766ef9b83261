use clap::Parser;
use hlsflv_engine::Viewport;
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    author = "hua0512 <https://github.com/hua0512>",
    version,
    about = "Play an HLS stream into an FLV file",
    long_about = "Loads an HLS master or media playlist, follows live refreshes, adapts the\n\
                  variant to the measured bandwidth and transmuxes the MPEG-TS segments\n\
                  into a single FLV file. Stops at the end of the stream, after --duration,\n\
                  or on Ctrl-C."
)]
pub struct CliArgs {
    /// URL of the master or media playlist
    #[arg(required = true, help = "URL of the HLS master or media playlist")]
    pub url: String,

    /// Output file
    #[arg(
        short,
        long,
        default_value = "output.flv",
        help = "Path of the FLV file to write"
    )]
    pub output: PathBuf,

    /// Custom HTTP headers
    #[arg(
        short = 'H',
        long = "header",
        help = "Add a custom HTTP header (format: \"Name: Value\"). Can be used multiple times."
    )]
    pub headers: Vec<String>,

    /// Send cookies with requests
    #[arg(long, help = "Keep and send cookies with playlist and segment requests")]
    pub with_credentials: bool,

    /// Overall HTTP request timeout in seconds
    #[arg(
        long,
        default_value = "45",
        help = "Overall timeout for each HTTP request in seconds (0 to disable)"
    )]
    pub timeout: u64,

    /// Upper bound on the bandwidth used to pick a variant, in bits/s
    #[arg(long, help = "Never pick a variant as if throughput exceeded this many bits/s")]
    pub max_bandwidth: Option<f64>,

    /// Bandwidth assumed before the first segment is measured, in bits/s
    #[arg(long, help = "Bandwidth assumed before the first measurement, in bits/s")]
    pub initial_bandwidth: Option<f64>,

    /// Largest picture size to select, as WIDTHxHEIGHT
    #[arg(
        long,
        value_parser = parse_viewport,
        help = "Largest variant resolution to select, e.g. 1280x720"
    )]
    pub viewport: Option<Viewport>,

    /// Maximum duration with optional unit (s, m, h)
    #[arg(
        short = 'd',
        long,
        default_value = "0",
        help = "Stop after this much media has been written (s, m, h). Examples: \"30m\", \"90s\". Use 0 for unlimited."
    )]
    pub duration: String,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,
}

fn parse_viewport(value: &str) -> Result<Viewport, String> {
    Viewport::parse(value).ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))
}

use std::fs;
use std::process;

use clap::{CommandFactory, FromArgMatches, Parser};
use tracing::Level;

use compact::core::{
    print_error_message, print_info_message, CompactError, CompactOptions, Converter,
    ExclusionPolicy,
};
use compact::env::{generate_env_docs, EnvConfig};
use compact::utils::url::domain_is_within_domain;

#[derive(Parser, Debug)]
#[command(
    name = "compact",
    version,
    about = "Save a web page with its images, stylesheets and scripts as a single HTML file",
    after_help = "Example: compact -v http://google.com google.html"
)]
struct Cli {
    /// Log every fetched, excluded and skipped reference to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Keep <img> sources as they are
    #[arg(long)]
    no_images: bool,

    /// Keep background images inside stylesheets as they are
    #[arg(long)]
    no_css_images: bool,

    /// Keep <link rel="stylesheet"> tags as they are
    #[arg(long)]
    no_css: bool,

    /// Keep <script src> tags as they are
    #[arg(long)]
    no_js: bool,

    /// Never inline anything served from DOMAIN or its subdomains
    #[arg(short = 'e', long = "exclude-domain", value_name = "DOMAIN")]
    exclude_domains: Vec<String>,

    /// Network timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// User-Agent header to send
    #[arg(short, long)]
    user_agent: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// URL, file path or data URL of the page
    source: String,

    /// File to write to; stdout when omitted
    target: Option<String>,
}

impl Cli {
    fn options(&self, env_config: &EnvConfig) -> CompactOptions {
        let mut options = CompactOptions::from(env_config);

        if let Some(timeout) = self.timeout {
            options.timeout = timeout;
        }
        if let Some(user_agent) = &self.user_agent {
            options.user_agent = Some(user_agent.clone());
        }
        options.insecure |= self.insecure;

        options
    }

    fn policy(&self) -> ExclusionPolicy {
        let mut policy = ExclusionPolicy::new();

        if !self.exclude_domains.is_empty() {
            let domains = self.exclude_domains.clone();
            policy = policy.exclude_all(move |url| {
                url.host_str().is_some_and(|host| {
                    domains
                        .iter()
                        .any(|domain| domain_is_within_domain(host, domain))
                })
            });
        }
        if self.no_images {
            policy = policy.exclude_content_images(|_| true);
        }
        if self.no_css_images {
            policy = policy.exclude_css_images(|_| true);
        }
        if self.no_css {
            policy = policy.exclude_stylesheets(|_| true);
        }
        if self.no_js {
            policy = policy.exclude_scripts(|_| true);
        }

        policy
    }
}

fn init_logging(verbose: bool, log_level: &str, no_color: bool) {
    let level = if verbose {
        log_level.parse().unwrap_or(Level::DEBUG)
    } else {
        Level::ERROR
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color && atty::is(atty::Stream::Stderr))
        .with_target(false)
        .init();
}

fn run(cli: &Cli, env_config: &EnvConfig) -> Result<(), CompactError> {
    let mut converter = Converter::with_policy(cli.options(env_config), cli.policy())?;
    let content = converter.convert(&cli.source)?;

    match &cli.target {
        Some(target) => {
            fs::write(target, content)?;
            print_info_message("Done");
        }
        None => print!("{content}"),
    }

    Ok(())
}

fn parse_cli() -> Cli {
    // --help 额外列出可用的环境变量
    let matches = Cli::command()
        .after_long_help(generate_env_docs())
        .get_matches();

    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn main() {
    let cli = parse_cli();

    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            print_error_message(&format!("Error: {e}"), false);
            process::exit(1);
        }
    };

    init_logging(cli.verbose, &env_config.log_level, env_config.no_color);

    if let Err(e) = run(&cli, &env_config) {
        print_error_message(&format!("Error: {e}"), env_config.no_color);
        process::exit(1);
    }
}

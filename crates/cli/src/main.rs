mod echo;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use web2md_core::{
    Article, Extractor, ExtractorConfig, RawPage, Web2mdError, fetch_file, fetch_stdin, fetch_url, slugify,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fetch a web page and print its main content as Markdown
#[derive(Parser, Debug)]
#[command(name = "web2md")]
#[command(version, about = "Fetch a web page and print its main content as Markdown", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save to <slug-of-title>.md in the output directory
    #[arg(short, long, conflicts_with = "output")]
    save: bool,

    /// Directory used by --save
    #[arg(short = 'd', long, default_value = ".", value_name = "DIR")]
    output_dir: PathBuf,

    /// Prepend a title, byline and source link header
    #[arg(long)]
    header: bool,

    /// Include TOML frontmatter
    #[arg(long)]
    frontmatter: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Minimum score the main content must reach
    #[arg(long, default_value = "5.0", value_name = "SCORE")]
    min_score: f64,

    /// Minimum character threshold for content candidates
    #[arg(long, default_value = "500", value_name = "NUM")]
    char_threshold: usize,

    /// Maximum number of candidate elements to score (0 = unlimited)
    #[arg(long, default_value = "0", value_name = "NUM")]
    max_elements: usize,

    /// Strip images from output
    #[arg(long)]
    no_images: bool,

    /// Enable debug logging and progress output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn extractor_config(&self) -> ExtractorConfig {
        let mut builder = ExtractorConfig::builder()
            .min_score(self.min_score)
            .char_threshold(self.char_threshold)
            .max_elems_to_parse(self.max_elements)
            .preserve_images(!self.no_images)
            .timeout(self.timeout)
            .header(self.header)
            .frontmatter(self.frontmatter);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        builder.build()
    }
}

/// Where the page comes from.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Stdin,
    Url(&'a str),
    File(&'a str),
}

impl<'a> Input<'a> {
    fn parse(input: &'a str) -> Self {
        if input == "-" {
            Input::Stdin
        } else if input.contains("://") {
            Input::Url(input)
        } else {
            Input::File(input)
        }
    }
}

fn setup_logging(verbose: bool) {
    let default_directives = if verbose { "warn,web2md=debug,web2md_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .init();
}

async fn read_input(input: &Input<'_>, extractor: &Extractor, verbose: bool) -> web2md_core::Result<RawPage> {
    match input {
        Input::Stdin => {
            if verbose {
                echo::print_step(1, 4, "Reading from stdin");
            }
            fetch_stdin()
        }
        Input::Url(url) => {
            if verbose {
                echo::print_step(1, 4, &format!("Fetching from {}", url.bright_white().underline()));
            }
            fetch_url(url, &extractor.config().fetch).await
        }
        Input::File(path) => {
            if verbose {
                echo::print_step(1, 4, &format!("Reading from file {}", path.bright_white()));
            }
            fetch_file(path)
        }
    }
}

fn output_path(args: &Args, article: &Article) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = &args.output {
        return Ok(Some(path.clone()));
    }
    if !args.save {
        return Ok(None);
    }

    let title = article.title().unwrap_or_default();
    if title.is_empty() {
        echo::print_warning("No title found, saving as article.md");
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create directory: {}", args.output_dir.display()))?;
    Ok(Some(args.output_dir.join(format!("{}.md", slugify(title)))))
}

fn write_output(args: &Args, article: &Article, markdown: &str) -> anyhow::Result<()> {
    match output_path(args, article)? {
        Some(path) => {
            fs::write(&path, markdown).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(markdown.as_bytes()).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut timings: Vec<(&str, Duration)> = Vec::new();
    let extractor = Extractor::with_config(args.extractor_config());

    if args.verbose {
        echo::print_banner();
    }

    let input = Input::parse(&args.input);
    tracing::debug!(?input, "reading input");

    let step = Instant::now();
    let page = read_input(&input, &extractor, args.verbose).await?;
    timings.push(("Read", step.elapsed()));

    if args.verbose {
        echo::print_field("Size", &echo::format_size(page.bytes.len()));
        if let Some(content_type) = &page.content_type {
            echo::print_field("Content-Type", content_type);
        }
        if let Some(url) = &page.url {
            echo::print_field("Final URL", url.as_str());
        }
        eprintln!();
        echo::print_step(2, 4, "Extracting main content");
    }

    let step = Instant::now();
    let article = extractor.article_from_raw(page)?;
    timings.push(("Extract", step.elapsed()));

    if args.verbose {
        echo::print_extraction_details(&article);
        echo::print_step(3, 4, "Rendering Markdown");
    }

    let step = Instant::now();
    let markdown = extractor.render(&article)?;
    timings.push(("Render", step.elapsed()));

    if args.verbose {
        echo::print_field("Length", &echo::format_size(markdown.len()));
        eprintln!();
        echo::print_step(4, 4, "Writing output");
    }

    write_output(args, &article, &markdown)?;

    if args.verbose {
        echo::print_timing_summary(started.elapsed(), &timings);
    }

    Ok(())
}

/// Prints a failure on stderr and picks the exit code for it.
fn report(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Web2mdError>() {
        Some(error) => {
            echo::print_error(&format!("{}: {}", error.kind(), error));
            error.kind().exit_code()
        }
        None => {
            echo::print_error(&format!("{:#}", err));
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_parse() {
        assert_eq!(Input::parse("-"), Input::Stdin);
        assert_eq!(Input::parse("https://example.com/a"), Input::Url("https://example.com/a"));
        assert_eq!(Input::parse("ftp://example.com/a"), Input::Url("ftp://example.com/a"));
        assert_eq!(Input::parse("page.html"), Input::File("page.html"));
    }

    #[test]
    fn test_args_map_to_config() {
        let args = Args::parse_from([
            "web2md",
            "--timeout",
            "7",
            "--user-agent",
            "tester/1.0",
            "--min-score",
            "12.5",
            "--max-elements",
            "40",
            "--no-images",
            "--header",
            "https://example.com",
        ]);
        let config = args.extractor_config();

        assert_eq!(config.fetch.timeout, 7);
        assert_eq!(config.fetch.user_agent, "tester/1.0");
        assert_eq!(config.min_score, 12.5);
        assert_eq!(config.max_elems_to_parse, 40);
        assert_eq!(config.nb_top_candidates, 5);
        assert!(!config.preserve_images);
        assert!(config.markdown.header);
        assert!(!config.markdown.frontmatter);
    }

    #[test]
    fn test_save_conflicts_with_output() {
        let result = Args::try_parse_from(["web2md", "-s", "-o", "out.md", "page.html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_report_exit_codes() {
        let fetch = anyhow::Error::from(Web2mdError::InvalidUrl("x".into()));
        let parse = anyhow::Error::from(Web2mdError::NotMarkup("png".into()));
        let empty = anyhow::Error::from(Web2mdError::NoContent);
        let output = anyhow::anyhow!("disk full").context("Failed to write to file: out.md");

        assert_eq!(report(&fetch), 3);
        assert_eq!(report(&parse), 4);
        assert_eq!(report(&empty), 5);
        assert_eq!(report(&output), 1);
    }
}

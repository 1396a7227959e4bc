use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("web2md")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetch a web page and print its main content as Markdown")
        .arg(clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-s --save "Save to <slug-of-title>.md in the output directory").conflicts_with("output"))
        .arg(
            clap::arg!(-d --"output-dir" <DIR> "Directory used by --save")
                .default_value(".")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--header "Prepend a title, byline and source link header"))
        .arg(clap::arg!(--frontmatter "Include TOML frontmatter"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(clap::arg!(--"min-score" <SCORE> "Minimum score the main content must reach").default_value("5.0"))
        .arg(
            clap::arg!(--"char-threshold" <NUM> "Minimum character threshold for content candidates")
                .default_value("500"),
        )
        .arg(
            clap::arg!(--"max-elements" <NUM> "Maximum number of candidate elements to score (0 = unlimited)")
                .default_value("0"),
        )
        .arg(clap::arg!(--"no-images" "Strip images from output"))
        .arg(clap::arg!(-v --verbose "Enable debug logging and progress output"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "web2md", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "web2md", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "web2md", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "web2md", &completions_dir).unwrap();
}

// Command-line interface for docmorph
//
// This binary converts markdown documents with embedded LaTeX math into DOCX packages or
// standalone HTML pages. All of the conversion lives in the docmorph-babel crate; this crate
// only reads files, layers configuration and reports errors.
//
// Converting:
//
// The target format can be given with --to. Without it, it is detected from the extension of
// the -o path, and falls back to docx.
// Usage:
//  docmorph <input.md> [--to docx|html] [-o <out>]             - Convert (default)
//  docmorph convert <input.md> [--to docx|html] [-o <out>]     - Same as above (explicit)
//  docmorph generate-config                                     - Print the default docmorph.toml
//
// Configuration:
//
// Defaults are embedded; ./docmorph.toml is layered on top when present, then the file given
// with --config, then every --set key=value in order.
// Example:
//  docmorph notes.md -o notes.docx --set style.paragraph.font_family=Georgia

use std::fs;
use std::path::Path;

use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use docmorph_babel::publish::{publish, PublishArtifact, PublishSpec};
use docmorph_babel::{ConvertSettings, OutputFormat, Services};
use docmorph_config::{DocmorphConfig, Loader, LOCAL_CONFIG_FILE};
use log::{info, LevelFilter};

const SUBCOMMANDS: &[&str] = &["convert", "generate-config", "help"];

/// Environment variable holding an env_logger filter that replaces the defaults.
const LOG_ENV: &str = "DOCMORPH_LOG";

fn build_cli() -> Command {
    let formats: Vec<&'static str> = OutputFormat::ALL.iter().map(|f| f.name()).collect();

    Command::new("docmorph")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert markdown with LaTeX math to DOCX or standalone HTML")
        .long_about(
            "docmorph converts markdown documents with $inline$ and $$display$$ LaTeX math\n\
            into Word documents (.docx) or standalone HTML pages.\n\n\
            In DOCX output, math is rasterized to images through a headless Chrome. When no\n\
            browser can be found, equations are written as their LaTeX source instead.\n\
            Set DOCMORPH_CHROME_BIN to choose the browser binary.\n\n\
            Examples:\n  \
            docmorph notes.md -o notes.docx            # Convert to DOCX\n  \
            docmorph notes.md --to html                # Standalone HTML on stdout\n  \
            docmorph notes.md -o notes.html            # Format from the extension\n  \
            docmorph generate-config > docmorph.toml   # Start a configuration file",
        )
        .arg_required_else_help(true)
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Path to a docmorph.toml configuration file")
                .value_hint(ValueHint::FilePath)
                .global(true),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("KEY=VALUE")
                .help("Override a configuration key, e.g. convert.math.max_width=480")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log progress to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a markdown file (default command)")
                .long_about(
                    "Convert a markdown file to DOCX or HTML.\n\n\
                    Supported formats:\n  \
                    - docx: Word document (.docx), requires -o\n  \
                    - html: Standalone HTML page (.html, .htm)\n\n\
                    Relative image paths are resolved against the input file's directory.\n\
                    Text output goes to stdout when -o is absent.\n\n\
                    Examples:\n  \
                    docmorph convert report.md -o report.docx\n  \
                    docmorph convert report.md --to html -o report.html\n  \
                    docmorph report.md -o report.docx          # 'convert' is optional",
                )
                .arg(
                    Arg::new("input")
                        .help("Input markdown file")
                        .required(true)
                        .index(1)
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Target format (detected from -o when omitted, else docx)")
                        .value_parser(clap::builder::PossibleValuesParser::new(formats))
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Output file path (defaults to stdout for text formats)")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .help("Page title for HTML output (defaults to the first heading)")
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("generate-config")
                .about("Output the default configuration")
                .long_about(
                    "Outputs the embedded default configuration with every key documented.\n\n\
                    Examples:\n  \
                    docmorph generate-config > docmorph.toml",
                ),
        )
}

/// Parses `args`, injecting the `convert` subcommand when the first argument is a path.
fn parse_args(args: Vec<String>) -> ArgMatches {
    let cli = build_cli();
    match cli.clone().try_get_matches_from(&args) {
        Ok(matches) => matches,
        Err(e) => {
            let first = args.get(1).map(String::as_str);
            let looks_like_path =
                first.is_some_and(|arg| !arg.starts_with('-') && !SUBCOMMANDS.contains(&arg));
            if !looks_like_path {
                e.exit();
            }
            let mut injected = vec![args[0].clone(), "convert".to_string()];
            injected.extend_from_slice(&args[1..]);
            cli.try_get_matches_from(&injected)
                .unwrap_or_else(|e2| e2.exit())
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("docmorph_babel", level)
        .filter_module("docmorph", level)
        .parse_env(LOG_ENV)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = parse_args(std::env::args().collect());
    init_logger(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("convert", sub_matches)) => {
            let config = load_cli_config(
                sub_matches.get_one::<String>("config").map(String::as_str),
                sub_matches
                    .get_many::<String>("set")
                    .map(|values| values.map(String::as_str).collect())
                    .unwrap_or_default(),
            );
            handle_convert_command(sub_matches, &config).await;
        }
        Some(("generate-config", _)) => {
            handle_generate_config_command();
        }
        _ => {
            eprintln!("Unknown subcommand. Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

/// Handle the convert command
async fn handle_convert_command(matches: &ArgMatches, config: &DocmorphConfig) {
    let input = matches
        .get_one::<String>("input")
        .expect("input is required");
    let output = matches.get_one::<String>("output");
    let format = resolve_format(
        matches.get_one::<String>("to").map(String::as_str),
        output.map(String::as_str),
    );

    if format.is_binary() && output.is_none() {
        eprintln!("Binary formats (like DOCX) require an output file. Use -o <path>.");
        std::process::exit(1);
    }

    let source = fs::read_to_string(input).unwrap_or_else(|e| {
        eprintln!("Error reading file '{input}': {e}");
        std::process::exit(1);
    });

    let mut settings = ConvertSettings::from(&config.convert);
    settings.base_dir = Path::new(input)
        .parent()
        .map(Path::to_path_buf)
        .filter(|dir| !dir.as_os_str().is_empty());
    let services = Services::native(&settings);

    let mut spec = PublishSpec::new(&source, format);
    if let Some(path) = output {
        spec = spec.with_output_path(path);
    }
    let title = matches
        .get_one::<String>("title")
        .or(config.convert.html.title.as_ref());
    if let Some(title) = title {
        spec = spec.with_title(title.clone());
    }

    info!("Converting {input} to {format}");
    let result = publish(spec, &config.style, &services)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Conversion error: {e}");
            std::process::exit(1);
        });

    match result.artifact {
        PublishArtifact::InMemory(text) => print!("{text}"),
        PublishArtifact::File(path) => info!("Wrote {}", path.display()),
    }
}

/// `--to` wins, then the output extension, then DOCX.
fn resolve_format(explicit: Option<&str>, output: Option<&str>) -> OutputFormat {
    if let Some(name) = explicit {
        return OutputFormat::from_name(name).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        });
    }
    output
        .and_then(OutputFormat::detect_from_filename)
        .unwrap_or(OutputFormat::Docx)
}

/// Handle the generate-config command
fn handle_generate_config_command() {
    print!("{}", docmorph_config::default_toml());
}

fn load_cli_config(explicit_path: Option<&str>, overrides: Vec<&str>) -> DocmorphConfig {
    let loader = Loader::new().with_optional_file(LOCAL_CONFIG_FILE);
    let mut loader = if let Some(path) = explicit_path {
        loader.with_file(path)
    } else {
        loader
    };

    for raw in overrides {
        let Some((key, value)) = raw.split_once('=') else {
            eprintln!("Invalid --set '{raw}': expected key=value");
            std::process::exit(1);
        };
        loader = loader
            .set_override(key.trim(), value.trim())
            .unwrap_or_else(|err| {
                eprintln!("Invalid --set '{raw}': {err}");
                std::process::exit(1);
            });
    }

    loader.build().unwrap_or_else(|err| {
        eprintln!("Failed to load configuration: {err}");
        std::process::exit(1);
    })
}

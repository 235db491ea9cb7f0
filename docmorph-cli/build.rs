use clap::{Arg, ArgAction, Command, ValueHint};
use clap_complete::{generate_to, shells::*};
use std::env;
use std::io::Error;

// Mirror of the output formats from docmorph_babel::OutputFormat
// We need to duplicate this here since build scripts can't access src/ modules
const OUTPUT_FORMATS: &[&str] = &["docx", "html"];

fn main() -> Result<(), Error> {
    let outdir = match env::var_os("OUT_DIR") {
        None => return Ok(()),
        Some(outdir) => outdir,
    };

    let mut cmd = Command::new("docmorph")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert markdown with LaTeX math to DOCX or standalone HTML")
        .arg_required_else_help(true)
        .arg(
            Arg::new("input")
                .help("Markdown file to convert")
                .index(1)
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .help("Target format")
                .value_parser(clap::builder::PossibleValuesParser::new(OUTPUT_FORMATS))
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Output file path")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Path to a docmorph.toml configuration file")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .help("Override a configuration key (key=value)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log progress")
                .action(ArgAction::SetTrue),
        )
        .subcommand(Command::new("generate-config").about("Print the default configuration"));

    // Generate completions for bash
    generate_to(Bash, &mut cmd, "docmorph", &outdir)?;

    // Generate completions for zsh
    generate_to(Zsh, &mut cmd, "docmorph", &outdir)?;

    // Generate completions for fish
    generate_to(Fish, &mut cmd, "docmorph", &outdir)?;

    println!("cargo:warning=Shell completions generated in {outdir:?}");

    Ok(())
}

//! txt2combo cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; txt2combo ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    /// Directory holding the text resources
    #[clap(
        short = 'r',
        long = "root",
        env = "TXT2COMBO_ROOT",
        default_value = "txt2combo",
        global(true)
    )]
    pub root: PathBuf,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a document for errors
    ///
    /// Reads from stdin when no file is given
    Validate(InputArgs),

    /// Print the parsed document model
    Parse(InputArgs),

    /// Resolve a selection and print the outputs
    ///
    /// Lookup sections without a selection use their first row,
    /// input fields use their default.
    Resolve(ResolveCommand),

    /// List resources in the storage root
    #[command(alias = "ls")]
    List,

    /// Print a resource
    Read(ReadCommand),

    /// Validate and write a resource
    Write(WriteCommand),

    /// Print input and output descriptors of every node
    Nodes,

    /// (Re)write the example resource
    Seed,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Read a file instead of stdin
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Selection for a section, as SECTION=VALUE
    #[clap(short = 's', long = "select", value_parser = parse_selection)]
    pub selections: Vec<(String, String)>,
}

#[derive(Parser, Debug)]
pub struct ReadCommand {
    /// Resource name
    pub resource: String,
}

#[derive(Parser, Debug)]
pub struct WriteCommand {
    /// Resource name, `.txt` is appended when missing
    pub resource: String,

    #[arg(short = 'm', long = "mode", default_value_t)]
    pub mode: Mode,

    #[clap(flatten)]
    pub input: InputArgs,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum Mode {
    Overwrite,
    Append,
    /// Only create new resources
    #[default]
    Populate,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Overwrite => f.write_str("overwrite"),
            Mode::Append => f.write_str("append"),
            Mode::Populate => f.write_str("populate"),
        }
    }
}

impl From<Mode> for txt2combo::store::WriteMode {
    fn from(value: Mode) -> Self {
        use txt2combo::store::WriteMode;
        match value {
            Mode::Overwrite => WriteMode::Overwrite,
            Mode::Append => WriteMode::Append,
            Mode::Populate => WriteMode::Populate,
        }
    }
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t, global(true))]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

fn parse_selection(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected SECTION=VALUE, got '{value}'"))
}

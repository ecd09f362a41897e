mod cli;

use anyhow::Context;
use txt2combo::document::Document;
use txt2combo::registry::{NodeDescriptor, Registry};
use txt2combo::store::Store;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TXT2COMBO_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Validate(input) => validate(&input),
        cli::Command::Parse(input) => parse(&input, &cli.output),
        cli::Command::Resolve(resolve_cli) => resolve(&resolve_cli, &cli.output),
        cli::Command::List => list(&cli.root),
        cli::Command::Read(read_cli) => read(&cli.root, &read_cli),
        cli::Command::Write(write_cli) => write(&cli.root, &write_cli, &cli.output),
        cli::Command::Nodes => nodes(&cli.root, &cli.output),
        cli::Command::Seed => seed(&cli.root, &cli.output),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn load(input: &cli::InputArgs) -> anyhow::Result<String> {
    let Some(file_path) = &input.file else {
        return Ok(std::io::read_to_string(std::io::stdin())?);
    };

    tracing::info!(path=%file_path.display(), "loading file");
    let text = std::fs::read_to_string(file_path)
        .with_context(|| format!("Unable to read {}", file_path.display()))?;
    Ok(text)
}

pub fn validate(input: &cli::InputArgs) -> anyhow::Result<()> {
    let text = load(input)?;
    txt2combo::validate::validate(&text)?;
    println!("valid");
    Ok(())
}

pub fn parse(input: &cli::InputArgs, output_args: &cli::OutputArgs) -> anyhow::Result<()> {
    let document = Document::parse(&load(input)?);
    output(output_args, &document)
}

pub fn resolve(cli: &cli::ResolveCommand, output_args: &cli::OutputArgs) -> anyhow::Result<()> {
    let document = Document::parse(&load(&cli.input)?);

    let mut selections = document
        .layout()
        .map(|layout| layout.default_selections())
        .unwrap_or_default();
    for (key, value) in &cli.selections {
        if !selections.contains_key(key) {
            tracing::warn!(section = %key, "selection for unknown section");
        }
        selections.insert(key.clone(), value.clone());
    }

    output(output_args, &document.resolve(&selections))
}

fn list(root: &std::path::Path) -> anyhow::Result<()> {
    for resource in Store::open(root)?.list()? {
        println!("{resource}");
    }
    Ok(())
}

fn read(root: &std::path::Path, cli: &cli::ReadCommand) -> anyhow::Result<()> {
    let text = Store::open(root)?.read(&cli.resource)?;
    print!("{text}");
    Ok(())
}

fn write(
    root: &std::path::Path,
    cli: &cli::WriteCommand,
    output_args: &cli::OutputArgs,
) -> anyhow::Result<()> {
    let text = load(&cli.input)?;
    let response = Store::open(root)?.save(&cli.resource, &text, cli.mode.into());
    output(output_args, &response)?;

    anyhow::ensure!(response.success, "Write failed ({} mode)", cli.mode);
    Ok(())
}

#[derive(serde::Serialize)]
struct NodeInfo<'a> {
    class_name: &'a str,
    display_name: &'a str,
    resource: &'a str,
    #[serde(flatten)]
    descriptor: &'a NodeDescriptor,
}

fn nodes(root: &std::path::Path, output_args: &cli::OutputArgs) -> anyhow::Result<()> {
    let registry = Registry::load(Store::open(root)?)?;
    let nodes: Vec<_> = registry
        .nodes()
        .map(|node| NodeInfo {
            class_name: &node.class_name,
            display_name: &node.display_name,
            resource: &node.resource,
            descriptor: &node.descriptor,
        })
        .collect();

    output(output_args, &nodes)
}

fn seed(root: &std::path::Path, output_args: &cli::OutputArgs) -> anyhow::Result<()> {
    let outcome = Store::open(root)?.seed_example()?;
    output(output_args, &outcome)
}

fn output(output: &cli::OutputArgs, value: &impl serde::Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

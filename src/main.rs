//! Management front end for the remapd configuration core.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use remapd::cli::{Cli, Commands, LintArgs, ProfilesCommands};
use remapd::config::assets::{self, AssetBundle};
use remapd::config::ConfigDocument;
use remapd::{logging, manipulator, paths};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Validate => cmd_validate(cli),
        Commands::Lint(args) => cmd_lint(args),
        Commands::Profiles(args) => match &args.command {
            ProfilesCommands::List => cmd_profiles_list(cli),
            ProfilesCommands::Select { index } => cmd_profiles_select(cli, *index),
        },
    }
}

fn configuration_file(cli: &Cli) -> anyhow::Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(paths::user_configuration_file()?),
    }
}

fn cmd_validate(cli: &Cli) -> anyhow::Result<()> {
    let path = configuration_file(cli)?;
    let document = ConfigDocument::load(&path);

    if !document.loaded() {
        bail!("{} could not be loaded; see the log for details", path.display());
    }

    println!("{}: ok ({} profiles)", path.display(), document.profiles().len());

    let mut messages = Vec::new();
    for profile in document.profiles() {
        for rule in profile.complex_modifications().rules() {
            messages.extend(manipulator::lint_rule(rule));
        }
    }

    for message in &messages {
        println!("{message}");
    }
    if !messages.is_empty() {
        bail!("{} rule problem(s) found", messages.len());
    }

    Ok(())
}

fn cmd_lint(args: &LintArgs) -> anyhow::Result<()> {
    let bundles = match &args.file {
        Some(path) => vec![
            AssetBundle::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
        ],
        None => assets::load_user_assets()?,
    };

    let mut total = 0;
    for bundle in &bundles {
        let messages = bundle.lint();
        println!(
            "{} ({}): {} problem(s)",
            bundle.title(),
            bundle.path().display(),
            messages.len()
        );
        for message in messages {
            println!("  {message}");
            total += 1;
        }
    }

    if total > 0 {
        bail!("{total} problem(s) found");
    }
    Ok(())
}

fn cmd_profiles_list(cli: &Cli) -> anyhow::Result<()> {
    let path = configuration_file(cli)?;
    let document = ConfigDocument::load(&path);

    for (index, profile) in document.profiles().iter().enumerate() {
        let marker = if profile.selected() { "*" } else { " " };
        println!("{marker} {index}: {}", profile.name());
    }

    Ok(())
}

fn cmd_profiles_select(cli: &Cli, index: usize) -> anyhow::Result<()> {
    let path = configuration_file(cli)?;
    let mut document = ConfigDocument::load(&path);

    if !document.loaded() {
        bail!("refusing to modify {}: it could not be loaded", path.display());
    }
    if index >= document.profiles().len() {
        bail!(
            "no profile at index {index} ({} profiles)",
            document.profiles().len()
        );
    }

    document.select_profile(index);
    document
        .sync_save_to_file(&path)
        .with_context(|| format!("failed to save {}", path.display()))?;

    println!("selected profile {index}: {}", document.profiles()[index].name());
    Ok(())
}

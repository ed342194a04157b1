mod cli;

use clap::Parser;
use miette::IntoDiagnostic;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use loris_engine::export::{export_dot, export_dot_tex, export_json, DotOptions};
use loris_engine::pretty::pretty_lts;
use loris_engine::{explore, ExploreOptions};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Explore {
            file,
            max_states,
            register_size,
            format,
            state_numbers,
            a4,
            output,
        } => explore_command(
            &file,
            ExploreOptions {
                register_size,
                max_states,
            },
            &format,
            DotOptions { state_numbers, a4 },
            output,
        ),
        Commands::Check { file } => check_command(&file),
    }
}

fn load_program(file: &Path) -> miette::Result<loris_dsl::ast::Program> {
    let source = fs::read_to_string(file).into_diagnostic()?;
    let filename = file.display().to_string();
    loris_dsl::parse(&source, &filename).map_err(Into::into)
}

fn explore_command(
    file: &Path,
    opts: ExploreOptions,
    format: &str,
    dot_opts: DotOptions,
    output: Option<PathBuf>,
) -> miette::Result<()> {
    let program = load_program(file)?;
    tracing::info!(
        file = %file.display(),
        max_states = opts.max_states,
        register_size = opts.register_size,
        "exploring"
    );
    let lts = explore(&program, opts).into_diagnostic()?;

    if lts.states_explored >= opts.max_states {
        tracing::warn!(
            explored = lts.states_explored,
            "state budget exhausted; the LTS is partial"
        );
    }

    let rendered = match format {
        "pretty" => pretty_lts(&lts),
        "dot" => export_dot(&lts, &dot_opts),
        "tex" => export_dot_tex(&lts, &dot_opts),
        "json" => {
            let value = export_json(&lts);
            serde_json::to_string_pretty(&value).into_diagnostic()?
        }
        other => {
            return Err(miette::miette!(
                "unknown format '{other}' (expected pretty, dot, tex, or json)"
            ))
        }
    };

    match output {
        Some(path) => fs::write(&path, rendered + "\n").into_diagnostic()?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn check_command(file: &Path) -> miette::Result<()> {
    let program = load_program(file)?;
    for def in &program.defs {
        if def.params.is_empty() {
            println!("{} = {}", def.name, def.body);
        } else {
            println!("{}({}) = {}", def.name, def.params.join(","), def.body);
        }
    }
    println!("{}", program.root);
    Ok(())
}

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use codecursor::{parse_commands, parse_script, run, EditError, EditorConfig, SourceFile};

/// Apply cursor edit commands to a source file in place.
///
/// Commands are separate arguments (e.g. `"find class Program"` `"end"`
/// `"insert Log();"`); `--script` reads them from a file, one per line, and runs
/// them before any given on the command line.
#[derive(Debug, Parser)]
#[command(name = "codecursor", version)]
struct Cli {
    /// Print what would change without writing the file.
    #[arg(long)]
    dry_run: bool,

    /// Start from an empty buffer instead of loading the file.
    #[arg(long)]
    create: bool,

    /// Comment/string delimiters, e.g. `//,/* */,"`.
    #[arg(long, env = "CODECURSOR_DELIMITERS")]
    delimiters: Option<String>,

    /// Read commands from this file.
    #[arg(long)]
    script: Option<PathBuf>,

    file: PathBuf,

    commands: Vec<String>,
}

fn exit_code(err: &EditError) -> i32 {
    match err {
        EditError::Io { .. } | EditError::NonUtf8 { .. } | EditError::NoPath => 1,
        _ => 2,
    }
}

fn main() {
    codecursor::log::init();
    let cli = Cli::parse();
    if let Err(e) = edit(&cli) {
        eprintln!("error: {e}");
        process::exit(exit_code(&e));
    }
}

fn edit(cli: &Cli) -> Result<(), EditError> {
    let mut config = EditorConfig::default();
    if let Some(d) = &cli.delimiters {
        config = config.with_delimiter_text(d)?;
    }

    let mut commands = match &cli.script {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| EditError::Io {
                path: path.clone(),
                source,
            })?;
            parse_script(&text)?
        }
        None => Vec::new(),
    };
    commands.extend(parse_commands(cli.commands.as_slice())?);

    let mut file = if cli.create {
        SourceFile::create(&cli.file, &config)
    } else {
        SourceFile::load(&cli.file, &config)?
    };

    run(&mut file, &commands)?;

    if !cli.dry_run {
        file.write()?;
    }

    let lines = file.lines();
    for i in file.modified_lines() {
        println!("{}: {}", i + 1, lines[i]);
    }
    Ok(())
}

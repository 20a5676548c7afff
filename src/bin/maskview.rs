use std::path::PathBuf;
use std::process;

use clap::Parser;

use codecursor::{EditorConfig, SourceFile};

/// Print a file's search view: the lines searches see, with comments and
/// strings blanked.
///
/// Prints lines as `<lineno>  <masked text>`; start/end lines are 1-based inclusive.
#[derive(Debug, Parser)]
#[command(name = "maskview", version)]
struct Cli {
    /// Comment/string delimiters, e.g. `//,/* */,"`.
    #[arg(long, env = "CODECURSOR_DELIMITERS")]
    delimiters: Option<String>,

    file: PathBuf,

    start_line: Option<usize>,

    end_line: Option<usize>,
}

fn main() {
    codecursor::log::init();
    let cli = Cli::parse();

    let config = match &cli.delimiters {
        Some(d) => match EditorConfig::default().with_delimiter_text(d) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(2);
            }
        },
        None => EditorConfig::default(),
    };

    let file = match SourceFile::load(&cli.file, &config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let lines = file.search_lines();
    if lines.is_empty() {
        return;
    }

    let start_line = cli.start_line.unwrap_or(1);
    let end_line = match (cli.start_line, cli.end_line) {
        (None, _) => lines.len(),
        (Some(s), None) => s,
        (Some(_), Some(e)) => e,
    };

    if start_line == 0 {
        eprintln!("error: start_line is 1-based (must be >= 1)");
        process::exit(2);
    }

    if end_line < start_line {
        eprintln!("error: end_line must be >= start_line");
        process::exit(2);
    }

    if end_line > lines.len() {
        eprintln!(
            "error: end_line {end_line} is beyond EOF (file has {} line(s))",
            lines.len()
        );
        process::exit(2);
    }

    for (idx, line) in lines
        .iter()
        .enumerate()
        .skip(start_line - 1)
        .take(end_line - start_line + 1)
    {
        println!("{}  {line}", idx + 1);
    }
}

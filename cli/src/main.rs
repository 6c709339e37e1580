mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use mddoc::Warning;
use renderer::{DocumentBuilder, RecordingBuilder};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

#[derive(Parser)]
#[command(name = "mddoc", version, about = "Lightweight markup to document converter")]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a markup file
    Run(RunArgs),

    /// Run .test.md conformance files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Markup source file to convert
    file: String,

    /// Save the rendered document here instead of printing it
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rendering options (defaults to mddoc.toml next to the source)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Segment and expand only, then report warnings
    #[arg(long)]
    check: bool,

    /// Dump the segmented, expanded elements
    #[arg(long)]
    elements: bool,

    /// Don't print the rendered document (just report warnings)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();

    // `mddoc file.md` works like `mddoc run file.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        let pos = pos + 1;
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    // --check / --elements: stop after expansion
    if args.check || args.elements {
        let (document, warnings) = mddoc::Parser::new(source.as_str()).parse();
        emit_warnings(&writer, &term_config, &files, file_id, &warnings);
        if args.elements {
            for element in &document.elements {
                println!("{}", element);
            }
        } else {
            eprintln!(
                "ok: {} parsed into {} element(s), {} warning(s)",
                args.file,
                document.elements.len(),
                warnings.len()
            );
        }
        return;
    }

    let source_path = Path::new(&args.file);
    let options = match config::resolve(args.config.as_deref(), source_path) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    // Images are resolved relative to the source file.
    let base_dir = source_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut builder = RecordingBuilder::new().verify_images_in(base_dir);

    let warnings = renderer::convert(&source, &mut builder, &options);
    emit_warnings(&writer, &term_config, &files, file_id, &warnings);

    if let Some(output) = &args.output {
        if let Err(e) = builder.save(output) {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    } else if !args.quiet {
        println!("{}", builder.body_text());
    }
}

fn emit_warnings(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    file_id: usize,
    warnings: &[Warning],
) {
    for warning in warnings {
        let span = warning
            .line
            .checked_sub(1)
            .and_then(|index| files.line_range(file_id, index).ok());
        match span {
            Some(span) => {
                let diagnostic = warning.to_diagnostic(file_id, span);
                let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
            }
            None => eprintln!("warning: {}", warning),
        }
    }
}

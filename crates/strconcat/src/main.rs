use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::CommandFactory;
use clap::Parser;
use clap_complete::generate;
use colored::Colorize;
use itertools::Itertools;
use tracing::{info, warn};

use strconcat::cancel::CancellationToken;
use strconcat::cli::{Args, CheckCommand, Command, ImportMode, OutputFormat, selected_rules};
use strconcat::diagnostic::Diagnostic;
use strconcat::error::Error;
use strconcat::fix::{CapabilityRegistry, ConversionFixer, NoopImportInserter};
use strconcat::linter::{Counter, check_project, fix_project, lint_only};
use strconcat::logging;
use strconcat::model::Reference;
use strconcat::project::{Document, Project};
use strconcat::settings::Settings;
use strconcat::text_diff::CodeDiff;

#[derive(Copy, Clone)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::from(0),
            ExitStatus::Failure => Self::from(1),
        }
    }
}

fn read_file(path: &Path) -> Result<String, ExitStatus> {
    std::fs::read_to_string(path).map_err(|source| {
        let err = Error::Read {
            path: path.to_path_buf(),
            source,
        };
        eprintln!("{err}");
        ExitStatus::Failure
    })
}

fn write_file(path: &Path, content: &str) -> Result<(), ExitStatus> {
    std::fs::write(path, content).map_err(|source| {
        let err = Error::Write {
            path: path.to_path_buf(),
            source,
        };
        eprintln!("{err}");
        ExitStatus::Failure
    })
}

fn get_source_files(files: Vec<PathBuf>) -> Result<Vec<PathBuf>, ExitStatus> {
    let source_files = files
        .into_iter()
        .filter(|file| file.extension().and_then(|ext| ext.to_str()) == Some("cs"))
        .collect::<Vec<_>>();
    if source_files.is_empty() {
        Err(ExitStatus::Success)
    } else {
        Ok(source_files)
    }
}

fn time_it<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = std::time::Instant::now();
    let result = f();
    info!(elapsed = ?start.elapsed(), "{label}");
    result
}

fn run() -> Result<ExitStatus, ExitStatus> {
    let args = Args::parse();

    match args.command {
        Command::Check(check_args) => {
            logging::init(check_args.verbose);
            time_it("Execution time", || run_check_command(check_args))
        }
        Command::GenerateCompletions { shell } => {
            // https://github.com/BurntSushi/ripgrep/blob/master/FAQ.md#complete
            // strconcat generate-completions fish > ~/.config/fish/completions/strconcat.fish
            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(ExitStatus::Success)
        }
    }
}

fn settings_from(args: &CheckCommand) -> Settings {
    let references = if args.no_globalization {
        vec![Reference::Core]
    } else {
        Reference::ALL.to_vec()
    };
    Settings {
        rules: selected_rules(args.select.as_deref(), args.ignore.as_deref()),
        include_generated: args.include_generated,
        references,
    }
}

/// Parse every file into one project. Unparsable files are skipped.
fn load_project(files: &[PathBuf], settings: &Settings) -> Result<Project, ExitStatus> {
    let mut project = Project::new(&settings.references);
    for file in files {
        let text = read_file(file)?;
        match Document::parse(file.clone(), text) {
            Ok(document) => project = project.with_document(document),
            Err(err) => warn!(path = %file.display(), "skipping unparsable file: {err}"),
        }
    }
    Ok(project)
}

#[cfg(feature = "serde")]
fn print_json(diagnostics: &[Diagnostic]) -> Result<(), ExitStatus> {
    let json = serde_json::to_string_pretty(diagnostics).map_err(|err| {
        eprintln!("Failed to serialize diagnostics: {err}");
        ExitStatus::Failure
    })?;
    println!("{json}");
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn print_json(_diagnostics: &[Diagnostic]) -> Result<(), ExitStatus> {
    eprintln!("JSON output requires the `serde` feature.");
    Err(ExitStatus::Failure)
}

fn run_check_command(args: CheckCommand) -> Result<ExitStatus, ExitStatus> {
    let source_files = get_source_files(args.files.clone())?;
    let settings = settings_from(&args);

    if args.imports == ImportMode::Never {
        let registry = CapabilityRegistry {
            import_inserter: Arc::new(NoopImportInserter),
        };
        if CapabilityRegistry::install(registry).is_err() {
            warn!("capability registry already installed");
        }
    }

    let text_output = args.output_format == OutputFormat::Text;
    if text_output {
        println!(
            "Config: [{}]",
            settings
                .rules
                .iter()
                .map(|rule| rule.to_string().green().to_string())
                .collect::<Vec<String>>()
                .join(", ")
        );
    }

    let project = load_project(&source_files, &settings)?;
    let cancel = CancellationToken::new();
    let fail = |err: Error| {
        eprintln!("{err}");
        ExitStatus::Failure
    };

    let global_statistics_counter: Counter = if args.diff || args.fix {
        let fixer = ConversionFixer::from_registry();
        let (fixed, statistics_counter) =
            fix_project(project.clone(), &settings, &fixer, &cancel).map_err(fail)?;
        for (original, modified) in project.documents().iter().zip(fixed.documents()) {
            if original.text() == modified.text() {
                continue;
            }
            if args.diff {
                let path = original.path().display().to_string();
                let text_diff =
                    CodeDiff::new(original.text(), modified.text()).header(&path, &path);
                println!("{text_diff}");
            } else {
                write_file(original.path(), modified.text())?;
            }
        }
        statistics_counter
    } else {
        let diagnostics = check_project(&project, &settings, &cancel).map_err(fail)?;
        let mut statistics_counter = HashMap::new();
        if text_output {
            for (document, diagnostics) in project.documents().iter().zip(&diagnostics) {
                let (messages, counter) = lint_only(document.text(), diagnostics);
                if !args.statistics && !messages.is_empty() {
                    println!("{}", messages.join("\n"));
                }
                for (key, value) in counter {
                    *statistics_counter.entry(key).or_insert(0) += value;
                }
            }
        } else {
            let all: Vec<Diagnostic> = diagnostics.into_iter().flatten().collect();
            for diagnostic in &all {
                *statistics_counter.entry(diagnostic.kind).or_insert(0) += 1;
            }
            print_json(&all)?;
        }
        statistics_counter
    };

    if !text_output {
        return Ok(ExitStatus::Success);
    }

    if args.statistics {
        let padding = global_statistics_counter
            .values()
            .map(|k| k.to_string().len())
            .max()
            .unwrap_or(0);

        global_statistics_counter
            .iter()
            .sorted_by(|a, b| b.1.cmp(a.1))
            .for_each(|(k, v)| {
                println!(
                    "{:padding$}    {:<4}   [{}] {:?}",
                    v,
                    format!("{k}").red().bold(),
                    (if k.has_fix() { "*" } else { " " }).to_string().cyan(),
                    k
                );
            });
    }

    let n_errors = global_statistics_counter.values().sum::<usize>();
    let n_fixable_errors = global_statistics_counter
        .iter()
        .filter_map(|(rule, cnt)| if rule.has_fix() { Some(cnt) } else { None })
        .sum::<usize>();

    if n_errors == 0 {
        println!("No errors!");
    } else if args.fix {
        println!("Fixed {n_errors} errors.");
    } else if args.diff {
        println!("Would fix {n_errors} errors.");
    } else {
        println!(
            "Found {} errors.\n[{}] {} fixable with the `--fix` option.",
            n_errors,
            "*".to_string().cyan(),
            n_fixable_errors,
        );
    }

    Ok(ExitStatus::Success)
}

fn main() -> ExitCode {
    run().unwrap_or_else(Into::into).into()
}

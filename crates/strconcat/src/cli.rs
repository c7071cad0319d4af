use crate::registry::Rule;
use clap::builder::{PossibleValue, TypedValueParser};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use itertools::Itertools;
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(Debug, Parser)]
#[command(
    name = "strconcat",
    about = "Strconcat: finds culture-sensitive conversions in C# string concatenation.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run Strconcat on the given C# files
    Check(CheckCommand),

    /// Generate shell completions
    GenerateCompletions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ImportMode {
    /// Add `using System.Globalization;` when a fix needs it
    #[default]
    Auto,
    /// Never touch imports; fixes spell the culture type fully qualified
    Never,
}

// Cf. https://github.com/astral-sh/ruff/blob/1bdb22c13972b3a3dc9cb4ef31fbf37db051dd1c/crates/ruff/src/args.rs#L185
#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Files to process. Anything other than .cs files will be ignored.
    /// All files are bound together as one project.
    #[arg(value_parser, required = true)]
    pub files: Vec<PathBuf>,

    /// Replace the input files.
    #[arg(long)]
    pub fix: bool,

    /// Show differences between original and corrected code.
    #[arg(long)]
    pub diff: bool,

    /// Specify which rules to check.
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "RULE_CODE",
        value_parser = RuleSelectorParser,
        hide_possible_values = true,
    )]
    pub select: Option<Vec<RuleSelector>>,

    /// Specify which rules to ignore.
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "RULE_CODE",
        value_parser = RuleSelectorParser,
        hide_possible_values = true,
    )]
    pub ignore: Option<Vec<RuleSelector>>,

    /// Show statistics after processing.
    #[arg(long)]
    pub statistics: bool,

    /// Output format of the diagnostics.
    #[arg(long, value_enum, default_value_t)]
    pub output_format: OutputFormat,

    /// Whether fixes may add imports.
    #[arg(long, value_enum, default_value_t)]
    pub imports: ImportMode,

    /// Also check generated files (*.g.cs, *.designer.cs, <auto-generated>).
    #[arg(long)]
    pub include_generated: bool,

    /// Compile without the System.Globalization reference library.
    #[arg(long)]
    pub no_globalization: bool,

    /// Increase logging verbosity (-v: debug, -vv: trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

// The whole point of selector is to deal with the --select ALL
// option in the CLI.
//
// It also customizes the possible values, printed when one types --select
// with no extra arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleSelector {
    All,
    Selection(Rule),
}

impl RuleSelector {
    pub fn rules(&self) -> Vec<Rule> {
        match self {
            Self::All => Rule::iter().collect(),
            Self::Selection(selection) => vec![*selection],
        }
    }
}

impl std::str::FromStr for RuleSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALL" => Ok(Self::All),
            _ => Ok(Self::Selection(s.parse()?)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleSelectorParser;

impl TypedValueParser for RuleSelectorParser {
    type Value = RuleSelector;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let value = value
            .to_str()
            .ok_or_else(|| clap::Error::new(clap::error::ErrorKind::InvalidUtf8))?;

        value.parse().map_err(|_| {
            let mut error = clap::Error::new(clap::error::ErrorKind::ValueValidation).with_cmd(cmd);
            if let Some(arg) = arg {
                error.insert(
                    clap::error::ContextKind::InvalidArg,
                    clap::error::ContextValue::String(arg.to_string()),
                );
            }
            error.insert(
                clap::error::ContextKind::InvalidValue,
                clap::error::ContextValue::String(value.to_string()),
            );
            error
        })
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        Some(Box::new(
            std::iter::once(PossibleValue::new("ALL").help("all rules")).chain(Rule::iter().map(
                |rule| {
                    let code: String = rule.to_string();
                    PossibleValue::new(code).help(rule.descriptor().title)
                },
            )),
        ))
    }
}

/// Expand `--select` and `--ignore` into the rules to run.
///
/// Without `--select`, the rules enabled by default run.
pub fn selected_rules(
    select: Option<&[RuleSelector]>,
    ignore: Option<&[RuleSelector]>,
) -> Vec<Rule> {
    let mut rules: Vec<Rule> = match select {
        Some(selection) => selection
            .iter()
            .flat_map(RuleSelector::rules)
            .unique()
            .collect(),
        None => Rule::iter()
            .filter(|rule| rule.descriptor().enabled_by_default)
            .collect(),
    };

    // Does not crash if rules to ignore were not selected.
    if let Some(selection) = ignore {
        rules.retain(|rule| {
            !selection
                .iter()
                .any(|selector| selector.rules().contains(rule))
        });
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CheckCommand {
        let args = Args::try_parse_from(std::iter::once("strconcat").chain(args.iter().copied()))
            .unwrap();
        match args.command {
            Command::Check(check) => check,
            Command::GenerateCompletions { .. } => panic!("expected check"),
        }
    }

    #[test]
    fn defaults() {
        let check = parse(&["check", "a.cs"]);
        assert_eq!(check.output_format, OutputFormat::Text);
        assert_eq!(check.imports, ImportMode::Auto);
        assert_eq!(check.verbose, 0);
        assert_eq!(
            selected_rules(check.select.as_deref(), check.ignore.as_deref()),
            [Rule::StringConcatConversion]
        );
    }

    #[test]
    fn selectors() {
        let check = parse(&["check", "a.cs", "--select", "ALL", "--ignore", "SCC", "-vv"]);
        assert_eq!(check.verbose, 2);
        assert!(selected_rules(check.select.as_deref(), check.ignore.as_deref()).is_empty());

        let check = parse(&["check", "a.cs", "--select", "SCC,ALL"]);
        assert_eq!(
            selected_rules(check.select.as_deref(), check.ignore.as_deref()),
            [Rule::StringConcatConversion]
        );
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert!(Args::try_parse_from(["strconcat", "check", "a.cs", "--select", "XYZ"]).is_err());
    }

    #[test]
    fn formats_and_import_modes() {
        let check = parse(&["check", "a.cs", "--output-format", "json", "--imports", "never"]);
        assert_eq!(check.output_format, OutputFormat::Json);
        assert_eq!(check.imports, ImportMode::Never);
    }
}

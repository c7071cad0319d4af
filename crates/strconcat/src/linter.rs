//! Named linter for archaic reasons: it should be a checker.
use std::collections::HashMap;

use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::analysis::{analyze, is_generated};
use crate::cancel::CancellationToken;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::fix::ConversionFixer;
use crate::project::{Document, Project, Snapshot};
use crate::range::TextRange;
use crate::registry::Rule;
use crate::settings::Settings;

pub type Counter = HashMap<Rule, usize>;

/// Diagnostics for one snapshot, honoring rule selection and the
/// generated-code skip.
pub fn check(
    snapshot: &Snapshot,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<Vec<Diagnostic>> {
    if !settings.is_enabled(Rule::StringConcatConversion) {
        return Ok(Vec::new());
    }
    let document = &snapshot.document;
    if !settings.include_generated
        && is_generated(document.path(), document.text(), document.tree().header())
    {
        debug!(path = %document.path().display(), "skipping generated document");
        return Ok(Vec::new());
    }
    analyze(snapshot, cancel)
}

/// Check every document of `project`, one result per document, in order.
pub fn check_project(
    project: &Project,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Result<Vec<Vec<Diagnostic>>> {
    project
        .snapshots()
        .par_iter()
        .map(|snapshot| check(snapshot, settings, cancel))
        .collect()
}

/// Get the line around a range to print for visualization.
///
/// Highlights the range in red.
fn get_context_message(text: &str, range: TextRange) -> String {
    let start = range.start();
    let end = range.end();

    let ctx_start = text[..start].rfind('\n').map_or(0, |pos| pos + 1);
    // Multi-line ranges only show their first line.
    let highlight_end = text[start..end].find('\n').map_or(end, |pos| start + pos);
    let ctx_end = text[highlight_end..]
        .find(['\r', '\n'])
        .map_or(text.len(), |pos| highlight_end + pos);

    let prefix = &text[ctx_start..start];
    let highlighted = &text[start..highlight_end];
    let suffix = &text[highlight_end..ctx_end];

    format!("{}{}{}", prefix, highlighted.red(), suffix)
        .trim()
        .to_string()
}

fn get_rich_context_message(text: &str, diagnostic: &Diagnostic) -> String {
    let fixable = if diagnostic.is_fixable() {
        format!("[{}]", "*".to_string().cyan())
    } else {
        "   ".to_string()
    };
    let location = diagnostic
        .location
        .as_ref()
        .map_or_else(|| "<hidden>".to_string(), ToString::to_string);
    let mut message = format!(
        "{}: {:<3} {} {}",
        location.bold(),
        format!("{}", diagnostic.kind).cyan(),
        fixable,
        diagnostic.message,
    );
    if let Some(range) = diagnostic.range {
        message.push_str("\n    ");
        message.push_str(&get_context_message(text, range));
    }
    message
}

const MAX_ITERATIONS: usize = 100;

/// Repeatedly fix document `index` of `project` until stable.
///
/// Every pass re-binds and re-analyzes, then applies the first fixable
/// diagnostic ("first match wins, re-resolve after each edit"). The number
/// of passes is bounded by the fixable diagnostics found on the first pass
/// plus `MAX_ITERATIONS`.
//
// cf
// ruff_linter/src/linter.rs::lint_fix
// https://github.com/astral-sh/ruff/blob/main/crates/ruff_linter/src/linter.rs
pub fn fix_document(
    project: Project,
    index: usize,
    settings: &Settings,
    fixer: &ConversionFixer,
    cancel: &CancellationToken,
) -> Result<(Project, Counter)> {
    let mut project = project;
    let mut fixed = Counter::new();
    let mut iterations = 0;
    let mut budget = None;

    loop {
        let Some(snapshot) = project.snapshot(index) else {
            break;
        };
        let diagnostics = check(&snapshot, settings, cancel)?;

        let limit = *budget.get_or_insert_with(|| {
            diagnostics.iter().filter(|d| d.is_fixable()).count() + MAX_ITERATIONS
        });

        // Select the first diagnostic that can be fixed, and exit if there is none
        let Some((rule, range)) = diagnostics.iter().find_map(|diagnostic| {
            diagnostic
                .range
                .filter(|_| diagnostic.is_fixable())
                .map(|range| (diagnostic.kind, range))
        }) else {
            break;
        };

        let document = fixer.apply_fix(&snapshot, range, cancel)?;
        if document.text() == snapshot.document.text() {
            debug!(?range, "fix made no progress");
            break;
        }
        *fixed.entry(rule).or_insert(0) += 1;
        project = project.replace_document(index, document);

        iterations += 1;
        if iterations == limit {
            warn!(
                path = %snapshot.document.path().display(),
                "exceeded maximum iterations in fix"
            );
            break;
        }
    }

    Ok((project, fixed))
}

/// Fix every document of `project` in turn.
pub fn fix_project(
    project: Project,
    settings: &Settings,
    fixer: &ConversionFixer,
    cancel: &CancellationToken,
) -> Result<(Project, Counter)> {
    let mut project = project;
    let mut fixed = Counter::new();
    for index in 0..project.documents().len() {
        let (next, counter) = fix_document(project, index, settings, fixer, cancel)?;
        project = next;
        for (rule, count) in counter {
            *fixed.entry(rule).or_insert(0) += count;
        }
    }
    Ok((project, fixed))
}

/// Fix a single standalone document given as text.
pub fn fix(text: &str, settings: &Settings) -> Result<(String, Counter)> {
    let project =
        Project::new(&settings.references).with_document(Document::parse("Test0.cs", text)?);
    let (project, fixed) = fix_document(
        project,
        0,
        settings,
        &ConversionFixer::default(),
        &CancellationToken::new(),
    )?;
    let text = project
        .document(0)
        .map_or_else(|| text.to_string(), |document| document.text().to_string());
    Ok((text, fixed))
}

// https://github.com/astral-sh/ruff/blob/fc59e1b17f0a538a0150ea5a63de6305a8810c62/crates/ruff_linter/src/linter.rs#L382
pub fn lint_only(text: &str, diagnostics: &[Diagnostic]) -> (Vec<String>, Counter) {
    let mut statistics = Counter::new();
    let messages = diagnostics
        .iter()
        .map(|diagnostic| {
            *statistics.entry(diagnostic.kind).or_insert(0) += 1;
            get_rich_context_message(text, diagnostic)
        })
        .collect();

    (messages, statistics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reference;

    const PROGRAM: &str = r#"
using System;

class Program
{
    string Main(int val, double ratio)
    {
        string s = "ratio: " + ratio;
        s += val;
        return "hi: " + val + s;
    }
}
"#;

    test_rule!(flags_int, r#"class P { string M(int v) { return "" + v; } }"#, false);
    test_rule!(flags_char, r#"class P { string M(char c) { return "" + c; } }"#, false);
    test_rule!(ignores_strings, r#"class P { string M(string v) { return "" + v; } }"#, true);
    test_rule!(ignores_numeric_add, r#"class P { int M(int v) { return 1 + v; } }"#, true);
    test_rule!(ignores_explicit_calls, r#"class P { string M(int v) { return "" + v.ToString(); } }"#, true);
    test_rule!(ignores_guid, r#"using System; class P { string M(Guid g) { return "" + g; } }"#, true);

    test_fix!(
        fixes_every_occurrence,
        PROGRAM,
        r#"
using System;
using System.Globalization;

class Program
{
    string Main(int val, double ratio)
    {
        string s = "ratio: " + ratio.ToString(CultureInfo.InvariantCulture);
        s += val.ToString(CultureInfo.InvariantCulture);
        return "hi: " + val.ToString(CultureInfo.InvariantCulture) + s;
    }
}
"#
    );

    test_fix!(
        fixes_nothing_without_diagnostics,
        "class P { string M(string v) { return \"\" + v; } }",
        "class P { string M(string v) { return \"\" + v; } }"
    );

    fn project(documents: &[(&str, &str)]) -> Project {
        documents
            .iter()
            .fold(Project::new(&Reference::ALL), |project, (path, text)| {
                project.with_document(Document::parse(*path, *text).unwrap())
            })
    }

    #[test]
    fn counts_fixes() {
        let (_, fixed) = fix(PROGRAM, &Settings::default()).unwrap();
        assert_eq!(fixed.get(&Rule::StringConcatConversion), Some(&3));
    }

    #[test]
    fn deselected_rule_reports_nothing() {
        let settings = Settings {
            rules: Vec::new(),
            ..Settings::default()
        };
        let project = project(&[("Program.cs", PROGRAM)]);
        let diagnostics = check_project(&project, &settings, &CancellationToken::new()).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_empty());
        assert_eq!(fix(PROGRAM, &settings).unwrap().0, PROGRAM);
    }

    #[test]
    fn generated_documents_are_skipped_unless_included() {
        let project = project(&[("Program.g.cs", PROGRAM)]);
        let cancel = CancellationToken::new();
        let skipped = check_project(&project, &Settings::default(), &cancel).unwrap();
        assert!(skipped[0].is_empty());

        let settings = Settings {
            include_generated: true,
            ..Settings::default()
        };
        let included = check_project(&project, &settings, &cancel).unwrap();
        assert_eq!(included[0].len(), 3);
    }

    #[test]
    fn missing_globalization_disables_the_rule() {
        let settings = Settings {
            references: vec![Reference::Core],
            ..Settings::default()
        };
        let project = Project::new(&settings.references)
            .with_document(Document::parse("Program.cs", PROGRAM).unwrap());
        let diagnostics = check_project(&project, &settings, &CancellationToken::new()).unwrap();
        assert!(diagnostics[0].is_empty());
    }

    #[test]
    fn projects_bind_across_documents() {
        let model = "namespace App { public struct Money { public string ToString(System.IFormatProvider p) { return \"\"; } } }";
        let user = "namespace App { class P { string M(Money m) { return \"cost: \" + m; } } }";
        let project = project(&[("Money.cs", model), ("P.cs", user)]);
        let settings = Settings::default();
        let cancel = CancellationToken::new();
        let diagnostics = check_project(&project, &settings, &cancel).unwrap();
        assert!(diagnostics[0].is_empty());
        assert_eq!(diagnostics[1].len(), 1);

        let (project, fixed) =
            fix_project(project, &settings, &ConversionFixer::default(), &cancel).unwrap();
        assert_eq!(fixed.values().sum::<usize>(), 1);
        assert_eq!(project.document(0).unwrap().text(), model);
        assert!(project.document(1).unwrap().text().contains(
            "\"cost: \" + m.ToString(CultureInfo.InvariantCulture)"
        ));
    }

    #[test]
    fn context_messages_show_the_flagged_line() {
        colored::control::set_override(false);
        let document = Document::parse("Program.cs", PROGRAM).unwrap();
        let snapshot = Snapshot::standalone(&Reference::ALL, document);
        let diagnostics = check(&snapshot, &Settings::default(), &CancellationToken::new()).unwrap();
        let (messages, statistics) = lint_only(PROGRAM, &diagnostics);
        assert_eq!(statistics.get(&Rule::StringConcatConversion), Some(&3));
        assert_eq!(
            messages[1],
            "Program.cs:9:14: SCC [*] Call method 'int.ToString(System.IFormatProvider)' on type 'Int32'.\n    s += val;"
        );
    }

    #[test]
    fn fix_all_is_not_capped_at_a_fixed_count() {
        let count = 120;
        let parameters = (0..count)
            .map(|idx| format!("int a{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        let body: String = (0..count)
            .map(|idx| format!("        s += a{idx};\n"))
            .collect();
        let text = format!(
            "class P\n{{\n    string M({parameters})\n    {{\n        string s = \"\";\n{body}        return s;\n    }}\n}}\n"
        );

        let settings = Settings::default();
        let (fixed_text, fixed) = fix(&text, &settings).unwrap();
        assert_eq!(fixed.get(&Rule::StringConcatConversion), Some(&count));
        assert_eq!(
            fixed_text.matches(".ToString(CultureInfo.InvariantCulture)").count(),
            count
        );

        let document = Document::parse("Test0.cs", fixed_text).unwrap();
        let snapshot = Snapshot::standalone(&Reference::ALL, document);
        assert!(check(&snapshot, &settings, &CancellationToken::new()).unwrap().is_empty());
    }

    #[test]
    fn long_concatenations_are_bound_without_deep_recursion() {
        let count = 5000;
        let operands = " + a".repeat(count);
        let text = format!("class P {{ string M(int a) {{ return \"x\"{operands}; }} }}");
        let project = project(&[("Long.cs", text.as_str())]);
        let diagnostics =
            check_project(&project, &Settings::default(), &CancellationToken::new()).unwrap();
        assert_eq!(diagnostics[0].len(), count);
    }

    #[test]
    fn cancelled_fix_all_fails() {
        let project = project(&[("Program.cs", PROGRAM)]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = fix_document(
            project,
            0,
            &Settings::default(),
            &ConversionFixer::default(),
            &cancel,
        );
        assert!(result.unwrap_err().is_cancelled());
    }
}

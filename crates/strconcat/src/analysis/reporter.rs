use super::matcher::ConversionMatch;
use crate::bind::{BoundUnit, OperationId};
use crate::diagnostic::Diagnostic;
use crate::model::Compilation;
use crate::registry::Rule;
use crate::source_map::SourceMap;

/// Fill a positional message format: `{0}`, `{1}`, ...
pub fn format_message(format: &str, arguments: &[&str]) -> String {
    arguments
        .iter()
        .enumerate()
        .fold(format.to_string(), |message, (idx, argument)| {
            message.replace(&format!("{{{idx}}}"), argument)
        })
}

/// Build the diagnostic for the qualifying conversion `node`.
///
/// Nodes that fall in a hidden source region are reported without range or
/// location.
pub fn report(
    compilation: &Compilation,
    unit: &BoundUnit,
    node: OperationId,
    found: &ConversionMatch,
    text: &str,
    source_map: &SourceMap,
) -> Diagnostic {
    let rule = Rule::StringConcatConversion;
    let descriptor = rule.descriptor();
    let method = compilation
        .member(found.method)
        .as_method()
        .map(|method| compilation.display_method(method))
        .unwrap_or_default();
    let message = format_message(
        descriptor.message_format,
        &[&method, &found.operand_type_name],
    );

    let range = unit.get(node).syntax.range;
    let location = source_map.location(text, range.start());
    Diagnostic {
        kind: rule,
        message,
        severity: descriptor.default_severity,
        range: location.as_ref().map(|_| range),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_positional_arguments() {
        assert_eq!(
            format_message("Call method '{0}' on type '{1}'.", &["a.B()", "A"]),
            "Call method 'a.B()' on type 'A'."
        );
        assert_eq!(format_message("{1}{0}{1}", &["x", "y"]), "yxy");
    }
}

/// Macro to test whether the rule flags a snippet.
#[macro_export]
macro_rules! test_rule {
    ($name:ident, $text:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let text = $text;
            let document = $crate::project::Document::parse("Test0.cs", text).unwrap();
            let snapshot = $crate::project::Snapshot::standalone(
                &$crate::model::Reference::ALL,
                document,
            );
            let cancel = $crate::cancel::CancellationToken::new();
            let diagnostics = $crate::analysis::analyze(&snapshot, &cancel).unwrap();
            assert_eq!(diagnostics.is_empty(), $expected, "(text: {text})");
        }
    };
}

/// Macro to test fixing every diagnostic of a snippet.
#[macro_export]
macro_rules! test_fix {
    ($name:ident, $text:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let text = $text;
            let settings = $crate::settings::Settings::default();
            let (received, _) = $crate::linter::fix(text, &settings).unwrap();
            pretty_assertions::assert_eq!(received, $expected, "(text: {text})");
        }
    };
}

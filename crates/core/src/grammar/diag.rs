pub use cmdlint_diagnostics::{Diagnostic, LineIndex, Severity, Span, codes, render_message};

mod formatter;

pub use formatter::DiagnosticFormatter;

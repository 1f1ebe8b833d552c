//! Terminal diagnostics for compile errors.
//!
//! Parse errors carry a source span and are rendered with a labelled snippet;
//! other compile errors are reported as plain diagnostics with an error code.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use jovian_engine::CompileError;
use termcolor::{ColorChoice, StandardStream};

/// Resolve `ColorChoice` from the `--color` flag and environment.
///
/// `NO_COLOR` wins over the flag.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

pub fn error_code(err: &CompileError) -> &'static str {
    match err {
        CompileError::Parse(_) => "E0001",
        CompileError::UnresolvedIdentifier { .. } => "E0002",
        CompileError::UnknownClass { .. } => "E0003",
        CompileError::MalformedExpression { .. } => "E0004",
        CompileError::UnknownMember { .. } => "E0005",
        CompileError::TypeMismatch { .. } => "E0006",
        CompileError::DuplicateDefinition { .. } => "E0007",
        CompileError::CapturedLocal { .. } => "E0008",
        CompileError::InvalidModule { .. } => "E0009",
        CompileError::Io { .. } => "E0010",
        CompileError::ConditionalBinding { .. } => "E0011",
        CompileError::Internal { .. } => "E9999",
    }
}

pub fn diagnostic(file_id: usize, err: &CompileError) -> Diagnostic<usize> {
    let diagnostic = Diagnostic::error()
        .with_message(err.to_string())
        .with_code(error_code(err));

    match err {
        CompileError::Parse(parse) => match parse.span() {
            Some(span) => diagnostic.with_labels(vec![
                Label::primary(file_id, span.start..span.end).with_message("here")
            ]),
            None => diagnostic,
        },
        CompileError::InvalidModule { errors } => diagnostic.with_notes(errors.clone()),
        _ => diagnostic,
    }
}

pub fn emit_compile_error(name: &str, source: &str, err: &CompileError, color: ColorChoice) {
    let mut files = SimpleFiles::new();
    let file_id = files.add(name, source);
    let writer = StandardStream::stderr(color);
    let config = term::Config::default();

    let mut lock = writer.lock();
    if let Err(render) = term::emit(&mut lock, &config, &files, &diagnostic(file_id, err)) {
        log::warn!("failed to render diagnostic: {}", render);
        eprintln!("error: {}", err);
    }
}

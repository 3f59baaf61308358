//! Token and diagnostic export.
//!
//! CSV rows follow RFC 4180: fields containing a comma, quote, or line
//! break are quoted, with embedded quotes doubled. JSON output uses the
//! serde representation of the data model and reads back losslessly.

use std::io::Write;

use crate::Analysis;
use crate::Error;
use crate::lexer::LexError;
use crate::token::Token;

/// Write one `kind,lexeme,line,column` row per token, after a header.
pub fn write_tokens_csv<W: Write>(mut writer: W, tokens: &[Token]) -> Result<(), Error> {
    writeln!(writer, "kind,lexeme,line,column")?;
    for token in tokens {
        writeln!(
            writer,
            "{},{},{},{}",
            token.kind,
            csv_field(&token.text),
            token.span.line,
            token.span.column
        )?;
    }
    Ok(())
}

/// Write one `kind,message,lexeme,line,column` row per error, after a
/// header.
pub fn write_errors_csv<W: Write>(mut writer: W, errors: &[LexError]) -> Result<(), Error> {
    writeln!(writer, "kind,message,lexeme,line,column")?;
    for error in errors {
        writeln!(
            writer,
            "{:?},{},{},{},{}",
            error.kind,
            csv_field(&error.message()),
            csv_field(&error.lexeme),
            error.span.line,
            error.span.column
        )?;
    }
    Ok(())
}

/// Serialize a full analysis (tokens, errors, tree, warnings) as
/// pretty-printed JSON.
pub fn to_json(analysis: &Analysis) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

/// Write tokens as a JSON array.
pub fn write_tokens_json<W: Write>(writer: W, tokens: &[Token]) -> Result<(), Error> {
    serde_json::to_writer_pretty(writer, tokens)?;
    Ok(())
}

/// Read tokens written by [`write_tokens_json`] or the `tokens` field
/// of [`to_json`].
pub fn tokens_from_json(input: &str) -> Result<Vec<Token>, Error> {
    Ok(serde_json::from_str(input)?)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

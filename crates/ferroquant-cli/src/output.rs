pub mod stream_writer;

use std::io;

use ferroquant_core::Envelope;
use serde_json::json;
use serde_json::Value;

use self::stream_writer::{NdjsonStreamWriter, StreamEventError};
use crate::cli::OutputFormat;
use crate::error::CliError;

/// Keys under `data` that hold `{columns, rows}` tables.
const TABLE_KEYS: [&str; 2] = ["table", "summary"];

pub fn render(
    envelope: &Envelope<Value>,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Ndjson => {
            let payload = serde_json::to_string(envelope)?;
            println!("{payload}");
        }
        OutputFormat::Table => render_table(envelope)?,
    }

    Ok(())
}

pub fn render_stream(envelope: &Envelope<Value>) -> Result<(), CliError> {
    let stdout = io::stdout();
    write_stream(envelope, &mut NdjsonStreamWriter::new(stdout.lock()))
}

fn write_stream<W: io::Write>(
    envelope: &Envelope<Value>,
    writer: &mut NdjsonStreamWriter<W>,
) -> Result<(), CliError> {
    writer.emit_start(Some(json!({
        "request_id": envelope.meta.request_id,
        "trace_id": envelope.meta.trace_id,
        "schema_version": envelope.meta.schema_version,
        "engine": envelope.meta.engine,
    })))?;

    writer.emit_progress(Some(json!({
        "phase": "engine_complete",
        "latency_ms": envelope.meta.latency_ms,
        "warning_count": envelope.meta.warnings.len(),
        "error_count": envelope.errors.len(),
    })))?;

    writer.emit_chunk(Some(serde_json::to_value(envelope)?))?;

    for error in &envelope.errors {
        let mut stream_error = StreamEventError::new(error.code.clone(), error.message.clone());
        if let Some(retryable) = error.retryable {
            stream_error = stream_error.with_retryable(retryable);
        }

        let data = error
            .subject
            .as_ref()
            .map(|subject| json!({ "subject": subject }));
        writer.emit_error(stream_error, data)?;
    }

    writer.emit_end(Some(json!({
        "status": if envelope.errors.is_empty() { "ok" } else { "error" },
        "warning_count": envelope.meta.warnings.len(),
        "error_count": envelope.errors.len(),
    })))?;

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<(), CliError> {
    println!("request_id  : {}", envelope.meta.request_id);
    if let Some(trace_id) = &envelope.meta.trace_id {
        println!("trace_id    : {trace_id}");
    }
    println!("schema      : {}", envelope.meta.schema_version);
    println!("generated_at: {}", envelope.meta.generated_at);
    println!("engine      : {}", envelope.meta.engine);
    println!("latency_ms  : {}", envelope.meta.latency_ms);

    if !envelope.meta.warnings.is_empty() {
        println!("warnings:");
        for warning in &envelope.meta.warnings {
            println!("  - {warning}");
        }
    }

    let mut printed_table = false;
    for key in TABLE_KEYS {
        if let Some(lines) = envelope.data.get(key).and_then(format_grid) {
            println!("{key}:");
            for line in lines {
                println!("  {line}");
            }
            printed_table = true;
        }
    }

    if !printed_table {
        println!("data:");
        let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
        for line in pretty_data.lines() {
            println!("  {line}");
        }
    }

    if !envelope.errors.is_empty() {
        println!("errors:");
        for error in &envelope.errors {
            match &error.subject {
                Some(subject) => println!("  - [{subject}] {}: {}", error.code, error.message),
                None => println!("  - {}: {}", error.code, error.message),
            }
        }
    }

    Ok(())
}

/// Right-aligned text grid for a `{columns, rows}` value; `None` for any
/// other shape.
fn format_grid(value: &Value) -> Option<Vec<String>> {
    let columns = value.get("columns")?.as_array()?;
    let rows = value.get("rows")?.as_array()?;

    let header: Vec<String> = columns
        .iter()
        .map(|column| column.as_str().unwrap_or_default().to_owned())
        .collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .filter_map(Value::as_array)
        .map(|cells| cells.iter().map(format_cell).collect())
        .collect();

    let mut widths: Vec<usize> = header.iter().map(String::len).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let join = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:>width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = Vec::with_capacity(body.len() + 1);
    lines.push(join(&header));
    lines.extend(body.iter().map(|row| join(row)));
    Some(lines)
}

fn format_cell(cell: &Value) -> String {
    match cell {
        Value::Null => String::from("-"),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

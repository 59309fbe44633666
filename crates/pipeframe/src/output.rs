use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pipeframe_frame::Framing;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    index: usize,
    framing: &'a str,
    size: usize,
    payload: String,
}

/// One decoded message for display.
pub struct MessageView<'a> {
    pub index: usize,
    pub framing: Framing,
    pub payload: &'a [u8],
}

impl MessageView<'_> {
    fn to_output(&self) -> MessageOutput<'static> {
        MessageOutput {
            index: self.index,
            framing: self.framing.as_str(),
            size: self.payload.len(),
            payload: payload_preview(self.payload),
        }
    }
}

/// Render one message to `out`.
///
/// `Raw` writes the payload followed by a newline so that decoded output
/// can be fed back to `encode`.
pub fn write_message<W: Write>(
    out: &mut W,
    message: &MessageView<'_>,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let line = serde_json::to_string(&message.to_output())
                .unwrap_or_else(|_| "{}".to_string());
            writeln!(out, "{line}")?;
        }
        OutputFormat::Table => {
            let row = message.to_output();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "FRAMING", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    row.index.to_string(),
                    row.framing.to_string(),
                    row.size.to_string(),
                    row.payload,
                ]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(
                out,
                "#{} framing={} size={} payload={}",
                message.index,
                message.framing,
                message.payload.len(),
                payload_preview(message.payload)
            )?;
        }
        OutputFormat::Raw => {
            out.write_all(message.payload)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

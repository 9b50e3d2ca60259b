use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use northlink_cmd::{ParamEntry, ParameterEntry, SyncReport};
use northlink_frame::Message;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ParamOutput {
    index: u8,
    name: String,
    raw: String,
    value: String,
}

#[derive(Serialize)]
struct TableOutput {
    entries: Vec<ParamOutput>,
    requests: u64,
    misses: u64,
}

pub fn print_params(entries: &[ParamEntry], report: &SyncReport, format: OutputFormat) {
    let rows: Vec<ParamOutput> = entries
        .iter()
        .map(|entry| ParamOutput {
            index: entry.index(),
            name: entry.label(),
            raw: hex(entry.raw()),
            value: hex(entry.value()),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let out = TableOutput {
                entries: rows,
                requests: report.requests,
                misses: report.misses,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "NAME", "RAW", "VALUE"]);
            for row in rows {
                table.add_row(vec![row.index.to_string(), row.name, row.raw, row.value]);
            }
            println!("{table}");
            println!(
                "{} entries, {} requests, {} misses",
                report.entries, report.requests, report.misses
            );
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("[{:>3}] {} raw={} value={}", row.index, row.name, row.raw, row.value);
            }
            println!(
                "entries={} requests={} misses={}",
                report.entries, report.requests, report.misses
            );
        }
    }
}

#[derive(Serialize)]
struct TextOutput<'a> {
    talker: String,
    text: &'a str,
    timestamp: String,
}

pub fn print_text(msg: &Message, format: OutputFormat) {
    let text = msg.text();
    let talker = char::from(msg.talker).to_string();
    match format {
        OutputFormat::Json => {
            let out = TextOutput {
                talker,
                text: &text,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("[{talker}] {}", text.trim_end());
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

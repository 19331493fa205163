// src/formatting.rs

//! Body formatting for the Telegram channel.
//!
//! Account polling reports arrive as free-form text in which each account is
//! announced by a tagged line (`[SUCCESS] name`, `[FAIL] name`,
//! `[BALANCE] name`) optionally followed by a
//! `Current balance: $x, Used: $y` line. When that structure is present the
//! accounts are lifted into a fixed-width table and everything else is kept
//! as a free-text preamble.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const BALANCE_PREFIX: &str = "Current balance: $";
const USED_SEPARATOR: &str = ", Used: $";
const PLACEHOLDER: &str = "-";
const HEADERS: [&str; 3] = ["帳號", "餘額($)", "已用($)"];
const COLUMN_GAP: &str = "  ";

/// A trait for turning a title and a body into the final message text.
pub trait TextFormatter: Send + Sync {
    fn format(&self, title: &str, content: &str) -> String;
}

/// The tag that opens a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTag {
    Success,
    Fail,
    Balance,
}

impl StatusTag {
    const ALL: [StatusTag; 3] = [StatusTag::Success, StatusTag::Fail, StatusTag::Balance];

    fn literal(self) -> &'static str {
        match self {
            StatusTag::Success => "[SUCCESS]",
            StatusTag::Fail => "[FAIL]",
            StatusTag::Balance => "[BALANCE]",
        }
    }
}

/// Classification of a single body line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Status { tag: StatusTag, label: &'a str },
    BalanceDetail { balance: &'a str, used: &'a str },
    Plain,
}

/// Classifies one line of body text. Status tags take precedence over the
/// balance pattern.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if let Some(tag) = StatusTag::ALL
        .into_iter()
        .find(|tag| trimmed.starts_with(tag.literal()))
    {
        let label = match trimmed.find(']') {
            Some(end) => trimmed[end + 1..].trim(),
            // Unreachable given the prefix check; kept as a fallback.
            None => trimmed,
        };
        return LineKind::Status { tag, label };
    }

    match find_balance(line) {
        Some((balance, used)) => LineKind::BalanceDetail { balance, used },
        None => LineKind::Plain,
    }
}

/// Finds `Current balance: $<n>, Used: $<n>` anywhere in `line` and returns
/// the two amounts as text.
pub fn find_balance(line: &str) -> Option<(&str, &str)> {
    for (idx, _) in line.match_indices(BALANCE_PREFIX) {
        let rest = &line[idx + BALANCE_PREFIX.len()..];
        let Some((balance, rest)) = split_amount(rest) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(USED_SEPARATOR) else {
            continue;
        };
        let Some((used, _)) = split_amount(rest) else {
            continue;
        };
        return Some((balance, used));
    }
    None
}

/// Splits a leading decimal amount (`digits[.digits]`) off `s`.
fn split_amount(s: &str) -> Option<(&str, &str)> {
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    if int_len == 0 {
        return None;
    }

    let mut end = int_len;
    if let Some(fraction) = s[int_len..].strip_prefix('.') {
        let frac_len = fraction.bytes().take_while(u8::is_ascii_digit).count();
        if frac_len > 0 {
            end += 1 + frac_len;
        }
    }
    Some(s.split_at(end))
}

/// Returns true when the body carries balance information worth tabulating.
pub fn has_balance_structure(content: &str) -> bool {
    content.lines().any(|line| {
        line.trim().starts_with(StatusTag::Balance.literal()) || find_balance(line).is_some()
    })
}

/// One table row, in encounter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub account: String,
    pub balance: String,
    pub used: String,
}

impl BalanceRow {
    fn cells(&self) -> [&str; 3] {
        [&self.account, &self.balance, &self.used]
    }
}

/// The rows lifted out of a body plus the text that was left behind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableExtraction {
    pub rows: Vec<BalanceRow>,
    pub remainder: String,
}

/// Walks the body, producing one row per status line and the remaining text.
///
/// A balance line directly under a status line is consumed by it and appears
/// neither in the remainder nor under any other row.
pub fn extract_table(content: &str) -> TableExtraction {
    let lines: Vec<&str> = content.lines().collect();
    let mut rows = Vec::new();
    let mut skipped: HashSet<usize> = HashSet::new();

    for (i, line) in lines.iter().enumerate() {
        let LineKind::Status { label, .. } = classify_line(line) else {
            continue;
        };
        skipped.insert(i);

        let (balance, used) = match lines.get(i + 1).and_then(|next| find_balance(next)) {
            Some(amounts) => {
                skipped.insert(i + 1);
                amounts
            }
            None => (PLACEHOLDER, PLACEHOLDER),
        };

        rows.push(BalanceRow {
            account: label.to_string(),
            balance: balance.to_string(),
            used: used.to_string(),
        });
    }

    let remainder = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !skipped.contains(i))
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    TableExtraction { rows, remainder }
}

/// Renders the header and rows as aligned columns, without the `<pre>` wrapper.
///
/// Widths are measured in characters.
pub fn render_table(rows: &[BalanceRow]) -> String {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render_row = |cells: [&str; 3]| {
        format!(
            "{:<w0$}{gap}{:>w1$}{gap}{:>w2$}",
            cells[0],
            cells[1],
            cells[2],
            gap = COLUMN_GAP,
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
        )
    };

    std::iter::once(render_row(HEADERS))
        .chain(rows.iter().map(|row| render_row(row.cells())))
        .collect::<Vec<_>>()
        .join("\n")
}

/// How the Telegram body should be laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableMode {
    /// Tabulate only when balance structure is detected.
    #[default]
    Auto,
    Table,
    Plain,
}

impl TableMode {
    /// Resolves the mode against a concrete body; true means table layout.
    pub fn use_table(self, content: &str) -> bool {
        match self {
            TableMode::Table => true,
            TableMode::Plain => false,
            TableMode::Auto => has_balance_structure(content),
        }
    }
}

impl From<String> for TableMode {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => TableMode::Table,
            "plain" => TableMode::Plain,
            _ => TableMode::Auto,
        }
    }
}

impl From<TableMode> for String {
    fn from(mode: TableMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableMode::Auto => write!(f, "auto"),
            TableMode::Table => write!(f, "table"),
            TableMode::Plain => write!(f, "plain"),
        }
    }
}

/// Builds the HTML message sent to Telegram.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramFormatter {
    mode: TableMode,
}

impl TelegramFormatter {
    pub fn new(mode: TableMode) -> Self {
        Self { mode }
    }

    fn plain(title: &str, content: &str) -> String {
        format!("<b>{}</b>\n\n{}", title, content)
    }
}

impl TextFormatter for TelegramFormatter {
    fn format(&self, title: &str, content: &str) -> String {
        if !self.mode.use_table(content) {
            return Self::plain(title, content);
        }

        let extraction = extract_table(content);
        if extraction.rows.is_empty() {
            return Self::plain(title, content);
        }

        let table = render_table(&extraction.rows);
        if extraction.remainder.is_empty() {
            format!("<b>{}</b>\n\n<pre>{}</pre>", title, table)
        } else {
            format!(
                "<b>{}</b>\n\n{}\n\n<pre>{}</pre>",
                title, extraction.remainder, table
            )
        }
    }
}

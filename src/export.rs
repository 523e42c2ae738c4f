//! CSV export of the filtered order view.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::fmt;

use crate::models::order::Order;
use crate::render::format_amount;

pub const EXPORT_HEADERS: [&str; 6] = [
    "Order Number",
    "Table Number",
    "Status",
    "Total Amount",
    "Items",
    "Created At",
];

/// A finished export, ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Csv(e) => write!(f, "CSV error: {e}"),
            ExportError::Io(e) => write!(f, "Export buffer error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e)
    }
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("orders_{}.csv", date.format("%Y-%m-%d"))
}

/// `2x Garlic Naan, 1x Dal Makhani`
pub fn items_summary(order: &Order) -> String {
    order
        .items()
        .iter()
        .map(|item| format!("{}x {}", item.quantity(), item.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `10/19/2026, 2:05:09 PM` in `tz`, or `Unknown`.
pub fn created_at_display<Tz: TimeZone>(tz: &Tz, timestamp: Option<DateTime<Utc>>) -> String
where
    Tz::Offset: fmt::Display,
{
    match timestamp {
        Some(t) => t.with_timezone(tz).format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Serialize `orders` in the given order, one row each. Every field is
/// quoted. An empty slice yields the header row alone.
pub fn write_orders_csv<Tz: TimeZone>(orders: &[&Order], tz: &Tz) -> Result<String, ExportError>
where
    Tz::Offset: fmt::Display,
{
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for order in orders {
        writer.write_record([
            order.order_number_display().to_string(),
            order.table_number_display().to_string(),
            order.effective_status().as_str().to_string(),
            format_amount(order.total()),
            items_summary(order),
            created_at_display(tz, order.timestamp),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Io(e.to_string()))
}

/// Export with local display times, named after today's local date.
pub fn export_orders(orders: &[&Order]) -> Result<CsvExport, ExportError> {
    let body = write_orders_csv(orders, &Local)?;
    Ok(CsvExport {
        filename: export_filename(Local::now().date_naive()),
        body,
    })
}

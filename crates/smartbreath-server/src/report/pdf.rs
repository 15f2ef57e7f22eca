//! Minimal single-page PDF assembly for measurement reports.
//!
//! The report is a fixed, text-only A4 page, so the handful of PDF objects
//! it needs are assembled directly (no external dependency needed).

use chrono::{DateTime, Utc};

use crate::storage::{Machine, Record, User};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Render a one-page PDF summarising a measurement record.
pub fn render_record_report(
    record: &Record,
    machine: &Machine,
    owner: Option<&User>,
) -> Result<Vec<u8>, ReportError> {
    let mut lines = vec![
        format!("Device: {} ({})", machine.device_name, machine.model),
        format!("Machine ID: {}", machine.id),
    ];
    if let Some(owner) = owner {
        lines.push(format!(
            "Patient: {} {} ({})",
            owner.first_name, owner.last_name, owner.username
        ));
    }
    lines.push(String::new());
    lines.push(format!("Measured at: {}", format_timestamp(record.measured_at)?));
    lines.push(format!("SpO2: {} %", record.spo2));
    lines.push(format!("FEV1: {:.2} L", record.fev1));
    lines.push(format!("FVC: {:.2} L", record.fvc));
    lines.push(format!("FEV1/FVC: {:.1} %", record.fev1_fvc * 100.0));
    lines.push(format!("PEF: {:.2} L/min", record.pef));
    lines.push(String::new());
    lines.push(format!("Record ID: {}", record.id));
    lines.push(format!("Recorded: {}", format_timestamp(record.created_at)?));

    let mut content = String::from("BT\n/F1 18 Tf\n50 780 Td\n(SmartBreath Measurement Report) Tj\nET\n");
    let mut y = 740;
    for line in &lines {
        if !line.is_empty() {
            content.push_str(&format!(
                "BT\n/F2 11 Tf\n50 {y} Td\n({}) Tj\nET\n",
                escape_text(line)
            ));
        }
        y -= 18;
    }

    let mut doc = PdfWriter::new();
    doc.add_object("<< /Type /Catalog /Pages 2 0 R >>");
    doc.add_object("<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    doc.add_object(
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
         /Resources << /Font << /F1 4 0 R /F2 5 0 R >> >> /Contents 6 0 R >>",
    );
    doc.add_object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>");
    doc.add_object("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>");
    doc.add_stream(&content);

    Ok(doc.finish())
}

/// Incremental PDF 1.4 writer: numbered objects, then the xref table and
/// trailer pointing back at their byte offsets.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    fn add_object(&mut self, body: &str) {
        self.offsets.push(self.buf.len());
        let num = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{num} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn add_stream(&mut self, content: &str) {
        self.offsets.push(self.buf.len());
        let num = self.offsets.len();
        self.buf.extend_from_slice(
            format!(
                "{num} 0 obj\n<< /Length {} >>\nstream\n{content}endstream\nendobj\n",
                content.len()
            )
            .as_bytes(),
        );
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            xref.push_str(&format!("{offset:010} 00000 n \n"));
        }
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf.extend_from_slice(
            format!("trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
                .as_bytes(),
        );
        self.buf
    }
}

/// Escape a line for a PDF literal string. The standard fonts cover Latin
/// text only, so anything outside printable ASCII degrades to '?'.
fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn format_timestamp(secs: i64) -> Result<String, ReportError> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .ok_or(ReportError::InvalidTimestamp(secs))
}

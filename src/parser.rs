// 🏗️ Record Parser
// Reads the raw ledger file and turns each line into a typed Transaction.
//
// Line format: transactionId,subscriptionId,amount,date
// Example:     "17,4,9.99,3/14/1998"

use crate::error::{AnalysisError, Result};
use crate::ledger::Transaction;
use chrono::NaiveDate;
use csv::ByteRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Date layout of the ledger: month/day/4-digit-year, padding optional
pub const DATE_FORMAT: &str = "%m/%d/%Y";

// ============================================================================
// RAW RECORD
// ============================================================================

/// RawRecord - one ledger line, still as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub fields: Vec<String>,

    /// 1-based line in the source file
    pub line_number: usize,

    /// Set when a field was not valid UTF-8; the record cannot be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}

impl RawRecord {
    pub fn new(fields: Vec<String>, line_number: usize) -> Self {
        RawRecord {
            fields,
            line_number,
            decode_error: None,
        }
    }

    /// Decode a byte record field by field, keeping the first failure
    fn from_bytes(record: &ByteRecord, line_number: usize) -> Self {
        let mut decode_error = None;
        let fields = record
            .iter()
            .enumerate()
            .map(|(index, bytes)| match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(e) => {
                    if decode_error.is_none() {
                        decode_error =
                            Some(format!("field {} is not valid UTF-8 ({})", index + 1, e));
                    }
                    String::from_utf8_lossy(bytes).into_owned()
                }
            })
            .collect();

        RawRecord {
            fields,
            line_number,
            decode_error,
        }
    }

    fn field(&self, index: usize, name: &str) -> Result<&str> {
        self.fields
            .get(index)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| AnalysisError::Parse {
                line: self.line_number,
                reason: format!("missing field '{}'", name),
            })
    }

    /// Exported ledgers carry an "Id,..." header row
    pub fn is_header(&self) -> bool {
        self.fields
            .first()
            .map(|f| f.trim_start().starts_with("Id"))
            .unwrap_or(false)
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// RecordParser - source of raw ledger records
pub trait RecordParser {
    /// Read every record from a reader (header rows already skipped)
    fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>>;

    /// Read every record from a file
    fn parse(&self, file_path: &Path) -> Result<Vec<RawRecord>> {
        let file = File::open(file_path)?;
        self.parse_reader(file)
    }

    /// Parser version (for report provenance)
    fn version(&self) -> &str {
        "1.0.0"
    }
}

/// Comma-separated ledger without a mandatory header
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvRecordParser;

impl CsvRecordParser {
    pub fn new() -> Self {
        CsvRecordParser
    }
}

impl RecordParser for CsvRecordParser {
    fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>> {
        use csv::ReaderBuilder;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();

        // Byte records so one badly encoded line stays a per-record problem
        for (index, result) in reader.byte_records().enumerate() {
            let record = result?;
            let line_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1);

            let raw = RawRecord::from_bytes(&record, line_number);
            if raw.is_header() {
                continue;
            }
            records.push(raw);
        }

        Ok(records)
    }
}

// ============================================================================
// FIELD PARSING
// ============================================================================

/// Turn a raw record into a Transaction, or a Parse error naming the line
pub fn parse_record(raw: &RawRecord) -> Result<Transaction> {
    if let Some(reason) = &raw.decode_error {
        return Err(AnalysisError::Parse {
            line: raw.line_number,
            reason: reason.clone(),
        });
    }

    if raw.fields.len() < 4 {
        return Err(AnalysisError::Parse {
            line: raw.line_number,
            reason: format!("expected 4 fields, found {}", raw.fields.len()),
        });
    }

    let parse_err = |reason: String| AnalysisError::Parse {
        line: raw.line_number,
        reason,
    };

    let id_text = raw.field(0, "id")?;
    let id = id_text
        .parse::<u64>()
        .map_err(|_| parse_err(format!("invalid transaction id '{}'", id_text)))?;

    let subscription_text = raw.field(1, "subscription_id")?;
    let subscription_id = subscription_text
        .parse::<u32>()
        .map_err(|_| parse_err(format!("invalid subscription id '{}'", subscription_text)))?;

    let amount_text = raw.field(2, "amount")?;
    let amount = amount_text
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .ok_or_else(|| parse_err(format!("invalid amount '{}'", amount_text)))?;

    let date_text = raw.field(3, "date")?;
    let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
        .map_err(|e| parse_err(format!("invalid date '{}': {}", date_text, e)))?;

    Ok(Transaction {
        id,
        subscription_id,
        amount,
        date,
        line_number: raw.line_number,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(fields: &[&str]) -> RawRecord {
        RawRecord::new(fields.iter().map(|f| f.to_string()).collect(), 7)
    }

    #[test]
    fn test_parse_valid_record() {
        let tx = parse_record(&raw(&["17", "4", "9.99", "3/14/1998"])).unwrap();

        assert_eq!(tx.id, 17);
        assert_eq!(tx.subscription_id, 4);
        assert_eq!(tx.amount, 9.99);
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(1998, 3, 14).unwrap());
        assert_eq!(tx.line_number, 7);
    }

    #[test]
    fn test_parse_accepts_padded_dates_and_spaces() {
        let tx = parse_record(&raw(&[" 1", " 2 ", "10", "01/05/2001 "])).unwrap();
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2001, 1, 5).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        let err = parse_record(&raw(&["1", "2", "10", "2001-01-05"])).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 7, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_amount() {
        let err = parse_record(&raw(&["1", "2", "ten", "1/5/2001"])).unwrap_err();
        assert!(err.to_string().contains("invalid amount"));
    }

    #[test]
    fn test_parse_rejects_short_record() {
        let err = parse_record(&raw(&["1", "2", "10"])).unwrap_err();
        assert!(err.to_string().contains("expected 4 fields"));
    }

    #[test]
    fn test_csv_parser_skips_header() {
        let data = "Id,Subscription Id,Amount,Transaction Date\n1,2,10,1/5/2001\n2,2,10,2/5/2001\n";
        let records = CsvRecordParser::new().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line_number, 2);
        assert_eq!(records[1].fields[3], "2/5/2001");
    }

    #[test]
    fn test_csv_parser_keeps_short_rows_for_reporting() {
        let data = "1,2,10,1/5/2001\n2,2\n";
        let records = CsvRecordParser::new().parse_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert!(parse_record(&records[1]).is_err());
    }

    #[test]
    fn test_csv_parser_flags_invalid_utf8_record() {
        let data: &[u8] = b"1,1,10,1/1/2000\n2,1,\xff\xfe,1/2/2000\n3,1,10,1/3/2000\n";
        let records = CsvRecordParser::new().parse_reader(data).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records[0].decode_error.is_none());
        assert!(records[1].decode_error.is_some());

        let err = parse_record(&records[1]).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 2, .. }));
        assert!(err.to_string().contains("not valid UTF-8"));
    }
}

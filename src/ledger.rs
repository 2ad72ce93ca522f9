use crate::error::{AnalysisError, ErrorScope, ItemError, Result};
use crate::parser::{parse_record, CsvRecordParser, RawRecord, RecordParser};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Transaction - one priced, dated charge against a subscription
/// Immutable once parsed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub subscription_id: u32,
    pub amount: f64,
    pub date: NaiveDate,

    /// Line in the source file (provenance)
    pub line_number: usize,
}

impl Transaction {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// Parsed ledger plus every record that was rejected on the way
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<ItemError>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Ledger {
            transactions,
            rejected: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// SHA-256 over the normalized transactions, identifies the dataset
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.transactions)
    }
}

/// Hash of (id, subscription, amount, date) in file order
pub fn fingerprint(transactions: &[Transaction]) -> String {
    let mut hasher = Sha256::new();
    for tx in transactions {
        hasher.update(format!(
            "{}|{}|{}|{}\n",
            tx.id, tx.subscription_id, tx.amount, tx.date
        ));
    }
    format!("{:x}", hasher.finalize())
}

/// Convert raw records into a ledger.
///
/// Strict mode stops at the first malformed record; lenient mode records it
/// and moves on.
pub fn build_ledger(records: &[RawRecord], strict: bool) -> Result<Ledger> {
    let mut ledger = Ledger::default();

    for raw in records {
        match parse_record(raw) {
            Ok(tx) => ledger.transactions.push(tx),
            Err(e) if strict => return Err(e),
            Err(e) => {
                warn!(line = raw.line_number, error = %e, "skipping malformed record");
                ledger
                    .rejected
                    .push(ItemError::new(ErrorScope::Record, raw.line_number, &e));
            }
        }
    }

    debug!(
        parsed = ledger.transactions.len(),
        rejected = ledger.rejected.len(),
        "ledger built"
    );

    Ok(ledger)
}

/// Read and parse a ledger file
pub fn load_ledger(path: &Path, strict: bool) -> Result<Ledger> {
    let parser = CsvRecordParser::new();
    let records = parser.parse(path).map_err(|e| match e {
        AnalysisError::Io(io) => AnalysisError::Io(std::io::Error::new(
            io.kind(),
            format!("{}: {}", path.display(), io),
        )),
        other => other,
    })?;

    let ledger = build_ledger(&records, strict)?;
    info!(
        file = %path.display(),
        transactions = ledger.len(),
        rejected = ledger.rejected.len(),
        parser = parser.version(),
        "ledger loaded"
    );

    Ok(ledger)
}

/// Parse a ledger from any reader (HTTP bodies, tests)
pub fn read_ledger<R: Read>(reader: R, strict: bool) -> Result<Ledger> {
    let records = CsvRecordParser::new().parse_reader(reader)?;
    build_ledger(&records, strict)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Id,Subscription Id,Amount,Transaction Date
1,1,10,1/1/2000
2,1,10,1/2/2000
3,2,oops,1/1/2000
4,3,25.5,6/1/2001
";

    #[test]
    fn test_strict_mode_aborts_on_bad_record() {
        let err = read_ledger(SAMPLE.as_bytes(), true).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 4, .. }));
    }

    #[test]
    fn test_lenient_mode_reports_and_continues() {
        let ledger = read_ledger(SAMPLE.as_bytes(), false).unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.rejected.len(), 1);
        assert_eq!(ledger.rejected[0].scope, ErrorScope::Record);
        assert_eq!(ledger.rejected[0].id, "4");
        assert_eq!(ledger.transactions[2].year(), 2001);
    }

    #[test]
    fn test_lenient_mode_skips_badly_encoded_record() {
        let data: &[u8] = b"1,1,10,1/1/2000\n2,1,\xff\xfe,1/2/2000\n3,1,10,1/3/2000\n";
        let ledger = read_ledger(data, false).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.rejected.len(), 1);
        assert_eq!(ledger.rejected[0].id, "2");

        let err = read_ledger(data, true).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_fingerprint_is_stable_and_order_sensitive() {
        let ledger = read_ledger(SAMPLE.as_bytes(), false).unwrap();
        let again = read_ledger(SAMPLE.as_bytes(), false).unwrap();
        assert_eq!(ledger.fingerprint(), again.fingerprint());
        assert_eq!(ledger.fingerprint().len(), 64);

        let mut reversed = ledger.transactions.clone();
        reversed.reverse();
        assert_ne!(fingerprint(&reversed), ledger.fingerprint());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_ledger(Path::new("/definitely/not/here.csv"), true).unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}

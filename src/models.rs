use chrono::NaiveDateTime;
use std::mem::size_of;
use std::path::PathBuf;

/// One input row after type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Observation time, or outage start for unavailability records.
    pub timestamp: NaiveDateTime,
    pub destination: String,
    /// Production type or counterparty country.
    pub origin: String,
    pub value: Option<f32>,
    pub resolution_code: Option<String>,
    pub outage: Option<OutageDetails>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutageDetails {
    pub end: Option<NaiveDateTime>,
    pub nominal: Option<f32>,
    pub version: Option<String>,
    pub status: Option<String>,
    pub resource_id: Option<String>,
    pub mrid: Option<String>,
    pub outage_type: Option<String>,
    /// File the record was read from, to trace corrected outages.
    pub from_file: PathBuf,
}

impl RawRecord {
    /// Identity used to drop exact duplicate rows.
    pub(crate) fn dedup_key(&self) -> (NaiveDateTime, &str, Option<u32>, Option<&str>) {
        (
            self.timestamp,
            self.origin.as_str(),
            self.value.map(f32::to_bits),
            self.resolution_code.as_deref(),
        )
    }

    fn heap_bytes(&self) -> usize {
        self.destination.capacity()
            + self.origin.capacity()
            + self.resolution_code.as_ref().map_or(0, String::capacity)
            + self.outage.as_ref().map_or(0, |o| {
                size_of::<OutageDetails>()
                    + [&o.version, &o.status, &o.resource_id, &o.mrid, &o.outage_type]
                        .iter()
                        .map(|s| s.as_ref().map_or(0, String::capacity))
                        .sum::<usize>()
                    + o.from_file.as_os_str().len()
            })
    }
}

/// Unordered set of records from one or more files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<RawRecord>,
}

impl RecordTable {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn concat(tables: Vec<RecordTable>) -> Self {
        let total = tables.iter().map(RecordTable::len).sum();
        let mut records = Vec::with_capacity(total);
        for table in tables {
            records.extend(table.records);
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<RawRecord> {
        self.records
    }

    /// Approximate memory held by the table, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.records.capacity() * size_of::<RawRecord>()
            + self.records.iter().map(RawRecord::heap_bytes).sum::<usize>()
    }
}

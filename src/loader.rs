use crate::error::ExtractError;
use crate::models::{OutageDetails, RawRecord, RecordTable};
use crate::parameters::{FieldRoles, ValueFields, DATETIME_COLUMN, RESOLUTION_COLUMN};
use crate::time_line::parse_timestamp;
use anyhow::{Context, Result};
use log::{debug, warn};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

const DROPPED_STATUSES: [&str; 2] = ["Cancelled", "Withdrawn"];

/// Load one tab-separated ENTSO-E file into records.
///
/// Keeps rows at the expected area level, projects to the columns of `roles`
/// and, for status-bearing kinds, drops cancelled or withdrawn outages.
pub fn load_single_file(path: &Path, roles: &FieldRoles) -> Result<RecordTable> {
    read_records(path, roles).map(|loaded| loaded.table)
}

/// Records of one file and the number of rows dropped for lacking a key.
struct LoadedFile {
    table: RecordTable,
    skipped: usize,
}

fn read_records(path: &Path, roles: &FieldRoles) -> Result<LoadedFile> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    // every column as text, quantities are cast below
    let df = CsvReader::new(file)
        .has_header(true)
        .with_delimiter(b'\t')
        .infer_schema(Some(0))
        .finish()
        .with_context(|| format!("parsing {}", path.display()))?;

    let required = roles.required_columns();
    let available = df.get_column_names();
    for column in required.iter().chain(std::iter::once(&roles.area_qualifier)) {
        if !available.contains(column) {
            return Err(ExtractError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            }
            .into());
        }
    }

    let mut predicate = col(roles.area_qualifier).eq(lit(roles.area_level.code()));
    if let Some(status) = roles.status_column() {
        let kept = DROPPED_STATUSES
            .iter()
            .fold(lit(true), |acc, dropped| acc.and(col(status).neq(lit(*dropped))));
        predicate = predicate.and(col(status).is_null().or(kept));
    }

    let total_rows = df.height();
    let quantities = roles.quantity_columns();
    let selection: Vec<Expr> = required
        .iter()
        .map(|name| {
            if quantities.contains(name) {
                col(name).cast(DataType::Float32)
            } else {
                col(name)
            }
        })
        .collect();

    let projected = df
        .lazy()
        .filter(predicate)
        .select(selection)
        .collect()
        .with_context(|| format!("filtering {}", path.display()))?;

    let loaded = match roles.values {
        ValueFields::Scalar(value) => scalar_records(&projected, roles, value, path)?,
        ValueFields::Outage(_) => outage_records(&projected, roles, path)?,
    };
    if loaded.skipped > 0 {
        warn!(
            "{}: {} rows without timestamp, {} or {} skipped",
            path.display(),
            loaded.skipped,
            roles.destination_key,
            roles.origin_key
        );
    }
    debug!(
        "{}: {} of {} rows kept",
        path.display(),
        loaded.table.len(),
        total_rows
    );
    Ok(loaded)
}

fn scalar_records(
    df: &DataFrame,
    roles: &FieldRoles,
    value: &str,
    path: &Path,
) -> Result<LoadedFile> {
    let times = text_column(df, DATETIME_COLUMN)?;
    let destinations = text_column(df, roles.destination_key)?;
    let origins = text_column(df, roles.origin_key)?;
    let resolutions = text_column(df, RESOLUTION_COLUMN)?;
    let values = float_column(df, value)?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0;
    for idx in 0..df.height() {
        let (Some(time), Some(destination), Some(origin)) =
            (&times[idx], &destinations[idx], &origins[idx])
        else {
            skipped += 1;
            continue;
        };

        records.push(RawRecord {
            timestamp: timestamp(time, path)?,
            destination: destination.clone(),
            origin: origin.clone(),
            value: values[idx],
            resolution_code: resolutions[idx].clone(),
            outage: None,
        });
    }
    Ok(LoadedFile {
        table: RecordTable::new(records),
        skipped,
    })
}

fn outage_records(df: &DataFrame, roles: &FieldRoles, path: &Path) -> Result<LoadedFile> {
    let fields = match roles.values {
        ValueFields::Outage(fields) => fields,
        ValueFields::Scalar(_) => {
            return Ok(LoadedFile {
                table: RecordTable::default(),
                skipped: 0,
            })
        }
    };

    let destinations = text_column(df, roles.destination_key)?;
    let origins = text_column(df, roles.origin_key)?;
    let starts = text_column(df, fields.start)?;
    let ends = text_column(df, fields.end)?;
    let nominal = float_column(df, fields.nominal)?;
    let available = float_column(df, fields.available)?;
    let versions = text_column(df, fields.version)?;
    let statuses = text_column(df, fields.status)?;
    let resource_ids = text_column(df, fields.resource_id)?;
    let mrids = text_column(df, fields.mrid)?;
    let types = text_column(df, fields.outage_type)?;

    let mut records = Vec::with_capacity(df.height());
    let mut skipped = 0;
    for idx in 0..df.height() {
        let (Some(start), Some(destination), Some(origin)) =
            (&starts[idx], &destinations[idx], &origins[idx])
        else {
            skipped += 1;
            continue;
        };
        let end = match &ends[idx] {
            Some(end) => Some(timestamp(end, path)?),
            None => None,
        };

        records.push(RawRecord {
            timestamp: timestamp(start, path)?,
            destination: destination.clone(),
            origin: origin.clone(),
            value: available[idx],
            resolution_code: None,
            outage: Some(OutageDetails {
                end,
                nominal: nominal[idx],
                version: versions[idx].clone(),
                status: statuses[idx].clone(),
                resource_id: resource_ids[idx].clone(),
                mrid: mrids[idx].clone(),
                outage_type: types[idx].clone(),
                from_file: path.to_path_buf(),
            }),
        });
    }
    Ok(LoadedFile {
        table: RecordTable::new(records),
        skipped,
    })
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::Utf8)?;
    let values = column
        .utf8()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f32>>> {
    let column = df.column(name)?.cast(&DataType::Float32)?;
    let values = column.f32()?.into_iter().collect();
    Ok(values)
}

fn timestamp(text: &str, path: &Path) -> Result<chrono::NaiveDateTime> {
    parse_timestamp(text).ok_or_else(|| {
        ExtractError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: text.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{DatasetKind, UnavailabilityKind};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    const GENERATION_HEADER: &str =
        "DateTime\tResolutionCode\tAreaCode\tAreaTypeCode\tAreaName\tMapCode\tProductionType\tActualGenerationOutput\tActualConsumption\tUpdateTime";

    fn write(dir: &TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, lines.join("\n") + "\n").unwrap();
        path
    }

    #[test]
    fn test_generation_keeps_country_level_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "2023_01_AggregatedGenerationPerType_16.1.B_C.csv",
            &[
                GENERATION_HEADER,
                "2023-01-01 00:00:00.000\tPT15M\t10YCH\tCTY\tCH\tCH\tSolar\t12.5\t\t2023-01-02",
                "2023-01-01 00:15:00.000\tPT15M\t10YCH\tCTY\tCH\tCH\tSolar\t13.0\t\t2023-01-02",
                "2023-01-01 00:00:00.000\tPT15M\t10YCH\tCTA\tCH\tCH\tSolar\t99.0\t\t2023-01-02",
                "2023-01-01 00:00:00.000\tPT60M\t10YFR\tCTY\tFR\tFR\tNuclear\t\t\t2023-01-02",
            ],
        );

        let table = load_single_file(&path, &DatasetKind::Generation.field_roles()).unwrap();

        assert_eq!(table.len(), 3);
        let first = &table.records()[0];
        assert_eq!(first.destination, "CH");
        assert_eq!(first.origin, "Solar");
        assert_eq!(first.value, Some(12.5));
        assert_eq!(first.resolution_code.as_deref(), Some("PT15M"));
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(table.records().iter().all(|r| r.value != Some(99.0)));
        assert_eq!(table.records()[2].value, None);
    }

    #[test]
    fn test_import_filters_on_out_area_type() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "2023_01_PhysicalFlows_12.1.G.csv",
            &[
                "DateTime\tResolutionCode\tOutAreaCode\tOutAreaTypeCode\tOutAreaName\tOutMapCode\tInAreaCode\tInAreaTypeCode\tInAreaName\tInMapCode\tFlowValue\tUpdateTime",
                "2023-01-01 00:00:00.000\tPT60M\tA\tCTY\tDE\tDE\tB\tCTY\tCH\tCH\t1500\tx",
                "2023-01-01 00:00:00.000\tPT60M\tA\tBZN\tDE\tDE_LU\tB\tCTY\tCH\tCH\t1400\tx",
            ],
        );

        let table = load_single_file(&path, &DatasetKind::Import.field_roles()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].destination, "CH");
        assert_eq!(table.records()[0].origin, "DE");
        assert_eq!(table.records()[0].value, Some(1500.0));
    }

    #[test]
    fn test_unavailability_drops_cancelled_and_tags_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "2023_01_UnavailabilityOfProductionUnits_15.1.C_D.csv",
            &[
                "MapCode\tAreaTypeCode\tProductionType\tInstalledCapacity\tAvailableCapacity\tStartOutage\tEndOutage\tVersion\tStatus\tPowerResourceEIC\tMRID\tType",
                "CH\tCTA\tNuclear\t1000\t0\t2023-01-03 00:00:00\t2023-01-05 00:00:00\t1\tActive\tEIC1\tM1\tPlanned",
                "CH\tCTA\tNuclear\t1000\t0\t2023-01-03 00:00:00\t2023-01-05 00:00:00\t2\tCancelled\tEIC1\tM1\tPlanned",
                "CH\tCTA\tHydro\t200\t150\t2023-01-04 00:00:00\t\t1\tWithdrawn\tEIC2\tM2\tForced",
                "CH\tCTA\tHydro\t200\t100\t2023-01-06 00:00:00\t\t1\t\tEIC2\tM3\tForced",
                "CH\tCTY\tHydro\t200\t100\t2023-01-06 00:00:00\t\t1\tActive\tEIC2\tM4\tForced",
            ],
        );
        let roles = DatasetKind::Unavailability(UnavailabilityKind::Production).field_roles();

        let table = load_single_file(&path, &roles).unwrap();

        assert_eq!(table.len(), 2);
        let outage = table.records()[0].outage.as_ref().unwrap();
        assert_eq!(outage.status.as_deref(), Some("Active"));
        assert_eq!(outage.nominal, Some(1000.0));
        assert_eq!(outage.from_file, path);
        assert!(outage.end.is_some());
        assert_eq!(table.records()[1].outage.as_ref().unwrap().end, None);
    }

    #[test]
    fn test_rows_without_keys_are_counted() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "2023_01_AggregatedGenerationPerType_16.1.B_C.csv",
            &[
                GENERATION_HEADER,
                "2023-01-01 00:00:00.000\tPT15M\t10YCH\tCTY\tCH\tCH\tSolar\t1.0\t\tx",
                "2023-01-01 00:15:00.000\tPT15M\t10YCH\tCTY\tCH\tCH\t\t2.0\t\tx",
                "\tPT15M\t10YCH\tCTY\tCH\tCH\tSolar\t3.0\t\tx",
            ],
        );

        let loaded = read_records(&path, &DatasetKind::Generation.field_roles()).unwrap();

        assert_eq!(loaded.table.len(), 1);
        assert_eq!(loaded.skipped, 2);
        assert_eq!(loaded.table.records()[0].value, Some(1.0));
    }

    #[test]
    fn test_missing_column_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "2023_01_Broken.csv", &["DateTime\tMapCode", "2023-01-01 00:00\tCH"]);

        let err = load_single_file(&path, &DatasetKind::Generation.field_roles()).unwrap_err();

        match err.downcast_ref::<ExtractError>() {
            Some(ExtractError::MissingColumn { path: p, column }) => {
                assert_eq!(p, &path);
                assert_eq!(column, "ResolutionCode");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

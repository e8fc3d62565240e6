use crate::output::write_country_matrix;
use crate::parameters::DatasetKind;
use crate::time_line::TimeLine;
use anyhow::Result;
use gap_reconciler::CountryMatrix;
use log::info;
use std::collections::BTreeMap;
use std::path::Path;

/// Lay one country onto the batch grid: every column of `universe`, every
/// slot of `time_line`.
///
/// Cells start absent and take the country's value at the same timestamp.
/// Values at timestamps outside the timeline are dropped.
pub fn normalize(matrix: &CountryMatrix, universe: &[String], time_line: &TimeLine) -> CountryMatrix {
    let mut grid = CountryMatrix::new(matrix.country(), time_line.slots().to_vec());

    for origin in universe {
        let mut values = vec![None; time_line.len()];
        if let Some(column) = matrix.column(origin) {
            for (ts, value) in matrix.index().iter().zip(column) {
                if let Some(row) = time_line.position(*ts) {
                    values[row] = *value;
                }
            }
        }
        grid.insert_column(origin.as_str(), values);
    }
    grid
}

/// Normalize every country, writing `{country}_{kind}_MW.csv` files into
/// `save_dir` when given.
pub fn normalize_all(
    matrices: BTreeMap<String, CountryMatrix>,
    universe: &[String],
    time_line: &TimeLine,
    kind: DatasetKind,
    save_dir: Option<&Path>,
) -> Result<BTreeMap<String, CountryMatrix>> {
    let mut finalized = BTreeMap::new();
    for (country, matrix) in matrices {
        let grid = normalize(&matrix, universe, time_line);
        if let Some(dir) = save_dir {
            let path = write_country_matrix(&grid, kind, dir)?;
            info!("Saved {}", path.display());
        }
        finalized.insert(country, grid);
    }
    Ok(finalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn universe() -> Vec<String> {
        vec!["Hydro".to_string(), "Solar".to_string()]
    }

    #[test]
    fn test_grid_has_the_batch_shape() {
        let mut matrix = CountryMatrix::new("CH", vec![at(0, 0), at(0, 30)]);
        matrix.insert_column("Solar", vec![Some(1.0), Some(3.0)]);
        let line = TimeLine::from_timestamps(vec![at(0, 0), at(0, 45)]);

        let grid = normalize(&matrix, &universe(), &line);

        assert_eq!(grid.index(), line.slots());
        assert_eq!(grid.column_names().collect::<Vec<_>>(), vec!["Hydro", "Solar"]);
        assert_eq!(grid.column("Solar").unwrap(), &[Some(1.0), None, Some(3.0), None]);
        assert_eq!(grid.column("Hydro").unwrap(), &[None, None, None, None]);
    }

    #[test]
    fn test_empty_country_is_all_absent() {
        let matrix = CountryMatrix::new("XX", Vec::new());
        let line = TimeLine::from_timestamps(vec![at(0, 0)]);

        let grids = normalize_all(
            BTreeMap::from([("XX".to_string(), matrix)]),
            &universe(),
            &line,
            DatasetKind::Generation,
            None,
        )
        .unwrap();

        let grid = &grids["XX"];
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.missing_cells(), 8);
    }
}

use crate::filler::{fill_average_day, fill_zero, interpolate};
use crate::gaps::{classify, find_gaps, Gap, GapClass};
use crate::models::{CountryMatrix, GapRecord, NativeSeries, ReconcileReport, ResolutionRecord};
use crate::policy::GapPolicy;
use crate::resolution::detect_interval;
use chrono::{Duration, NaiveDateTime};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Grid assumed for a column with a single present value.
const FALLBACK_STEP_MINUTES: i64 = 15;

pub struct Reconciler {
    policy: GapPolicy,
}

impl Reconciler {
    pub fn new(policy: GapPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GapPolicy {
        &self.policy
    }

    /// Detect resolutions and fill gaps of every country, in place.
    pub fn reconcile(&self, matrices: &mut BTreeMap<String, CountryMatrix>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let total = matrices.len();

        for (i, (country, matrix)) in matrices.iter_mut().enumerate() {
            debug!("Reconciling {} ({}/{})", country, i + 1, total);
            report.extend(self.reconcile_country(matrix));
        }

        if self.policy.ignore {
            info!(
                "Missing data identified: {} cells ({:.2}%), left unfilled",
                report.missing_cells,
                100.0 * report.missing_share()
            );
        } else {
            info!(
                "Filled {} short, {} long and {} oversized gaps",
                report.count(GapClass::Short),
                report.count(GapClass::Long),
                report.count(GapClass::Oversized)
            );
        }
        report
    }

    /// Reconcile one country. The matrix is rebuilt on the union of its
    /// columns' native grids.
    pub fn reconcile_country(&self, matrix: &mut CountryMatrix) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let country = matrix.country().to_string();
        let origins: Vec<String> = matrix.column_names().map(String::from).collect();

        let mut columns = BTreeMap::new();
        for origin in origins {
            let points = matrix.present(&origin);
            let filled =
                self.reconcile_column(&country, &origin, matrix.index(), &points, &mut report);
            columns.insert(origin, filled);
        }

        *matrix = CountryMatrix::from_columns(country, columns);
        report
    }

    fn reconcile_column(
        &self,
        country: &str,
        origin: &str,
        index: &[NaiveDateTime],
        points: &[(NaiveDateTime, f32)],
        report: &mut ReconcileReport,
    ) -> Vec<(NaiveDateTime, Option<f32>)> {
        let timestamps: Vec<NaiveDateTime> = points.iter().map(|(ts, _)| *ts).collect();
        let interval = detect_interval(&timestamps);
        report.resolutions.push(ResolutionRecord {
            country: country.to_string(),
            origin: origin.to_string(),
            resolution_minutes: interval.map(|step| step.num_minutes()),
        });

        let step = interval.unwrap_or_else(|| Duration::minutes(FALLBACK_STEP_MINUTES));
        let Some((mut series, off_grid)) = NativeSeries::from_points(points, step) else {
            return self.reconcile_empty_column(country, origin, index, report);
        };
        if off_grid > 0 {
            warn!(
                "{} {}: dropped {} values off the {}-minute grid",
                country,
                origin,
                off_grid,
                step.num_minutes()
            );
        }

        let gaps = find_gaps(&series.values);
        let missing: usize = gaps.iter().map(|gap| gap.len).sum();
        report.missing_cells += missing;
        report.total_cells += series.len();
        debug!(
            "{} {}: {} min resolution, {} gaps, {} missing of {}",
            country,
            origin,
            step.num_minutes(),
            gaps.len(),
            missing,
            series.len()
        );

        if !self.policy.ignore {
            let span = native_span(index, step).max(series.len());
            self.fill_series(country, origin, &mut series, &gaps, span, report);
        }
        series.points()
    }

    /// A column without any value is oversized as a whole.
    fn reconcile_empty_column(
        &self,
        country: &str,
        origin: &str,
        index: &[NaiveDateTime],
        report: &mut ReconcileReport,
    ) -> Vec<(NaiveDateTime, Option<f32>)> {
        report.missing_cells += index.len();
        report.total_cells += index.len();
        if self.policy.ignore {
            return index.iter().map(|ts| (*ts, None)).collect();
        }

        warn!("{} {}: no values, filled with zeros", country, origin);
        if let Some(first) = index.first() {
            report.gaps.push(GapRecord {
                country: country.to_string(),
                origin: origin.to_string(),
                start: *first,
                steps: index.len(),
                class: GapClass::Oversized,
            });
        }
        index.iter().map(|ts| (*ts, Some(0.0))).collect()
    }

    fn fill_series(
        &self,
        country: &str,
        origin: &str,
        series: &mut NativeSeries,
        gaps: &[Gap],
        span: usize,
        report: &mut ReconcileReport,
    ) {
        let classified: Vec<(Gap, GapClass)> = gaps
            .iter()
            .map(|gap| (*gap, classify(gap, span, series.step, &self.policy)))
            .collect();

        // long gaps first so average days are built from observed values only
        let window = self.policy.window_steps(series.step);
        for (gap, class) in &classified {
            if *class == GapClass::Long {
                fill_average_day(series, gap, window);
            }
        }
        for (gap, class) in &classified {
            match class {
                GapClass::Oversized => fill_zero(&mut series.values, gap),
                GapClass::Short => interpolate(&mut series.values, gap),
                GapClass::Long => {}
            }
        }

        report
            .gaps
            .extend(classified.iter().map(|(gap, class)| GapRecord {
                country: country.to_string(),
                origin: origin.to_string(),
                start: series.timestamp(gap.start),
                steps: gap.len,
                class: *class,
            }));
    }
}

/// Steps of `step` covering the whole country index, the length gaps are
/// measured against.
fn native_span(index: &[NaiveDateTime], step: Duration) -> usize {
    match (index.first(), index.last()) {
        (Some(first), Some(last)) => {
            let step_secs = step.num_seconds().max(1);
            ((*last - *first).num_seconds() / step_secs) as usize + 1
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Quarter-hour matrix with one column, `missing` positions removed.
    fn quarter_hour_matrix(len: usize, missing: std::ops::Range<usize>) -> CountryMatrix {
        let points: Vec<(NaiveDateTime, Option<f32>)> = (0..len)
            .filter(|i| !missing.contains(i))
            .map(|i| {
                let ts = start() + Duration::minutes(15 * i as i64);
                // daily profile: the hour of day
                (ts, Some((i / 4 % 24) as f32))
            })
            .collect();
        let mut columns = BTreeMap::new();
        columns.insert("Solar".to_string(), points);
        CountryMatrix::from_columns("XX", columns)
    }

    fn policy() -> GapPolicy {
        GapPolicy {
            n_hours: 2,
            days_around: 7,
            limit: 0.4,
            ignore: false,
        }
    }

    #[test]
    fn test_short_gap_at_threshold_is_interpolated() {
        // 2 hours at 15 minutes = 8 steps
        let mut matrix = quarter_hour_matrix(96 * 10, 100..108);
        let report = Reconciler::new(policy()).reconcile_country(&mut matrix);

        assert_eq!(report.gaps.len(), 1);
        assert_eq!(report.gaps[0].class, GapClass::Short);
        assert_eq!(report.gaps[0].steps, 8);
        assert_eq!(report.resolution("XX", "Solar"), Some(15));
        assert_eq!(matrix.missing_cells(), 0);

        let column = matrix.column("Solar").unwrap();
        let left = column[99].unwrap();
        let right = column[108].unwrap();
        let expected = left + (right - left) * 4.0 / 9.0;
        assert!((column[103].unwrap() - expected).abs() < 1e-5);
    }

    #[test]
    fn test_one_step_longer_uses_average_day() {
        let mut matrix = quarter_hour_matrix(96 * 10, 100..109);
        let report = Reconciler::new(policy()).reconcile_country(&mut matrix);

        assert_eq!(report.gaps[0].class, GapClass::Long);
        let column = matrix.column("Solar").unwrap();
        for i in 100..109 {
            assert_eq!(column[i], Some((i / 4 % 24) as f32));
        }
    }

    #[test]
    fn test_oversized_gap_is_zero_filled() {
        let mut matrix = quarter_hour_matrix(100, 10..60);
        let report = Reconciler::new(policy()).reconcile_country(&mut matrix);

        assert_eq!(report.gaps[0].class, GapClass::Oversized);
        let column = matrix.column("Solar").unwrap();
        assert!(column[10..60].iter().all(|v| *v == Some(0.0)));
        assert_ne!(column[9], Some(0.0));
    }

    #[test]
    fn test_ignore_keeps_missing_cells() {
        let mut matrix = quarter_hour_matrix(96 * 10, 100..109);
        let report = Reconciler::new(GapPolicy::ignoring()).reconcile_country(&mut matrix);

        assert_eq!(report.resolution("XX", "Solar"), Some(15));
        assert!(report.gaps.is_empty());
        assert_eq!(report.missing_cells, 9);
        let column = matrix.column("Solar").unwrap();
        assert!(column[100..109].iter().all(Option::is_none));
    }

    #[test]
    fn test_hourly_column_is_reconciled_on_its_own_grid() {
        let mut columns = BTreeMap::new();
        let hourly: Vec<_> = (0..48)
            .filter(|h| *h != 10)
            .map(|h| (start() + Duration::hours(h), Some(h as f32)))
            .collect();
        columns.insert("Nuclear".to_string(), hourly);
        let mut matrix = CountryMatrix::from_columns("XX", columns);

        let report = Reconciler::new(policy()).reconcile_country(&mut matrix);

        assert_eq!(report.resolution("XX", "Nuclear"), Some(60));
        assert_eq!(matrix.height(), 48);
        assert_eq!(matrix.get(start() + Duration::hours(10), "Nuclear"), Some(10.0));
    }

    #[test]
    fn test_empty_column_is_oversized() {
        let index: Vec<_> = (0..4).map(|i| start() + Duration::minutes(15 * i)).collect();
        let mut matrix = CountryMatrix::new("XX", index);
        matrix.insert_column("Solar", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        matrix.insert_column("Hydro", vec![None; 4]);

        let report = Reconciler::new(policy()).reconcile_country(&mut matrix);

        assert_eq!(report.resolution("XX", "Hydro"), None);
        assert_eq!(report.count(GapClass::Oversized), 1);
        assert_eq!(matrix.column("Hydro").unwrap(), &[Some(0.0); 4]);
    }

    #[test]
    fn test_gap_size_is_relative_to_the_country_span() {
        // ten days of A; B only on days 2 to 7 with a 2.5 day hole
        let at = |i: usize| start() + Duration::minutes(15 * i as i64);
        let mut columns = BTreeMap::new();
        columns.insert(
            "A".to_string(),
            (0..960).map(|i| (at(i), Some(1.0))).collect::<Vec<_>>(),
        );
        columns.insert(
            "B".to_string(),
            (192..768)
                .filter(|i| !(384..624).contains(i))
                .map(|i| (at(i), Some((i / 4 % 24) as f32)))
                .collect::<Vec<_>>(),
        );
        let mut matrix = CountryMatrix::from_columns("XX", columns);

        let report = Reconciler::new(policy()).reconcile_country(&mut matrix);

        let gap = report.gaps.iter().find(|g| g.origin == "B").unwrap();
        assert_eq!(gap.steps, 240);
        assert_eq!(gap.class, GapClass::Long);
        assert_eq!(matrix.get(at(500), "B"), Some((500 / 4 % 24) as f32));
        assert_eq!(matrix.get(at(100), "B"), None);
    }

    #[test]
    fn test_native_span_covers_the_index() {
        let index: Vec<_> = (0..8).map(|h| start() + Duration::hours(h)).collect();
        assert_eq!(native_span(&index, Duration::minutes(15)), 29);
        assert_eq!(native_span(&index, Duration::hours(1)), 8);
        assert_eq!(native_span(&[], Duration::hours(1)), 0);
    }

    #[test]
    fn test_reconcile_all_countries() {
        let mut matrices = BTreeMap::new();
        matrices.insert("XX".to_string(), quarter_hour_matrix(96 * 10, 100..104));
        matrices.insert("YY".to_string(), quarter_hour_matrix(96 * 10, 200..201));

        let report = Reconciler::new(policy()).reconcile(&mut matrices);

        assert_eq!(report.resolutions.len(), 2);
        assert_eq!(report.count(GapClass::Short), 2);
        assert!(matrices.values().all(|m| m.missing_cells() == 0));
    }
}

use chrono::{Duration, NaiveDate};
use gap_reconciler::{CountryMatrix, GapPolicy, Reconciler};
use std::collections::BTreeMap;

fn main() {
    let start = NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    // Ten days of hourly solar output with a one-hour and a one-day hole
    let mut solar = Vec::new();
    for hour in 0..240 {
        if hour == 30 || (120..144).contains(&hour) {
            continue;
        }
        let hour_of_day = hour % 24;
        let output = match hour_of_day {
            7..=17 => 50.0 * (1.0 - ((hour_of_day as f32 - 12.0) / 6.0).powi(2)),
            _ => 0.0,
        };
        solar.push((start + Duration::hours(hour), Some(output)));
    }

    let mut columns = BTreeMap::new();
    columns.insert("Solar".to_string(), solar);
    let mut matrix = CountryMatrix::from_columns("EXAMPLE", columns);

    let reconciler = Reconciler::new(GapPolicy::default());
    let report = reconciler.reconcile_country(&mut matrix);

    println!("Gap Reconciliation Results");
    println!("==========================");
    for record in &report.resolutions {
        println!(
            "{} / {}: {} min resolution",
            record.country,
            record.origin,
            record.resolution_minutes.unwrap_or_default()
        );
    }
    println!();
    for gap in &report.gaps {
        println!("  {} gap of {} steps at {}", gap.class, gap.steps, gap.start);
    }
    println!();
    println!("Noon on the filled day: {:?} MW", matrix.get(start + Duration::hours(132), "Solar"));
}

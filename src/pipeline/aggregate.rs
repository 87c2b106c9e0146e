//! Daily aggregation over the normalized measurement set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{DailyAggregate, RawMeasurement, SensorPollutant};

// ---

/// Round to 3 decimal places.
fn round3(value: f64) -> f64 {
    // ---
    (value * 1000.0).round() / 1000.0
}

/// Accumulated statistics for one (sensor, pollutant, day) group.
struct DayStats {
    // ---
    sum: f64,
    min: f64,
    max: f64,
    count: u32,
}

/// Group normalized records by (sensor, pollutant, calendar day) and compute
/// mean/min/max of each group, rounded to 3 decimals.
///
/// The reduction is commutative and associative over records, so the result
/// does not depend on input order. Output comes back sorted by
/// (sensor, pollutant, date).
pub fn aggregate_daily(records: &[RawMeasurement]) -> Vec<DailyAggregate> {
    // ---
    let mut groups: BTreeMap<(String, String, NaiveDate), DayStats> = BTreeMap::new();

    for r in records {
        let key = (r.sensor_id.clone(), r.pollutant.clone(), r.timestamp.date());
        let stats = groups.entry(key).or_insert(DayStats {
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        });
        stats.sum += r.value;
        stats.min = stats.min.min(r.value);
        stats.max = stats.max.max(r.value);
        stats.count += 1;
    }

    groups
        .into_iter()
        .map(|((sensor_id, pollutant, date), stats)| DailyAggregate {
            sensor_id,
            date,
            pollutant,
            daily_avg: round3(stats.sum / f64::from(stats.count)),
            daily_min: round3(stats.min),
            daily_max: round3(stats.max),
        })
        .collect()
}

/// Distinct (sensor, pollutant) pairs observed in the normalized set.
pub fn sensor_pollutant_pairs(records: &[RawMeasurement]) -> Vec<SensorPollutant> {
    // ---
    let pairs: BTreeSet<SensorPollutant> = records
        .iter()
        .map(|r| SensorPollutant {
            sensor_id: r.sensor_id.clone(),
            pollutant: r.pollutant.clone(),
        })
        .collect();

    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::NaiveDate;

    fn reading(sensor_id: &str, pollutant: &str, day: u32, hour: u32, value: f64) -> RawMeasurement {
        // ---
        RawMeasurement {
            sensor_id: sensor_id.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2023, 5, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            pollutant: pollutant.to_string(),
            value,
        }
    }

    #[test]
    fn test_one_day_mean_min_max() {
        // ---
        let records = vec![
            reading("S1", "PM10", 1, 8, 10.0),
            reading("S1", "PM10", 1, 12, 20.0),
            reading("S1", "PM10", 1, 18, 30.0),
        ];

        let daily = aggregate_daily(&records);
        assert_eq!(daily.len(), 1);

        let row = &daily[0];
        assert_eq!(row.sensor_id, "S1");
        assert_eq!(row.pollutant, "PM10");
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2023, 5, 1).unwrap());
        assert_eq!(row.daily_avg, 20.0);
        assert_eq!(row.daily_min, 10.0);
        assert_eq!(row.daily_max, 30.0);
    }

    #[test]
    fn test_single_reading_collapses() {
        // ---
        let daily = aggregate_daily(&[reading("S1", "PM10", 1, 8, 17.3)]);

        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].daily_avg, 17.3);
        assert_eq!(daily[0].daily_min, 17.3);
        assert_eq!(daily[0].daily_max, 17.3);
    }

    #[test]
    fn test_groups_split_by_sensor_pollutant_and_day() {
        // ---
        let records = vec![
            reading("S1", "PM10", 1, 8, 1.0),
            reading("S1", "PM10", 2, 8, 2.0),
            reading("S1", "NO2", 1, 8, 3.0),
            reading("S2", "PM10", 1, 8, 4.0),
        ];

        let daily = aggregate_daily(&records);
        assert_eq!(daily.len(), 4);
        assert!(daily
            .iter()
            .all(|d| d.daily_avg == d.daily_min && d.daily_min == d.daily_max));
    }

    #[test]
    fn test_mean_rounds_to_three_decimals() {
        // ---
        let records = vec![
            reading("S1", "PM10", 1, 8, 10.0),
            reading("S1", "PM10", 1, 9, 10.0),
            reading("S1", "PM10", 1, 10, 11.0),
        ];

        // 31/3 = 10.333... -> 10.333
        assert_eq!(aggregate_daily(&records)[0].daily_avg, 10.333);
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        // ---
        let mut records = vec![
            reading("S1", "PM10", 1, 8, 10.0),
            reading("S2", "NO2", 1, 9, 20.0),
            reading("S1", "PM10", 2, 10, 30.0),
            reading("S1", "PM10", 1, 11, 40.0),
        ];

        let forward = aggregate_daily(&records);
        records.reverse();
        let backward = aggregate_daily(&records);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_distinct_pairs_deduplicate() {
        // ---
        let records = vec![
            reading("S1", "PM10", 1, 8, 1.0),
            reading("S1", "PM10", 2, 9, 2.0),
            reading("S1", "NO2", 1, 8, 3.0),
            reading("S2", "PM10", 1, 8, 4.0),
        ];

        let pairs = sensor_pollutant_pairs(&records);
        assert_eq!(
            pairs,
            vec![
                SensorPollutant {
                    sensor_id: "S1".to_string(),
                    pollutant: "NO2".to_string()
                },
                SensorPollutant {
                    sensor_id: "S1".to_string(),
                    pollutant: "PM10".to_string()
                },
                SensorPollutant {
                    sensor_id: "S2".to_string(),
                    pollutant: "PM10".to_string()
                },
            ]
        );
    }
}

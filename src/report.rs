//! Descriptive summaries of the order table and the segmentation

use anyhow::anyhow;
use polars::prelude::*;

use crate::features::{Channel, OrderRecord};
use crate::pipeline::Segmentation;
use crate::segment::Segment;

/// Customers, orders and spend for one order channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSummary {
    pub channel: Channel,
    /// Distinct customer IDs
    pub customers: usize,
    pub total_orders: u64,
    pub total_value: f64,
}

/// Mean RFM values for one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentProfile {
    pub segment: Segment,
    pub customers: usize,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: f64,
}

/// Ranking key for top-customer tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    TotalValue,
    TotalOrders,
}

/// Per-channel distribution, ordered by channel
pub fn channel_summary(records: &[OrderRecord]) -> crate::Result<Vec<ChannelSummary>> {
    let channels: Vec<&str> = records
        .iter()
        .map(|record| record.order_channel.as_str())
        .collect();
    let customer_ids: Vec<&str> = records
        .iter()
        .map(|record| record.customer_id.as_str())
        .collect();
    let total_orders: Vec<u64> = records
        .iter()
        .map(|record| u64::from(record.total_orders))
        .collect();
    let total_values: Vec<f64> = records.iter().map(|record| record.total_value).collect();

    let df = DataFrame::new(vec![
        Series::new("channel", channels),
        Series::new("master_id", customer_ids),
        Series::new("total_orders", total_orders),
        Series::new("total_value", total_values),
    ])?
    .lazy()
    .group_by([col("channel")])
    .agg([
        col("master_id").n_unique().alias("customers"),
        col("total_orders").sum().alias("total_orders"),
        col("total_value").sum().alias("total_value"),
    ])
    .collect()?;

    let labels = df.column("channel")?.str()?;
    let customers = df.column("customers")?.cast(&DataType::UInt32)?;
    let total_orders = df.column("total_orders")?.cast(&DataType::UInt64)?;
    let total_values = df.column("total_value")?.f64()?;

    let mut summaries = labels
        .into_no_null_iter()
        .zip(customers.u32()?.into_no_null_iter())
        .zip(total_orders.u64()?.into_no_null_iter())
        .zip(total_values.into_no_null_iter())
        .map(|(((label, customers), total_orders), total_value)| {
            let channel = Channel::parse(label)
                .ok_or_else(|| anyhow!("unknown channel label {label:?}"))?;
            Ok::<_, anyhow::Error>(ChannelSummary {
                channel,
                customers: customers as usize,
                total_orders,
                total_value,
            })
        })
        .collect::<crate::Result<Vec<_>>>()?;

    summaries.sort_by_key(|summary| summary.channel);
    Ok(summaries)
}

/// The `n` records ranking highest, ties kept in input order
pub fn top_customers(records: &[OrderRecord], ranking: Ranking, n: usize) -> Vec<&OrderRecord> {
    let mut ranked: Vec<&OrderRecord> = records.iter().collect();
    match ranking {
        Ranking::TotalValue => {
            ranked.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
        }
        Ranking::TotalOrders => {
            ranked.sort_by(|a, b| b.total_orders.cmp(&a.total_orders));
        }
    }
    ranked.truncate(n);
    ranked
}

/// Mean recency, frequency and monetary per segment present, in segment order
pub fn segment_profiles(segmentation: &Segmentation) -> crate::Result<Vec<SegmentProfile>> {
    let customers = &segmentation.customers;
    let labels: Vec<&str> = customers
        .iter()
        .map(|customer| customer.segment.as_str())
        .collect();
    let recency: Vec<i64> = customers.iter().map(|customer| customer.rfm.recency).collect();
    let frequency: Vec<u32> = customers
        .iter()
        .map(|customer| customer.rfm.frequency)
        .collect();
    let monetary: Vec<f64> = customers
        .iter()
        .map(|customer| customer.rfm.monetary)
        .collect();

    let df = DataFrame::new(vec![
        Series::new("segment", labels),
        Series::new("recency", recency),
        Series::new("frequency", frequency),
        Series::new("monetary", monetary),
    ])?
    .lazy()
    .group_by([col("segment")])
    .agg([
        col("recency").count().alias("customers"),
        col("recency").mean().alias("mean_recency"),
        col("frequency").mean().alias("mean_frequency"),
        col("monetary").mean().alias("mean_monetary"),
    ])
    .collect()?;

    let labels = df.column("segment")?.str()?;
    let counts = df.column("customers")?.cast(&DataType::UInt32)?;
    let mean_recency = df.column("mean_recency")?.f64()?;
    let mean_frequency = df.column("mean_frequency")?.f64()?;
    let mean_monetary = df.column("mean_monetary")?.f64()?;

    let mut profiles = labels
        .into_no_null_iter()
        .zip(counts.u32()?.into_no_null_iter())
        .zip(mean_recency.into_no_null_iter())
        .zip(mean_frequency.into_no_null_iter())
        .zip(mean_monetary.into_no_null_iter())
        .map(|((((label, count), mean_recency), mean_frequency), mean_monetary)| {
            let segment = Segment::from_label(label)
                .ok_or_else(|| anyhow!("unknown segment label {label:?}"))?;
            Ok::<_, anyhow::Error>(SegmentProfile {
                segment,
                customers: count as usize,
                mean_recency,
                mean_frequency,
                mean_monetary,
            })
        })
        .collect::<crate::Result<Vec<_>>>()?;

    profiles.sort_by_key(|profile| profile.segment);
    Ok(profiles)
}

/// Print the order table overview to stdout
pub fn print_overview(records: &[OrderRecord], top: usize) -> crate::Result<()> {
    println!("\n=== Distribution by Order Channel ===");
    println!(
        "{:<10} {:>10} {:>14} {:>16}",
        "channel", "customers", "total_orders", "total_value"
    );
    for summary in channel_summary(records)? {
        println!(
            "{:<10} {:>10} {:>14} {:>16.2}",
            summary.channel, summary.customers, summary.total_orders, summary.total_value
        );
    }

    for (label, ranking) in [
        ("Spend", Ranking::TotalValue),
        ("Orders", Ranking::TotalOrders),
    ] {
        println!("\n=== Top {top} Customers by Total {label} ===");
        println!(
            "{:<38} {:<8} {:>8} {:>12}",
            "master_id", "channel", "orders", "value"
        );
        for record in top_customers(records, ranking, top) {
            println!(
                "{:<38} {:<8} {:>8} {:>12.2}",
                record.customer_id, record.order_channel, record.total_orders, record.total_value
            );
        }
    }

    Ok(())
}

/// Print the per-segment profile to stdout
pub fn print_segment_profiles(segmentation: &Segmentation) -> crate::Result<()> {
    let total = segmentation.customers.len();

    println!("\n=== Segment Profiles ===");
    println!("Analysis date: {}", segmentation.analysis_date);
    println!(
        "{:<20} {:<12} {:>10} {:>8} {:>10} {:>10} {:>12}",
        "segment", "rule", "customers", "share", "recency", "frequency", "monetary"
    );
    for profile in segment_profiles(segmentation)? {
        let share = profile.customers as f64 / total as f64 * 100.0;
        let rule = profile.segment.rule().map_or("-", |rule| rule.pattern);
        println!(
            "{:<20} {:<12} {:>10} {:>7.1}% {:>10.2} {:>10.2} {:>12.2}",
            profile.segment.as_str(),
            rule,
            profile.customers,
            share,
            profile.mean_recency,
            profile.mean_frequency,
            profile.mean_monetary
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{derive_features, tests::raw_record};
    use crate::pipeline::{segment_customers, ScoredCustomer};
    use crate::rfm::CustomerRfm;
    use crate::score::RfmScore;

    fn records() -> Vec<OrderRecord> {
        let raw: Vec<_> = (0..10)
            .map(|i| {
                let mut raw = raw_record(i + 1, &format!("c{i}"));
                if i % 2 == 0 {
                    raw.order_channel = Some("Mobile".into());
                }
                raw.last_order_date = Some(format!("2021-05-{:02}", 30 - i));
                raw.order_num_total_ever_online = Some(format!("{}", i % 4));
                raw.order_num_total_ever_offline = Some("1".into());
                raw.customer_value_total_ever_online = Some(format!("{}", 50 * (i + 1)));
                raw.customer_value_total_ever_offline = Some("0".into());
                raw
            })
            .collect();
        derive_features(&raw).unwrap()
    }

    #[test]
    fn test_channel_summary() {
        let summary = channel_summary(&records()).unwrap();
        assert_eq!(summary.len(), 2);

        let android = &summary[0];
        assert_eq!(android.channel, Channel::Android);
        assert_eq!(android.customers, 5);
        // Odd i: online orders 1, 3, 1, 3, 1 plus one offline each.
        assert_eq!(android.total_orders, 14);
        assert!((android.total_value - 50.0 * (2 + 4 + 6 + 8 + 10) as f64).abs() < 1e-9);

        assert_eq!(summary[1].channel, Channel::Mobile);
        assert_eq!(summary[1].customers, 5);
    }

    #[test]
    fn test_top_customers() {
        let records = records();

        let by_value = top_customers(&records, Ranking::TotalValue, 3);
        let ids: Vec<&str> = by_value.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["c9", "c8", "c7"]);

        // c3 and c7 both have 4 orders; ties keep input order.
        let by_orders = top_customers(&records, Ranking::TotalOrders, 2);
        let ids: Vec<&str> = by_orders.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c7"]);

        assert_eq!(top_customers(&records, Ranking::TotalValue, 50).len(), 10);
    }

    #[test]
    fn test_segment_profiles_cover_population() {
        let segmentation = segment_customers(&records()).unwrap();
        let profiles = segment_profiles(&segmentation).unwrap();

        let total: usize = profiles.iter().map(|p| p.customers).sum();
        assert_eq!(total, 10);
        for profile in &profiles {
            assert!(profile.mean_recency >= 0.0);
            assert!((profile.mean_frequency - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_channel_summary_counts_distinct_customers() {
        let mut raw: Vec<_> = (0..3).map(|i| raw_record(i + 1, "same")).collect();
        raw.push(raw_record(4, "other"));
        let summary = channel_summary(&derive_features(&raw).unwrap()).unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].customers, 2);
        assert_eq!(summary[0].total_orders, 20);
    }

    fn scored(
        id: &str,
        recency: i64,
        frequency: u32,
        monetary: f64,
        segment: Segment,
    ) -> ScoredCustomer {
        ScoredCustomer {
            rfm: CustomerRfm {
                customer_id: id.to_string(),
                recency,
                frequency,
                monetary,
            },
            score: RfmScore {
                recency: 1,
                frequency: 1,
                monetary: 1,
            },
            rf_code: "11".into(),
            segment,
        }
    }

    #[test]
    fn test_segment_profile_means_in_segment_order() {
        let segmentation = Segmentation {
            analysis_date: chrono::NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
            customers: vec![
                scored("a", 2, 1, 10.0, Segment::Champions),
                scored("b", 90, 1, 5.0, Segment::Hibernating),
                scored("c", 4, 3, 30.0, Segment::Champions),
            ],
        };
        let profiles = segment_profiles(&segmentation).unwrap();

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].segment, Segment::Hibernating);
        assert_eq!(profiles[0].customers, 1);

        let champions = &profiles[1];
        assert_eq!(champions.segment, Segment::Champions);
        assert_eq!(champions.customers, 2);
        assert!((champions.mean_recency - 3.0).abs() < 1e-9);
        assert!((champions.mean_frequency - 2.0).abs() < 1e-9);
        assert!((champions.mean_monetary - 20.0).abs() < 1e-9);
    }
}

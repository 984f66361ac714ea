use clap::Parser;
use env_logger::Env;
use log::info;

use solarstats::clean;
use solarstats::cli::Args;
use solarstats::compare;
use solarstats::data::Metric;
use solarstats::export;
use solarstats::load;
use solarstats::plot;
use solarstats::profile;
use solarstats::rank;

// ===================== MAIN =====================

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let metrics = args.metric_list();

    if !args.weights.is_empty() {
        if args.weights.len() != metrics.len() {
            return Err(format!(
                "{} weights given for {} metrics; pass one --weight per --metric",
                args.weights.len(),
                metrics.len()
            )
            .into());
        }
        if args.weights.iter().sum::<f64>() <= 0.0 {
            return Err("ranking weights must not all be zero".into());
        }
    }
    let weights = if args.weights.is_empty() { None } else { Some(args.weights.as_slice()) };

    // ===================== LOAD =====================
    let raw = load::load_dir(&args.data_dir)?;
    let countries = raw.countries();
    info!("loaded {} records across {} countries", raw.len(), countries.len());
    for country in &countries {
        let per = raw.filter_by_country(std::slice::from_ref(country));
        let first = per.records.first().map(|r| r.timestamp);
        let last = per.records.last().map(|r| r.timestamp);
        if let (Some(first), Some(last)) = (first, last) {
            info!("  {}: {} records, {} to {}", country, per.len(), first, last);
        }
    }

    // ===================== CLEAN =====================
    let dataset = if args.no_clean {
        raw
    } else {
        let (cleaned, reports) = clean::clean_all(&raw, &metrics, args.z_threshold);
        for report in reports.iter().filter(|r| r.replaced > 0) {
            info!(
                "  {} {}: replaced {} of {} values with median {:.1}",
                report.country, report.metric, report.replaced, report.inspected, report.imputed_with
            );
        }
        cleaned
    };

    // ===================== PROFILE =====================
    let summaries = profile::profile(&dataset, &metrics);
    println!("Summary statistics ({} rows):", summaries.len());
    for row in &summaries {
        println!(
            "  {:<14} {:<5} mean {:>8.1}  median {:>8.1}  std {:>8.1}  skew {:>6.2}  missing {}",
            row.country, row.metric.column(), row.mean, row.median, row.std_dev, row.skewness,
            row.missing
        );
    }

    // ===================== COMPARE =====================
    if countries.len() >= 2 {
        let results = compare::compare_all(&dataset, &metrics, &countries, args.alpha)?;
        println!("\nHypothesis tests (alpha = {}):", args.alpha);
        for r in &results {
            if r.test == compare::TestKind::Insufficient {
                println!("  {:<5} insufficient data, no test run", r.metric.column());
                continue;
            }
            let verdict = if r.significant { "significant" } else { "not significant" };
            println!(
                "  {:<5} {:<15} statistic {:>10.3}  p {:>8.5}  {}",
                r.metric.column(),
                r.test.to_string(),
                r.statistic,
                r.p_value,
                verdict
            );
        }
        export::export_test_results(&results, &args.out_dir)?;
    } else {
        println!("\nOnly one country found, skipping hypothesis tests");
    }

    // ===================== RANK =====================
    let ranking = rank::get_country_ranking(&summaries, &metrics, weights);
    println!("\nCountry ranking (composite of {} normalized metrics):", metrics.len());
    for entry in &ranking.entries {
        println!(
            "  #{} {:<14} score {:.3}  (GHI mean {:.1} W/m²)",
            entry.rank, entry.country, entry.score, entry.ghi_mean
        );
    }
    print_insights(&summaries, &metrics);

    // ===================== EXPORT =====================
    export::export_summary_table(&summaries, &args.out_dir)?;
    export::export_ranking(&ranking.entries, &args.out_dir)?;

    if !args.no_plots {
        std::fs::create_dir_all(&args.out_dir)?;
        for &metric in &metrics {
            let name = metric.column().to_lowercase();
            plot::boxplot(&dataset, metric, &args.out_dir.join(format!("boxplot_{}.png", name)))?;
            plot::time_series(
                &dataset,
                metric,
                &args.out_dir.join(format!("timeseries_{}.png", name)),
            )?;
        }
        plot::correlation_heatmap(&dataset, &metrics, &args.out_dir.join("heatmap.png"))?;
        plot::radar_chart(&ranking.radar, &args.out_dir.join("radar.png"))?;
    }

    println!("\nTables and charts written to {}", args.out_dir.display());
    Ok(())
}

/// Best/worst country and the performance gap for each metric.
fn print_insights(summaries: &[profile::SummaryRow], metrics: &[Metric]) {
    println!("\nInsights:");
    for &metric in metrics {
        let mut rows: Vec<_> =
            summaries.iter().filter(|r| r.metric == metric && r.mean.is_finite()).collect();
        if rows.len() < 2 {
            continue;
        }
        rows.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(std::cmp::Ordering::Equal));
        let best = rows.first().unwrap();
        let worst = rows.last().unwrap();
        println!(
            "  {}: best {} ({:.1}), development potential {} ({:.1}), gap {:.1}",
            metric.column(),
            best.country,
            best.mean,
            worst.country,
            worst.mean,
            best.mean - worst.mean
        );
    }
}

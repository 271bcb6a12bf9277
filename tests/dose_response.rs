//! End-to-end tests for the public analysis API
//!
//! Scenarios run the full pipeline: dataset → series → fit → metrics →
//! summary, checking coverage, ordering, and failure folding.

use dosefit::prelude::*;

/// Five-point inhibition series with a midpoint near 10 nM
fn inhibition_dataset() -> Dataset {
    let mut data = Dataset::default();
    let concentrations = [0.1, 1.0, 10.0, 100.0, 1000.0];
    let responses = [95.0, 90.0, 50.0, 10.0, 5.0];
    for (&conc, &resp) in concentrations.iter().zip(responses.iter()) {
        data.add("B1", None, conc, resp);
    }
    data
}

fn guesses_for_b1() -> GuessTable {
    let mut table = GuessTable::default();
    table.add("B1", None, 10.0, 1.0);
    table
}

#[test]
fn inhibition_series_converges_with_plausible_ic50() {
    let analysis = analyze(
        &inhibition_dataset(),
        &guesses_for_b1(),
        &AggregateOptions::new(),
    )
    .unwrap();

    assert_eq!(analysis.units.len(), 1);
    let unit = &analysis.units[0];
    let fit = unit.fit.as_ref().unwrap();
    let metrics = unit.metrics.as_ref().unwrap();

    assert!(
        metrics.ic50 >= 5.0 && metrics.ic50 <= 20.0,
        "IC50 {} outside the expected window",
        metrics.ic50
    );
    assert!(!metrics.ic50_extrapolated);
    // AUC bounded by the asymptotes times the tested range
    assert!(metrics.auc > 5.0 * (1000.0 - 0.1));
    assert!(metrics.auc < 95.0 * (1000.0 - 0.1));
    // decreasing data: low-dose asymptote above high-dose asymptote
    assert!(fit.params.a > fit.params.b);
}

#[test]
fn two_point_series_fails_with_insufficient_data() {
    let mut data = Dataset::default();
    data.add("B1", None, 1.0, 90.0);
    data.add("B1", None, 10.0, 10.0);

    let analysis = analyze(&data, &GuessTable::default(), &AggregateOptions::new()).unwrap();

    let unit = &analysis.units[0];
    assert_eq!(
        unit.fit,
        Err(FitError::InsufficientData {
            found: 2,
            required: 4
        })
    );
    assert!(unit.metrics.is_none());

    // the batch still appears in the summary, with empty metric values
    let row = &analysis.summary.rows()[0];
    let cell = row.cells[0].as_ref().unwrap();
    assert_eq!(cell.ic50, None);
    assert_eq!(cell.auc, None);
}

#[test]
fn invalid_concentrations_are_dropped_without_losing_the_series() {
    let mut data = inhibition_dataset();
    data.add("B1", None, 0.0, 88.0);
    data.add("B1", None, -2.0, 70.0);

    let analysis = analyze(&data, &guesses_for_b1(), &AggregateOptions::new()).unwrap();

    let unit = &analysis.units[0];
    assert_eq!(unit.n_points, 5);
    assert_eq!(unit.n_rejected, 2);
    assert!(unit.fit.is_ok());
}

#[test]
fn row_count_matches_distinct_batches_despite_failures() {
    let mut data = Dataset::default();
    // fits cleanly
    for (&conc, &resp) in [0.1, 1.0, 10.0, 100.0, 1000.0]
        .iter()
        .zip([95.0, 90.0, 50.0, 10.0, 5.0].iter())
    {
        data.add("B1", None, conc, resp);
    }
    // too sparse
    data.add("B2", None, 1.0, 90.0);
    data.add("B2", None, 10.0, 10.0);
    // all points invalid
    data.add("B3", None, -1.0, 90.0);

    let analysis = analyze(&data, &GuessTable::default(), &AggregateOptions::new()).unwrap();

    assert_eq!(analysis.summary.rows().len(), 3);
    let batches: Vec<&str> = analysis
        .summary
        .rows()
        .iter()
        .map(|r| r.batch.as_str())
        .collect();
    assert_eq!(batches, vec!["B1", "B2", "B3"]);
    assert!(matches!(
        analysis.units[2].fit,
        Err(FitError::InsufficientData { found: 0, .. })
    ));
}

#[test]
fn repeated_runs_yield_bitwise_identical_results() {
    let data = inhibition_dataset();
    let guesses = guesses_for_b1();
    let options = AggregateOptions::new();

    let first = analyze(&data, &guesses, &options).unwrap();
    let second = analyze(&data, &guesses, &options).unwrap();

    assert_eq!(first.summary, second.summary);
    for (a, b) in first.units.iter().zip(second.units.iter()) {
        let (fa, fb) = (a.fit.as_ref().unwrap(), b.fit.as_ref().unwrap());
        assert_eq!(fa.params.a.to_bits(), fb.params.a.to_bits());
        assert_eq!(fa.params.b.to_bits(), fb.params.b.to_bits());
        assert_eq!(fa.params.c.to_bits(), fb.params.c.to_bits());
        assert_eq!(fa.params.d.to_bits(), fb.params.d.to_bits());
        assert_eq!(fa.rss.to_bits(), fb.rss.to_bits());
    }
}

#[test]
fn timepoints_pivot_into_qualified_columns() {
    let mut data = Dataset::default();
    let concentrations = [0.1, 1.0, 10.0, 100.0, 1000.0];
    let early = [95.0, 88.0, 52.0, 12.0, 6.0];
    let late = [97.0, 80.0, 35.0, 8.0, 4.0];
    for (&conc, (&r24, &r72)) in concentrations.iter().zip(early.iter().zip(late.iter())) {
        data.add("B1", Some("24h"), conc, r24);
        data.add("B1", Some("72h"), conc, r72);
    }
    // B2 measured at 24h only
    for (&conc, &resp) in concentrations.iter().zip(early.iter()) {
        data.add("B2", Some("24h"), conc, resp);
    }

    let analysis = analyze(&data, &GuessTable::default(), &AggregateOptions::new()).unwrap();

    let table = &analysis.summary;
    assert_eq!(
        table.timepoints(),
        &[Some("24h".to_string()), Some("72h".to_string())]
    );
    assert_eq!(table.rows().len(), 2);
    assert!(table.rows()[0].cells[0].is_some());
    assert!(table.rows()[0].cells[1].is_some());
    assert!(table.rows()[1].cells[0].is_some());
    assert!(table.rows()[1].cells[1].is_none());

    let csv = table.to_csv();
    assert!(csv.starts_with("BatchID,IC50_24h,IC50_72h,AUC_24h,AUC_72h"));
}

#[test]
fn csv_input_round_trips_through_the_pipeline() {
    let points_csv = "\
BatchID,TimepointID,Concentration,Response
B1,24h,0.1,95.0
B1,24h,1.0,90.0
B1,24h,10.0,50.0
B1,24h,100.0,10.0
B1,24h,1000.0,5.0
";
    let guesses_csv = "\
BatchID,TimepointID,InitialIC50,InitialSlope
B1,24h,10.0,1.0
";
    let data = dosefit::data::points_from_reader(points_csv.as_bytes()).unwrap();
    let guesses = dosefit::data::guesses_from_reader(guesses_csv.as_bytes()).unwrap();

    let analysis = analyze(&data, &guesses, &AggregateOptions::new()).unwrap();
    let metrics = analysis.units[0].metrics.as_ref().unwrap();
    assert!(metrics.ic50 >= 5.0 && metrics.ic50 <= 20.0);
}

#[test]
fn plot_artifacts_are_written_for_every_unit() {
    let dir = std::env::temp_dir().join(format!("dosefit_e2e_{}", std::process::id()));

    let mut data = inhibition_dataset();
    // a unit that fails to fit still gets an artifact
    data.add("B2", None, 1.0, 90.0);
    data.add("B2", None, 10.0, 10.0);

    let options = AggregateOptions::new().with_plot_dir(&dir);
    let analysis = analyze(&data, &guesses_for_b1(), &options).unwrap();

    assert_eq!(analysis.units.len(), 2);
    for unit in &analysis.units {
        let path = unit.plot.as_ref().expect("artifact path");
        assert!(path.exists(), "missing artifact {}", path.display());
    }
    let row = &analysis.summary.rows()[0];
    assert!(row.cells[0].as_ref().unwrap().plot.is_some());

    std::fs::remove_dir_all(&dir).ok();
}

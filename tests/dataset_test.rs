use antennae::{GaConfig, GeneticEngine, GeoGrid};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_dataset() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, ",N,E,populations,countries").unwrap();
    let mut row = 0;
    for i in 0..10 {
        for j in 0..10 {
            let country = if i < 7 { "PL" } else { "CZ" };
            writeln!(
                file,
                "{},{},{},{},{}",
                row,
                49.0 + i as f64 * 0.5,
                14.0 + j as f64 * 1.0,
                100 + (i * j) % 17 * 10,
                country
            )
            .unwrap();
            row += 1;
        }
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_load_and_normalize() {
    let file = write_dataset();
    let grid = GeoGrid::from_csv_path(file.path()).unwrap();
    assert_eq!(grid.len(), 100);

    let index = grid.build_index().unwrap();
    let sum: f64 = index.weights().iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);

    // Foreign rows are down-weighted by a factor of 100 relative to domestic ones
    let records = grid.records();
    let domestic = records.iter().position(|r| r.is_domestic() && r.population == 100.0).unwrap();
    let foreign = records.iter().position(|r| !r.is_domestic() && r.population == 100.0).unwrap();
    let ratio = index.weights()[domestic] / index.weights()[foreign];
    assert!((ratio - 100.0).abs() < 1e-6);

    // Easting spans 9, northing 4.5: one scale factor keeps the 2:1 aspect
    let domain = index.domain();
    assert!((domain.x_max - 1.0).abs() < 1e-12);
    assert!((domain.y_max - 0.5).abs() < 1e-12);
    assert!(index.points().iter().all(|&p| domain.contains(p)));
}

#[test]
fn test_quoted_thousands_rejected_with_line() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "N,E,populations,countries\n50,14,100,PL\n51,15,\"2,000\",PL").unwrap();
    file.flush().unwrap();
    let result = GeoGrid::from_csv_path(file.path());
    assert!(matches!(result, Err(antennae::AntennaError::Dataset { line: 3, .. })));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = GeoGrid::from_csv_path("/nonexistent/fixed_data.csv");
    assert!(matches!(result, Err(antennae::AntennaError::Io(_))));
}

#[test]
fn test_run_from_yaml_config() {
    let file = write_dataset();
    let index = Arc::new(GeoGrid::from_csv_path(file.path()).unwrap().build_index().unwrap());

    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        "population_size: 4\nn_antennae: 6\ndefault_power: 0.3\np_crossover: 0.8\np_mutation: 1.0\nmutation_std: 0.15\nn_generations: 12\nk_neighbors: 3\nseed: 0"
    )
    .unwrap();
    let config = GaConfig::from_yaml_file(config_file.path()).unwrap();
    assert_eq!(config.default_power, 0.3);

    let mut engine = GeneticEngine::from_config(config, index).unwrap();
    engine.run().unwrap();
    assert_eq!(engine.history().len(), 12);

    let summary = antennae::report::summarize(&engine, 5).unwrap();
    assert_eq!(summary.generations.len(), 12);
    assert_eq!(summary.snapshots.len(), 5);
    assert_eq!(summary.final_best.antennae.len(), 6);
    let json = summary.to_json().unwrap();
    assert!(json.contains("\"max_fitness\""));
}

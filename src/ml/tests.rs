//! Integration tests for ML module

use super::*;
use crate::config::TrainerConfig;
use crate::error::PredictorError;
use smartcore::linalg::basic::arrays::Array;

/// Repeating pattern so the next value is fully determined by the window
fn cyclic(len: usize) -> Vec<u32> {
    (0..len).map(|i| [3, 8, 1, 8, 5][i % 5]).collect()
}

fn quick_trainer() -> ClassifierTrainer {
    ClassifierTrainer::new(TrainerConfig {
        n_trees: 20,
        ..Default::default()
    })
}

#[test]
fn test_feature_layout() {
    let builder = FeatureBuilder::new(4);
    let vector = builder.vector(&[2, 5, 4, 9]);

    assert_eq!(vector.len(), builder.feature_len());
    assert_eq!(&vector[..4], &[2.0, 5.0, 4.0, 9.0]);
    assert_eq!(vector[4], 5.0); // mean
    assert!((vector[5] - 2.5495097567963922).abs() < 1e-12); // population std
    assert_eq!(vector[6], 9.0); // max
    assert_eq!(vector[7], 2.0); // min
    assert_eq!(vector[8], 2.0); // evens
}

#[test]
fn test_build_aligns_targets() {
    let builder = FeatureBuilder::new(3);
    let set = builder.build(&[1, 2, 3, 4, 5, 6]);

    assert_eq!(set.len(), 3);
    assert_eq!(set.targets, vec![4, 5, 6]);
    assert_eq!(&set.features[0][..3], &[1.0, 2.0, 3.0]);
    assert_eq!(&set.features[2][..3], &[3.0, 4.0, 5.0]);
}

#[test]
fn test_build_too_short_is_empty() {
    let builder = FeatureBuilder::default();
    assert!(builder.build(&[1; 10]).is_empty());
    assert!(builder.build(&[]).is_empty());
    assert_eq!(builder.build(&[1; 11]).len(), 1);
}

#[test]
fn test_latest_uses_trailing_window() {
    let builder = FeatureBuilder::new(2);
    assert_eq!(builder.latest(&[1]), None);
    let latest = builder.latest(&[7, 1, 2]).unwrap();
    assert_eq!(&latest[..2], &[1.0, 2.0]);
}

#[test]
fn test_feature_names_match_length() {
    let builder = FeatureBuilder::default();
    let names = builder.feature_names();
    assert_eq!(names.len(), builder.feature_len());
    assert_eq!(names[0], "lag_10");
    assert_eq!(names[9], "lag_1");
    assert_eq!(names[14], "window_evens");
}

#[test]
fn test_split_is_reproducible() {
    let (train_a, test_a) = split_indices(50, 0.2, 42);
    let (train_b, test_b) = split_indices(50, 0.2, 42);
    assert_eq!(train_a, train_b);
    assert_eq!(test_a, test_b);
    assert_eq!(test_a.len(), 10);
    assert_eq!(train_a.len(), 40);

    let mut all: Vec<usize> = train_a.iter().chain(&test_a).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_split_rounds_holdout_up() {
    let (train, test) = split_indices(26, 0.2, 42);
    assert_eq!(test.len(), 6);
    assert_eq!(train.len(), 20);
}

#[test]
fn test_insufficient_training_rows() {
    let set = FeatureBuilder::default().build(&cyclic(34));
    // 24 rows -> 5 held out, 19 for training
    let err = quick_trainer().train(&set).unwrap_err();
    match err {
        PredictorError::InsufficientTrainingData { available, required } => {
            assert_eq!(available, 19);
            assert_eq!(required, 20);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_train_learns_cycle() {
    let builder = FeatureBuilder::default();
    let history = cyclic(120);
    let model = quick_trainer().train(&builder.build(&history)).unwrap();

    assert_eq!(model.classes(), &[1, 3, 5, 8]);
    let summary = model.summary();
    assert_eq!(summary.training_rows + summary.holdout_rows, 110);
    assert_eq!(summary.holdout_rows, 22);
    assert!(summary.holdout_accuracy.unwrap() > 0.9);

    // history ends with ... 3 8 1 8 5, next is 3
    let next = model.predict(&builder.latest(&history).unwrap()).unwrap();
    assert_eq!(next.label, 3);
    assert!(next.probability > 0.5 && next.probability <= 1.0);
}

#[test]
fn test_training_is_deterministic() {
    let builder = FeatureBuilder::default();
    let history: Vec<u32> = (0..150u32).map(|i| (i * 7 + i / 3) % 11).collect();
    let set = builder.build(&history);
    let a = quick_trainer().train(&set).unwrap();
    let b = quick_trainer().train(&set).unwrap();

    let x = builder.latest(&history).unwrap();
    assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    assert_eq!(a.holdout_accuracy(), b.holdout_accuracy());
    assert_eq!(a.scale(&set.features).unwrap(), b.scale(&set.features).unwrap());
}

#[test]
fn test_probabilities_sum_to_one() {
    let builder = FeatureBuilder::default();
    let history = cyclic(120);
    let model = quick_trainer().train(&builder.build(&history)).unwrap();

    let x = builder.latest(&history).unwrap();
    let proba = model.predict_proba(&x).unwrap();
    assert_eq!(proba.len(), model.classes().len());
    assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);

    let best = model.predict(&x).unwrap();
    let max = proba.iter().cloned().fold(f64::MIN, f64::max);
    assert_eq!(best.probability, max);
}

#[test]
fn test_scaler_fitted_on_training_rows_only() {
    let builder = FeatureBuilder::new(2);
    let history: Vec<u32> = (0..40).collect();
    let set = builder.build(&history);
    let config = TrainerConfig {
        n_trees: 5,
        ..Default::default()
    };
    let model = ClassifierTrainer::new(config.clone()).train(&set).unwrap();

    let (train_idx, _) = split_indices(set.len(), config.test_ratio, config.seed);
    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| set.features[i].clone()).collect();

    let expected = trainer::scale_matrix(&trainer::fit_scaler(&train_rows).unwrap(), &set.features)
        .unwrap();
    let scaled = model.scale(&set.features).unwrap();
    for (i, row) in scaled.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            assert_eq!(*v, *expected.get((i, j)));
        }
    }

    // Training rows come out centred
    let scaled_train = model.scale(&train_rows).unwrap();
    let lag_mean = scaled_train.iter().map(|r| r[0]).sum::<f64>() / scaled_train.len() as f64;
    assert!(lag_mean.abs() < 1e-9);
}

#[test]
fn test_constant_columns_scale_to_zero() {
    let rows = vec![vec![1.0, 4.0], vec![3.0, 4.0], vec![5.0, 4.0]];
    let scaler = trainer::fit_scaler(&rows).unwrap();
    let scaled = trainer::scale_matrix(&scaler, &[vec![3.0, 4.0]]).unwrap();
    assert_eq!(*scaled.get((0, 0)), 0.0);
    assert_eq!(*scaled.get((0, 1)), 0.0);
}

#[test]
fn test_equal_probabilities_pick_smaller_class() {
    let best = trainer::best_class(&[2, 5, 9], &[0.25, 0.375, 0.375]).unwrap();
    assert_eq!(best.label, 5);
    assert_eq!(best.probability, 0.375);

    let best = trainer::best_class(&[1, 3], &[0.5, 0.5]).unwrap();
    assert_eq!(best.label, 1);

    assert!(trainer::best_class(&[], &[]).is_none());
}

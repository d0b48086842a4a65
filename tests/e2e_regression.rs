//! End-to-end tests: encrypted regression against the integer reference

use encrypted_regression::math::DEFAULT_SIGMA;
use encrypted_regression::regression::{append_export, read_exports, ExportPaths};
use encrypted_regression::{
    regress_plaintext, select_parameters, Batcher, Dataset, DecryptedResult,
    EncryptedRegressionEngine, KeyAuthority, NoiseModel, PublicKeySet, RegressionError,
    Plaintext, ResultExtractor, Sampler, SecurityLevel, SheContext,
};
use encrypted_regression::she::Encryptor;

fn toy_context(p: u64, g: u64, rows: usize, dim: usize) -> SheContext {
    let sel = select_parameters(p, g, rows, dim, &NoiseModel::default(), SecurityLevel::Toy)
        .unwrap();
    SheContext::new(&sel.params).unwrap()
}

fn run_encrypted(ctx: &SheContext, dataset: &Dataset, seed: u64) -> DecryptedResult {
    let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, seed);
    let authority = KeyAuthority::generate(ctx, &mut sampler);
    let mut engine = EncryptedRegressionEngine::new(
        ctx,
        authority.public_keys().clone(),
        dataset.dim(),
        sampler,
    )
    .with_strict_depth(true);

    engine
        .add_batch(&Batcher::new(ctx).batch(dataset).unwrap())
        .unwrap();
    engine.regress().unwrap();
    engine
        .extract(&ResultExtractor::new(ctx, authority.secret_key()))
        .unwrap()
}

/// Deterministic pseudo-random dataset with small signed entries
fn synthetic(rows: usize, dim: usize, salt: i64) -> Dataset {
    let value = |i: i64, j: i64| ((i * 31 + j * 17 + salt) * 7919 % 41) - 20;
    let features = (0..rows as i64)
        .map(|i| (0..dim as i64).map(|j| value(i, j)).collect())
        .collect();
    let labels = (0..rows as i64).map(|i| value(i, dim as i64 + 3)).collect();
    Dataset::new(features, labels).unwrap()
}

#[test]
fn test_two_features_mod_8191() {
    let dataset = Dataset::parse("20 17 -26\n5 22 39\n8 7 -1\n24 23 20\n").unwrap();
    let ctx = toy_context(8191, 17, dataset.rows(), dataset.dim());

    let result = run_encrypted(&ctx, &dataset, 42);
    assert_eq!(result.theta, vec![3, 5]);
    assert_eq!(result.det, 2);
    assert!(result.matches(&regress_plaintext(&dataset).unwrap(), 8191));
}

#[test]
fn test_slot_zero_roundtrip() {
    let ctx = toy_context(257, 3, 10, 1);
    let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, 13);
    let authority = KeyAuthority::generate(&ctx, &mut sampler);
    let encryptor = Encryptor::new(&ctx, &authority.public_keys().encryption);
    let extractor = ResultExtractor::new(&ctx, authority.secret_key());

    for v in [0i64, 1, 128, 255, 256] {
        let pt = Plaintext::encode(&[v], ctx.ring_dim(), 257).unwrap();
        let ct = encryptor.encrypt(&pt, &mut sampler).unwrap();
        assert_eq!(extractor.extract_scalar(&ct).unwrap(), v as u64);
        assert!(extractor.decode_slots(&ct).unwrap()[1..].iter().all(|&s| s == 0));
        assert!(extractor.noise_bits(&ct) < (ctx.chain()[0] as f64).log2() - 1.0);
    }
}

#[test]
fn test_single_feature_single_block() {
    let dataset = synthetic(20, 1, 1);
    let ctx = toy_context(257, 3, dataset.rows(), 1);
    let reference = regress_plaintext(&dataset).unwrap();

    let result = run_encrypted(&ctx, &dataset, 7);
    assert_eq!(result.det, reference.det_mod(257));
    assert_eq!(result.theta, reference.theta_mod(257));
}

#[test]
fn test_block_boundaries() {
    // 128 rows fill two blocks of 64 exactly; 100 rows leave a padded block
    for rows in [128, 100] {
        let dataset = synthetic(rows, 2, rows as i64);
        let ctx = toy_context(257, 3, rows, 2);
        let reference = regress_plaintext(&dataset).unwrap();

        let result = run_encrypted(&ctx, &dataset, rows as u64);
        assert!(result.matches(&reference, 257), "rows = {}", rows);
    }
}

#[test]
fn test_three_features() {
    let dataset = synthetic(30, 3, 5);
    let ctx = toy_context(257, 3, dataset.rows(), 3);
    let reference = regress_plaintext(&dataset).unwrap();

    let result = run_encrypted(&ctx, &dataset, 11);
    assert!(result.matches(&reference, 257));
}

#[test]
fn test_singular_system_encrypted() {
    // Second feature is twice the first, so det(G) = 0
    let dataset = Dataset::new(vec![vec![1, 2], vec![2, 4], vec![3, 6]], vec![1, 2, 3]).unwrap();
    let ctx = toy_context(257, 3, dataset.rows(), dataset.dim());
    let reference = regress_plaintext(&dataset).unwrap();
    assert!(reference.is_singular());

    let result = run_encrypted(&ctx, &dataset, 17);
    assert_eq!(result.det, 0);
    assert!(result.matches(&reference, 257));
}

#[test]
fn test_split_add_data_matches_single_call() {
    let dataset = synthetic(150, 2, 9);
    let ctx = toy_context(257, 3, dataset.rows(), 2);
    let batch = Batcher::new(&ctx).batch(&dataset).unwrap();
    assert_eq!(batch.n_blocks(), 3);

    let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, 3);
    let authority = KeyAuthority::generate(&ctx, &mut sampler);
    let mut engine =
        EncryptedRegressionEngine::new(&ctx, authority.public_keys().clone(), 2, sampler);

    let (head, tail) = batch.split_at(1);
    engine.add_data(&head.features, &head.labels).unwrap();
    engine.add_data(&tail.features, &tail.labels).unwrap();
    assert_eq!(engine.data().n_blocks(), 3);

    engine.regress().unwrap();
    let result = engine
        .extract(&ResultExtractor::new(&ctx, authority.secret_key()))
        .unwrap();
    assert!(result.matches(&regress_plaintext(&dataset).unwrap(), 257));
}

#[test]
fn test_repeated_data_scales_by_two_to_the_dim() {
    let dataset = synthetic(10, 2, 4);
    let ctx = toy_context(257, 3, 20, 2);
    let batch = Batcher::new(&ctx).batch(&dataset).unwrap();
    let reference = regress_plaintext(&dataset).unwrap();

    let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, 8);
    let authority = KeyAuthority::generate(&ctx, &mut sampler);
    let mut engine =
        EncryptedRegressionEngine::new(&ctx, authority.public_keys().clone(), 2, sampler);
    engine.add_batch(&batch).unwrap();
    engine.add_batch(&batch).unwrap();
    engine.regress().unwrap();
    let result = engine
        .extract(&ResultExtractor::new(&ctx, authority.secret_key()))
        .unwrap();

    // G and b double, so det(2G) = 4·det(G) and every θ'_i scales by 4
    assert_eq!(result.det, reference.det_mod(257) * 4 % 257);
    let scaled: Vec<u64> = reference
        .theta_mod(257)
        .iter()
        .map(|t| t * 4 % 257)
        .collect();
    assert_eq!(result.theta, scaled);
}

#[test]
fn test_strict_depth_exhaustion() {
    // A chain sized for one feature cannot solve a two-feature system
    let dataset = synthetic(10, 2, 2);
    let ctx = toy_context(257, 3, dataset.rows(), 1);
    let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, 6);
    let authority = KeyAuthority::generate(&ctx, &mut sampler);
    let mut engine =
        EncryptedRegressionEngine::new(&ctx, authority.public_keys().clone(), 2, sampler)
            .with_strict_depth(true);

    engine
        .add_batch(&Batcher::new(&ctx).batch(&dataset).unwrap())
        .unwrap();
    assert!(matches!(
        engine.regress(),
        Err(RegressionError::DepthBudgetExhausted(_))
    ));
}

#[test]
fn test_exported_public_keys_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ExportPaths::new(dir.path());
    let dataset = synthetic(12, 2, 3);
    let ctx = toy_context(257, 3, dataset.rows(), 2);

    let mut sampler = Sampler::with_seed(DEFAULT_SIGMA, 21);
    let authority = KeyAuthority::generate(&ctx, &mut sampler);
    append_export(&paths.public_key(), authority.public_keys()).unwrap();
    append_export(&paths.public_key(), authority.public_keys()).unwrap();

    let imported: Vec<PublicKeySet> = read_exports(&paths.public_key()).unwrap();
    assert_eq!(imported.len(), 2);

    let keys = imported.into_iter().next().unwrap();
    let mut engine = EncryptedRegressionEngine::new(&ctx, keys, 2, sampler);
    engine
        .add_batch(&Batcher::new(&ctx).batch(&dataset).unwrap())
        .unwrap();
    engine.regress().unwrap();
    append_export(&paths.encrypted_data(), engine.data()).unwrap();

    let result = engine
        .extract(&ResultExtractor::new(&ctx, authority.secret_key()))
        .unwrap();
    assert!(result.matches(&regress_plaintext(&dataset).unwrap(), 257));
}

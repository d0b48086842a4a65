//! regression_tool: encrypted linear regression driver
//!
//! Loads an integer dataset, runs the encrypted regression end to end and
//! checks the decrypted result against the plaintext reference modulo p.

use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use clap::{error::ErrorKind, Parser, ValueEnum};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use encrypted_regression::regression::{append_export, ExportPaths};
use encrypted_regression::{
    regress_plaintext, select_parameters, Batcher, Dataset, EncryptedRegressionEngine,
    KeyAuthority, NoiseModel, ResultExtractor, Sampler, SecurityLevel, SheContext,
};

const USAGE: &str = "usage: regression_tool datafile p generator";

#[derive(Clone, Copy, ValueEnum)]
enum Security {
    Toy,
    Bits128,
}

impl From<Security> for SecurityLevel {
    fn from(s: Security) -> Self {
        match s {
            Security::Toy => SecurityLevel::Toy,
            Security::Bits128 => SecurityLevel::Bits128,
        }
    }
}

#[derive(Parser)]
#[command(name = "regression_tool")]
#[command(about = "Linear regression over homomorphically encrypted data")]
#[command(version)]
struct Args {
    /// Dataset file: one row per line, label last
    datafile: PathBuf,

    /// Plaintext prime p
    p: u64,

    /// Generator of Z_p^*
    generator: u64,

    /// Directory receiving the append-mode exports
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Random seed for deterministic keys and encryption
    #[arg(long)]
    seed: Option<u64>,

    /// Fail instead of continuing when the depth budget runs out
    #[arg(long)]
    strict_depth: bool,

    #[arg(long, value_enum, default_value = "bits128")]
    security: Security,

    /// JSON file overriding the noise-growth constants
    #[arg(long)]
    noise_model: Option<PathBuf>,
}

fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    }
}

fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = parse_args();
    let exports = ExportPaths::new(&args.output_dir);
    let total_start = Instant::now();

    let dataset = match Dataset::load(&args.datafile) {
        Ok(ds) => ds,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    info!(
        "Loaded {} rows × {} features from {}",
        dataset.rows(),
        dataset.dim(),
        args.datafile.display()
    );

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    append_export(&exports.raw_data(), dataset.features())
        .context("Failed to export raw data")?;

    let noise = match &args.noise_model {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read noise model {}", path.display()))?;
            serde_json::from_str(&text).context("Failed to parse noise model")?
        }
        None => NoiseModel::default(),
    };

    let param_start = Instant::now();
    let selection = select_parameters(
        args.p,
        args.generator,
        dataset.rows(),
        dataset.dim(),
        &noise,
        args.security.into(),
    )
    .context("Parameter selection failed")?;
    let params = &selection.params;
    println!("data file:   {}", args.datafile.display());
    println!("logQ:        {}", selection.log_q);
    println!("p:           {}", args.p);
    println!("generator:   {}", args.generator);
    println!("block size:  {}", selection.block_size);
    println!("num blocks:  {}", selection.n_blocks);
    info!(
        "Ring dimension {}, {} levels of {}-bit primes",
        params.ring_dim, params.levels, params.prime_bits
    );

    let reference = regress_plaintext(&dataset).context("Reference solver failed")?;
    println!("expected theta mod p: {:?}", reference.theta_mod(args.p));
    println!("expected det mod p:   {}", reference.det_mod(args.p));
    if reference.is_singular() {
        warn!("Gram matrix is singular over the integers; theta is not unique");
    }

    let ctx = SheContext::new(params).context("Failed to build encryption context")?;
    let mut sampler = match args.seed {
        Some(seed) => Sampler::with_seed(params.sigma, seed),
        None => Sampler::new(params.sigma),
    };
    let param_time = param_start.elapsed();

    let keygen_start = Instant::now();
    let pb = spinner("Generating keys...")?;
    let authority = KeyAuthority::generate(&ctx, &mut sampler);
    pb.finish_and_clear();
    let keygen_time = keygen_start.elapsed();
    info!(
        "Public key material: {} bytes",
        bincode::serialized_size(authority.public_keys()).unwrap_or(0)
    );

    let encrypt_start = Instant::now();
    let batch = Batcher::new(&ctx).batch(&dataset)?;
    let mut engine =
        EncryptedRegressionEngine::new(&ctx, authority.public_keys().clone(), dataset.dim(), sampler)
            .with_strict_depth(args.strict_depth);
    engine.add_batch(&batch).context("Encryption failed")?;
    let encrypt_time = encrypt_start.elapsed();

    let regress_start = Instant::now();
    let pb = spinner("Evaluating regression...")?;
    engine.regress().context("Encrypted regression failed")?;
    pb.finish_and_clear();
    let regress_time = regress_start.elapsed();

    let decrypt_start = Instant::now();
    let extractor = ResultExtractor::new(&ctx, authority.secret_key());
    let result = engine.extract(&extractor).context("Decryption failed")?;
    let decrypt_time = decrypt_start.elapsed();
    if let Some(encrypted) = engine.result() {
        debug!(
            noise_bits = extractor.noise_bits(&encrypted.det),
            "determinant noise"
        );
    }
    println!("computed theta:       {:?}", result.theta);

    append_export(&exports.secret_key(), authority.secret_key())
        .context("Failed to export secret key")?;
    append_export(&exports.public_key(), authority.public_keys())
        .context("Failed to export public key")?;
    append_export(&exports.encrypted_data(), engine.data())
        .context("Failed to export encrypted data")?;

    println!("computed det:         {}", result.det);

    println!();
    println!("parameters:  {:.2?}", param_time);
    println!("key gen:     {:.2?}", keygen_time);
    println!("encryption:  {:.2?}", encrypt_time);
    println!("regression:  {:.2?}", regress_time);
    println!("decryption:  {:.2?}", decrypt_time);
    println!("total:       {:.2?}", total_start.elapsed());

    if result.matches(&reference, args.p) {
        println!("PASS");
    } else {
        println!("MISMATCH");
    }
    Ok(())
}

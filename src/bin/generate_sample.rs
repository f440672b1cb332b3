use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use clap::Parser;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value as JsonValue};

/// Write a synthetic day of A-weighted SPL readings as JSON, CSV and Parquet.
#[derive(Debug, Parser)]
#[command(about)]
struct Args {
    /// Output directory.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Day to simulate (UTC).
    #[arg(long, default_value = "2024-05-01")]
    day: NaiveDate,

    /// Seconds between readings.
    #[arg(long, default_value_t = 60)]
    step_secs: i64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Quiet nights, a busier day, rush-hour peaks at 08:00 and 17:30.
fn level_at(t: DateTime<Utc>, rng: &mut SimpleRng) -> f64 {
    let hour = t.hour() as f64 + t.minute() as f64 / 60.0;
    let daytime = gaussian(hour, 13.0, 4.5, 14.0);
    let rush = gaussian(hour, 8.0, 0.8, 8.0) + gaussian(hour, 17.5, 1.0, 7.0);
    let level = 42.0 + daytime + rush + rng.gauss(0.0, 1.5);
    (level * 10.0).round() / 10.0
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Records a flaky logger really produces; dropped by the loader.
fn malformed_documents(day: NaiveDate) -> Vec<JsonValue> {
    vec![
        json!({ "timestamp": "not a time", "Value": 55.0, "device": "mic-1" }),
        json!({ "timestamp": format!("{day}T12:00:30Z"), "device": "mic-1" }),
        json!({ "timestamp": format!("{day}T12:01:30Z"), "Value": "n/a", "device": "mic-1" }),
        json!({ "timestamp": null, "Value": 60.0, "device": "mic-1" }),
    ]
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.step_secs > 0, "--step-secs must be positive");

    let mut rng = SimpleRng::new(42);
    let start = args.day.and_time(chrono::NaiveTime::MIN).and_utc();
    let n = (24 * 3600 / args.step_secs) as usize;

    let times: Vec<DateTime<Utc>> = (0..n)
        .map(|i| start + Duration::seconds(i as i64 * args.step_secs))
        .collect();
    let values: Vec<f64> = times.iter().map(|&t| level_at(t, &mut rng)).collect();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    // Uploaders append out of order; start the export with the evening.
    let rotated: Vec<usize> = (n / 2..n).chain(0..n / 2).collect();

    // ---- JSON (document dump with row ids) ----
    let mut docs: Vec<JsonValue> = rotated
        .iter()
        .map(|&i| {
            json!({
                "_id": format!("{:024x}", i),
                "timestamp": times[i].format("%Y-%m-%d %H:%M:%S").to_string(),
                "Value": values[i],
                "device": "mic-1",
            })
        })
        .collect();
    let malformed = malformed_documents(args.day);
    let n_malformed = malformed.len();
    docs.extend(malformed);
    let json_path = args.out_dir.join("spl_sample.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&docs)?)
        .with_context(|| format!("writing {}", json_path.display()))?;
    log::debug!("wrote {} documents to {}", docs.len(), json_path.display());

    // ---- CSV ----
    let csv_path = args.out_dir.join("spl_sample.csv");
    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("creating {}", csv_path.display()))?;
    writer.write_record(["timestamp", "Value", "device"])?;
    for &i in &rotated {
        writer.write_record([
            times[i].to_rfc3339(),
            values[i].to_string(),
            "mic-1".to_string(),
        ])?;
    }
    writer.write_record(["garbage", "55.0", "mic-1"])?;
    writer.write_record([format!("{}T12:00:30Z", args.day).as_str(), "", "mic-1"])?;
    writer.flush()?;
    log::debug!("wrote {} rows to {}", n + 2, csv_path.display());

    // ---- Parquet (native timestamp column) ----
    let schema = Arc::new(Schema::new(vec![
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("Value", DataType::Float64, false),
        Field::new("device", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(
                TimestampMillisecondArray::from(
                    times.iter().map(|t| t.timestamp_millis()).collect::<Vec<_>>(),
                )
                .with_timezone("UTC"),
            ),
            Arc::new(Float64Array::from(values)),
            Arc::new(StringArray::from(vec!["mic-1"; n])),
        ],
    )
    .context("building record batch")?;

    let parquet_path = args.out_dir.join("spl_sample.parquet");
    let file = std::fs::File::create(&parquet_path)
        .with_context(|| format!("creating {}", parquet_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    log::debug!("wrote {n} rows to {}", parquet_path.display());

    println!(
        "Wrote {n} readings every {}s to {}, {} and {} ({n_malformed} malformed JSON documents, 2 malformed CSV rows)",
        args.step_secs,
        json_path.display(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}

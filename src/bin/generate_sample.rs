//! Generate a deterministic one-week hourly load dataset (`testdata.csv`):
//! a double-peak daily profile with weekend damping and seeded noise.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
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

/// Residential-style daily profile: morning and evening peaks on a base
/// load, damped on weekends.
fn hourly_load(hour: f64, weekend: bool, rng: &mut SimpleRng) -> f64 {
    let base = 0.3
        + gaussian(hour, 8.0, 2.5, 0.6)
        + gaussian(hour, 19.0, 3.0, 1.0);
    let scaled = if weekend { base * 0.8 } else { base };
    (scaled + rng.gauss(0.0, 0.02)).max(0.0)
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // One full week starting on a Monday.
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");

    let output_path = "testdata.csv";
    let mut writer = csv::Writer::from_path(output_path).expect("Failed to create output file");
    writer
        .write_record(["datetime", "load"])
        .expect("Failed to write header");

    let mut rows = 0usize;
    for h in 0..(7 * 24) {
        let ts = start + Duration::hours(h);
        let weekend = matches!(ts.weekday(), Weekday::Sat | Weekday::Sun);
        let load = hourly_load((h % 24) as f64, weekend, &mut rng);
        writer
            .write_record([
                ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                format!("{load:.4}"),
            ])
            .expect("Failed to write row");
        rows += 1;
    }
    writer.flush().expect("Failed to flush output");

    println!("Wrote {rows} hourly records (one week) to {output_path}");
}

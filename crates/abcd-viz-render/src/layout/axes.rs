//! Axis ranges, tick placement and labels.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct Axis {
    pub lo: f64,
    pub hi: f64,
    pub scale: Scale,
    pub title: String,
    pub major: Vec<Tick>,
    pub minor: Vec<f64>,
}

impl Axis {
    /// Linear axis spanning exactly `[lo, hi]`, ticks on round values inside it.
    pub fn linear(lo: f64, hi: f64, target_ticks: usize) -> Self {
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, lo + 1.0) };
        let step = round_step((hi - lo) / target_ticks.saturating_sub(1).max(1) as f64);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        let major = (first..=last)
            .map(|k| {
                let value = k as f64 * step;
                Tick { value, label: tick_label(value, step) }
            })
            .collect();
        let minor_step = step / 5.0;
        let minor = ((lo / minor_step).ceil() as i64..=(hi / minor_step).floor() as i64)
            .filter(|k| k % 5 != 0)
            .map(|k| k as f64 * minor_step)
            .collect();
        Self { lo, hi, scale: Scale::Linear, title: String::new(), major, minor }
    }

    /// Linear axis from `lo` to `hi` rounded up to the next tick.
    pub fn linear_to_round(lo: f64, hi: f64, target_ticks: usize) -> Self {
        let step = round_step((hi - lo).max(f64::MIN_POSITIVE) / target_ticks.saturating_sub(1).max(1) as f64);
        Self::linear(lo, (hi / step).ceil() * step, target_ticks)
    }

    /// Logarithmic axis spanning exactly `[lo, hi]` with decade ticks.
    pub fn log(lo: f64, hi: f64) -> Self {
        let lo = lo.max(1e-20);
        let hi = hi.max(lo * 10.0);
        let within = |v: f64| v >= lo * (1.0 - 1e-9) && v <= hi * (1.0 + 1e-9);
        let mut major = Vec::new();
        let mut minor = Vec::new();
        for exp in lo.log10().floor() as i32..=hi.log10().ceil() as i32 {
            let decade = 10f64.powi(exp);
            if within(decade) {
                major.push(Tick { value: decade, label: format!("10{}", superscript(exp)) });
            }
            minor.extend((2..10).map(|m| m as f64 * decade).filter(|&v| within(v)));
        }
        Self { lo, hi, scale: Scale::Log, title: String::new(), major, minor }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Position of `value` along the axis, 0 at `lo` and 1 at `hi`.
    pub fn fraction(&self, value: f64) -> f64 {
        match self.scale {
            Scale::Linear => (value - self.lo) / (self.hi - self.lo),
            Scale::Log => {
                let (v, lo, hi) = (value.max(1e-20).ln(), self.lo.ln(), self.hi.ln());
                (v - lo) / (hi - lo)
            }
        }
    }
}

/// Smallest of 1, 2, 5 × 10ᵏ not below `rough`.
fn round_step(rough: f64) -> f64 {
    let decade = 10f64.powf(rough.abs().log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * decade)
        .find(|&s| s >= rough * (1.0 - 1e-9))
        .unwrap_or(10.0 * decade)
}

fn tick_label(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 { 0 } else { (-step.log10().floor()) as usize };
    let value = if value.abs() < step * 1e-6 { 0.0 } else { value };
    format!("{value:.decimals$}")
}

fn superscript(n: i32) -> String {
    const DIGITS: [char; 10] =
        ['\u{2070}', '\u{00B9}', '\u{00B2}', '\u{00B3}', '\u{2074}', '\u{2075}', '\u{2076}', '\u{2077}', '\u{2078}', '\u{2079}'];
    let mut out = String::new();
    if n < 0 {
        out.push('\u{207B}');
    }
    for d in n.unsigned_abs().to_string().bytes() {
        out.push(DIGITS[(d - b'0') as usize]);
    }
    out
}

//! Rational note durations
//!
//! All notated lengths are exact fractions of a quarter note (`1` = quarter,
//! `1/2` = eighth, `3/2` = dotted quarter). Wall-clock timing stays `f64`
//! seconds; only values that end up in the score are rational.

use num_rational::Ratio;

/// A duration or offset measured in quarter notes
pub type Duration = Ratio<u32>;

/// Build a duration from numerator/denominator
///
/// # Examples
/// ```
/// use transcribe_wasm::models::duration::quarters;
///
/// assert_eq!(quarters(3, 2), quarters(6, 4));
/// ```
pub fn quarters(numer: u32, denom: u32) -> Duration {
    Ratio::new(numer, denom)
}

/// Convert to floating point for comparison against measured timing
pub fn to_f64(duration: Duration) -> f64 {
    *duration.numer() as f64 / *duration.denom() as f64
}

/// Plain vocabulary: whole, half, quarter, eighth, 16th, 32nd
pub fn standard_vocabulary() -> Vec<Duration> {
    vec![
        quarters(4, 1),
        quarters(2, 1),
        quarters(1, 1),
        quarters(1, 2),
        quarters(1, 4),
        quarters(1, 8),
    ]
}

/// Standard vocabulary plus dotted half, dotted quarter and dotted eighth
pub fn dotted_vocabulary() -> Vec<Duration> {
    vec![
        quarters(4, 1),
        quarters(3, 1),
        quarters(2, 1),
        quarters(3, 2),
        quarters(1, 1),
        quarters(3, 4),
        quarters(1, 2),
        quarters(1, 4),
        quarters(1, 8),
    ]
}

/// Snap a measured quarter-note position to a grid of `1/denom` steps
///
/// Negative positions snap to zero.
pub fn snap_to_grid(position: f64, denom: u32) -> Duration {
    if !(position > 0.0) || denom == 0 {
        return Duration::from_integer(0);
    }
    let steps = (position * denom as f64).round();
    Ratio::new(steps as u32, denom)
}

/// Least common multiple of all denominators (at least 1)
///
/// `None` when the result does not fit in `u32`.
pub fn common_denominator<'a, I>(durations: I) -> Option<u32>
where
    I: IntoIterator<Item = &'a Duration>,
{
    durations
        .into_iter()
        .try_fold(1u32, |acc, d| lcm(acc, *d.denom()))
}

/// Render as `"3/2"`, or `"2"` for whole numbers
pub fn format_duration(duration: Duration) -> String {
    if *duration.denom() == 1 {
        duration.numer().to_string()
    } else {
        format!("{}/{}", duration.numer(), duration.denom())
    }
}

/// Parse `"3/2"`, `"2"` or a decimal such as `"0.75"`
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    if let Some((numer, denom)) = text.split_once('/') {
        let numer: u32 = numer.trim().parse().ok()?;
        let denom: u32 = denom.trim().parse().ok()?;
        if denom == 0 {
            return None;
        }
        return Some(Ratio::new(numer, denom));
    }
    if let Ok(whole) = text.parse::<u32>() {
        return Some(Duration::from_integer(whole));
    }
    let value: f64 = text.parse().ok()?;
    from_f64(value)
}

/// Exact conversion for dyadic decimals (0.75, 0.125); others round to 1/960
pub fn from_f64(value: f64) -> Option<Duration> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    // 960 = LCM of dyadic (up to 1/64) and triplet subdivisions
    const RESOLUTION: u32 = 960;
    let steps = (value * RESOLUTION as f64).round();
    if steps > u32::MAX as f64 {
        return None;
    }
    Some(Ratio::new(steps as u32, RESOLUTION))
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn lcm(a: u32, b: u32) -> Option<u32> {
    let (a, b) = (a as u64, b as u64);
    if a == 0 || b == 0 {
        return Some(0);
    }
    u32::try_from(a / gcd(a, b) * b).ok()
}

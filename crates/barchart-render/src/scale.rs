//! Positional scales: a continuous linear scale for values and a band scale for categories.
//!
//! Both follow the d3-scale conventions the charts were designed against (`nice`, tick
//! generation, band step/padding math), so pixel output lines up with dashboards rendered in a
//! browser.

use indexmap::IndexSet;

/// Tick layout over an ascending interval: ticks are the multiples `lo..=hi` of the increment.
///
/// A negative `inc` stands for a step of `1 / -inc`, so sub-unit steps stay exact decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TickSpec {
    lo: i64,
    hi: i64,
    inc: f64,
}

impl TickSpec {
    /// Step factors d3 snaps to, with the error thresholds that select them.
    const SNAPS: [(f64, f64); 3] = [
        (7.0710678118654755, 10.0), // sqrt(50)
        (3.1622776601683795, 5.0),  // sqrt(10)
        (std::f64::consts::SQRT_2, 2.0),
    ];

    fn new(start: f64, stop: f64, count: f64) -> Option<Self> {
        if !(count > 0.0) {
            return None;
        }
        let raw = (stop - start) / count;
        if !raw.is_finite() || raw == 0.0 {
            return None;
        }

        let power = raw.log10().floor();
        let error = raw / 10f64.powf(power);
        let factor = Self::SNAPS
            .iter()
            .find(|(threshold, _)| error >= *threshold)
            .map_or(1.0, |&(_, f)| f);

        let spec = if power < 0.0 {
            let inv = 10f64.powf(-power) / factor;
            let lo = (start * inv).round() as i64;
            let hi = (stop * inv).round() as i64;
            Self {
                lo: lo + i64::from((lo as f64) / inv < start),
                hi: hi - i64::from((hi as f64) / inv > stop),
                inc: -inv,
            }
        } else {
            let inc = 10f64.powf(power) * factor;
            let lo = (start / inc).round() as i64;
            let hi = (stop / inc).round() as i64;
            Self {
                lo: lo + i64::from((lo as f64) * inc < start),
                hi: hi - i64::from((hi as f64) * inc > stop),
                inc,
            }
        };

        if spec.hi < spec.lo && (0.5..2.0).contains(&count) {
            return Self::new(start, stop, count * 2.0);
        }
        (spec.inc.is_finite() && spec.inc != 0.0).then_some(spec)
    }

    fn value(&self, i: i64) -> f64 {
        if self.inc < 0.0 {
            i as f64 / -self.inc
        } else {
            i as f64 * self.inc
        }
    }

    fn step(&self) -> f64 {
        self.value(1)
    }
}

fn ascending(start: f64, stop: f64) -> (f64, f64) {
    if stop < start { (stop, start) } else { (start, stop) }
}

/// d3 `ticks(start, stop, count)`.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if !start.is_finite() || !stop.is_finite() || count == 0 {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let (a, b) = ascending(start, stop);
    let Some(spec) = TickSpec::new(a, b, count as f64) else {
        return Vec::new();
    };
    let mut out: Vec<f64> = (spec.lo..=spec.hi).map(|i| spec.value(i)).collect();
    if stop < start {
        out.reverse();
    }
    out
}

/// Distance between consecutive ticks of `ticks(start, stop, count)`.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let (a, b) = ascending(start, stop);
    TickSpec::new(a, b, count as f64).map_or(0.0, |spec| spec.step())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            domain,
            range,
            clamp: false,
        }
    }

    pub fn clamped(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Extends the domain to round tick boundaries (d3 `linear.nice(count)`).
    pub fn nice(mut self, count: usize) -> Self {
        let (mut start, mut stop) = self.domain;
        let reversed = stop < start;
        if reversed {
            std::mem::swap(&mut start, &mut stop);
        }

        let mut prestep: Option<f64> = None;
        for _ in 0..10 {
            let Some(TickSpec { inc: step, .. }) = TickSpec::new(start, stop, count as f64) else {
                break;
            };
            if prestep == Some(step) {
                break;
            }
            if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            }
            prestep = Some(step);
        }

        self.domain = if reversed { (stop, start) } else { (start, stop) };
        self
    }

    pub fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if value.is_nan() {
            return f64::NAN;
        }
        if d0 == d1 {
            return r0 + (r1 - r0) * 0.5;
        }
        let mut t = (value - d0) / (d1 - d0);
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        r0 + t * (r1 - r0)
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }

    pub fn tick_step(&self, count: usize) -> f64 {
        tick_step(self.domain.0, self.domain.1, count)
    }
}

/// Categorical scale dividing a continuous range into uniform bands.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: IndexSet<String>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    step: f64,
    bandwidth: f64,
    positions: Vec<f64>,
}

impl BandScale {
    /// Duplicate categories collapse onto the band of their first occurrence.
    pub fn new<I, S>(domain: I, range: (f64, f64)) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self {
            domain: domain.into_iter().map(Into::into).collect(),
            range,
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
            step: 0.0,
            bandwidth: 0.0,
            positions: Vec::new(),
        };
        out.rescale();
        out
    }

    pub fn padding_inner(mut self, padding: f64) -> Self {
        self.padding_inner = padding.clamp(0.0, 1.0);
        self.rescale();
        self
    }

    pub fn padding_outer(mut self, padding: f64) -> Self {
        self.padding_outer = padding.max(0.0);
        self.rescale();
        self
    }

    fn rescale(&mut self) {
        let n = self.domain.len() as f64;
        let (r0, r1) = self.range;
        let reverse = r1 < r0;
        let (mut start, stop) = if reverse { (r1, r0) } else { (r0, r1) };
        self.step = (stop - start) / (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        start += (stop - start - self.step * (n - self.padding_inner)) * self.align;
        self.bandwidth = self.step * (1.0 - self.padding_inner);

        let mut positions: Vec<f64> = (0..self.domain.len())
            .map(|i| start + self.step * i as f64)
            .collect();
        if reverse {
            positions.reverse();
        }
        self.positions = positions;
    }

    /// Leading edge of the band for `key`.
    pub fn position(&self, key: &str) -> Option<f64> {
        let idx = self.domain.get_index_of(key)?;
        self.positions.get(idx).copied()
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.domain.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ticks_match_d3() {
        assert_eq!(
            ticks(0.0, 10.0, 10),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]
        );
        assert_eq!(ticks(0.0, 1.0, 5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert_eq!(
            ticks(0.0, 100.0, 4),
            vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
        );
        assert_eq!(ticks(10.0, 0.0, 2), vec![10.0, 5.0, 0.0]);
        assert!(ticks(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn tick_step_is_the_tick_spacing() {
        assert_eq!(tick_step(0.0, 100.0, 4), 20.0);
        assert_eq!(tick_step(1.0, 0.0, 5), 0.2);
        assert_eq!(tick_step(0.0, 0.05, 5), 0.01);
        assert_eq!(tick_step(0.0, 1.0, 0), 0.0);
    }

    #[test]
    fn nice_rounds_domain_outward() {
        let s = LinearScale::new((0.0, 9.3), (0.0, 100.0)).nice(10);
        assert_eq!(s.domain(), (0.0, 10.0));
        let s = LinearScale::new((0.0, 0.93), (0.0, 100.0)).nice(10);
        assert_eq!(s.domain(), (0.0, 1.0));
        let s = LinearScale::new((0.0, 1234.0), (0.0, 100.0)).nice(10);
        assert_eq!(s.domain(), (0.0, 1300.0));
        let s = LinearScale::new((0.0, 10.0), (0.0, 100.0)).nice(10);
        assert_eq!(s.domain(), (0.0, 10.0));
    }

    #[test]
    fn linear_scale_maps_and_clamps() {
        let s = LinearScale::new((0.0, 10.0), (200.0, 0.0));
        assert_eq!(s.scale(0.0), 200.0);
        assert_eq!(s.scale(10.0), 0.0);
        assert_eq!(s.scale(5.0), 100.0);
        assert_eq!(s.scale(-5.0), 300.0);
        assert!(s.scale(f64::NAN).is_nan());

        let s = s.clamped(true);
        assert_eq!(s.scale(-5.0), 200.0);
        assert_eq!(s.scale(20.0), 0.0);
    }

    #[test]
    fn degenerate_domain_maps_to_the_middle() {
        let s = LinearScale::new((0.0, 0.0), (0.0, 100.0));
        assert_eq!(s.scale(0.0), 50.0);
    }

    #[test]
    fn band_scale_step_and_bandwidth() {
        // n = 3, inner = 0.7, outer = 0.35: step = 300 / (3 - 0.7 + 0.7) = 100.
        let b = BandScale::new(["A", "B", "C"], (0.0, 300.0))
            .padding_inner(0.7)
            .padding_outer(0.35);
        assert!(approx(b.step(), 100.0));
        assert!(approx(b.bandwidth(), 30.0));
        assert!(approx(b.position("A").unwrap(), 35.0));
        assert!(approx(b.position("B").unwrap(), 135.0));
        assert!(approx(b.position("C").unwrap(), 235.0));
        assert_eq!(b.position("D"), None);
    }

    #[test]
    fn band_scale_reversed_range_puts_first_category_at_the_end() {
        let b = BandScale::new(["A", "B"], (100.0, 0.0));
        assert!(approx(b.step(), 50.0));
        assert!(approx(b.position("A").unwrap(), 50.0));
        assert!(approx(b.position("B").unwrap(), 0.0));
    }

    #[test]
    fn band_scale_dedups_and_handles_empty_domains() {
        let b = BandScale::new(["A", "A", "B"], (0.0, 100.0));
        assert_eq!(b.len(), 2);
        assert_eq!(b.domain().collect::<Vec<_>>(), vec!["A", "B"]);

        let empty = BandScale::new(Vec::<String>::new(), (0.0, 100.0)).padding_inner(0.7);
        assert!(empty.is_empty());
        assert_eq!(empty.position("A"), None);
        assert!(empty.step().is_finite());
    }
}

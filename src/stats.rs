//! Auxiliary numeric services: quantile, bandwidth, a naive medcouple,
//! medcouple-adjusted robust bounds, and a small FFT-backed Gaussian KDE.
//!
//! None of this is scan-critical; it exists so downstream reporting (and
//! the CLI's `--stats` mode) can compute distributional summaries for
//! quantitative columns without re-deriving these from scratch.

/// `k`-th smallest value of `data` (0-based), via Hoare partitioning.
/// Mutates `data` in place; O(n) expected.
fn quickselect(data: &mut [f64], k: usize) -> f64 {
    let mut lo = 0usize;
    let mut hi = data.len() - 1;
    loop {
        if lo == hi {
            return data[lo];
        }
        let pivot = data[lo + (hi - lo) / 2];
        let mut i = lo;
        let mut j = hi;
        loop {
            while data[i] < pivot {
                i += 1;
            }
            while data[j] > pivot {
                j -= 1;
            }
            if i >= j {
                break;
            }
            data.swap(i, j);
            i += 1;
            if j == 0 {
                break;
            }
            j -= 1;
        }
        if k <= j {
            hi = j;
        } else {
            lo = j + 1;
        }
    }
}

/// Type-7 quantile (the convention used by R's default `quantile()` and
/// most statistical packages), computed via quickselect rather than a
/// full sort.
pub fn quantile(x: &[f64], p: f64) -> f64 {
    assert!(!x.is_empty(), "quantile of an empty sample is undefined");
    let n = x.len();
    if n == 1 {
        return x[0];
    }
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let mut buf = x.to_vec();
    if lo == hi {
        return quickselect(&mut buf, lo);
    }
    let lo_val = quickselect(&mut buf, lo);
    let mut buf2 = x.to_vec();
    let hi_val = quickselect(&mut buf2, hi);
    lo_val + (h - lo as f64) * (hi_val - lo_val)
}

fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}

fn sample_sd(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    let m = mean(x);
    let ss: f64 = x.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (x.len() - 1) as f64).sqrt()
}

/// Silverman-style bandwidth: `0.9 * min(sd, IQR/1.34) * n^-0.2`, falling
/// back to `sd`, then `|x[0]|`, then `1.0` if the primary spread estimate
/// is zero (constant or near-constant data).
pub fn bandwidth(x: &[f64]) -> f64 {
    assert!(!x.is_empty(), "bandwidth of an empty sample is undefined");
    let n = x.len() as f64;
    let sd = sample_sd(x);
    let iqr = quantile(x, 0.75) - quantile(x, 0.25);
    let primary = sd.min(iqr / 1.34);

    let spread = if primary > 0.0 {
        primary
    } else if sd > 0.0 {
        sd
    } else if x[0].abs() > 0.0 {
        x[0].abs()
    } else {
        1.0
    };

    0.9 * spread * n.powf(-0.2)
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// O(n^2) medcouple (Brys-Hubert-Struyf robust skewness measure), with
/// the standard tie-break rule `sgn(p - 1 - i - j)` for pairs that land
/// exactly on the median.
pub fn medcouple_naive(x: &[f64]) -> f64 {
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let med = median_sorted(&sorted);

    let lower: Vec<f64> = sorted.iter().copied().filter(|&v| v <= med).collect();
    let upper: Vec<f64> = sorted.iter().copied().filter(|&v| v >= med).collect();
    let p = lower.len();

    let mut kernels = Vec::with_capacity(lower.len() * upper.len());
    for (i, &xi) in lower.iter().enumerate() {
        for (j, &xj) in upper.iter().enumerate() {
            let h = if (xj - xi).abs() > f64::EPSILON {
                ((xj - med) - (med - xi)) / (xj - xi)
            } else {
                (p as isize - 1 - i as isize - j as isize).signum() as f64
            };
            kernels.push(h);
        }
    }
    kernels.sort_by(|a, b| a.partial_cmp(b).unwrap());
    median_sorted(&kernels)
}

/// Medcouple-adjusted Tukey fences: asymmetric when the sample is skewed
/// (`mc != 0`), reducing to the ordinary `1.5*IQR` fences as `mc -> 0`.
pub fn robust_bounds(x: &[f64]) -> (f64, f64) {
    let q1 = quantile(x, 0.25);
    let q3 = quantile(x, 0.75);
    let iqr = q3 - q1;
    let mc = medcouple_naive(x);

    if mc < 0.0 {
        (q1 - 1.5 * iqr * (-3.0 * mc).exp(), q3 + 1.5 * iqr * (4.0 * mc).exp())
    } else {
        (q1 - 1.5 * iqr * (-4.0 * mc).exp(), q3 + 1.5 * iqr * (3.0 * mc).exp())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    fn add(self, o: Complex) -> Complex {
        Complex::new(self.re + o.re, self.im + o.im)
    }

    fn sub(self, o: Complex) -> Complex {
        Complex::new(self.re - o.re, self.im - o.im)
    }

    fn mul(self, o: Complex) -> Complex {
        Complex::new(self.re * o.re - self.im * o.im, self.re * o.im + self.im * o.re)
    }
}

/// Recursive radix-2 Cooley-Tukey FFT. `data.len()` must be a power of
/// two. `inverse` selects the sign of the twiddle exponent; the caller is
/// responsible for the `1/n` normalization on an inverse transform.
fn fft(data: &[Complex], inverse: bool) -> Vec<Complex> {
    let n = data.len();
    if n == 1 {
        return vec![data[0]];
    }
    assert!(n.is_power_of_two(), "FFT length must be a power of two");

    let evens: Vec<Complex> = data.iter().step_by(2).copied().collect();
    let odds: Vec<Complex> = data.iter().skip(1).step_by(2).copied().collect();
    let fe = fft(&evens, inverse);
    let fo = fft(&odds, inverse);

    let sign = if inverse { 1.0 } else { -1.0 };
    let mut out = vec![Complex::default(); n];
    for k in 0..n / 2 {
        let angle = sign * 2.0 * std::f64::consts::PI * k as f64 / n as f64;
        let twiddle = Complex::new(angle.cos(), angle.sin()).mul(fo[k]);
        out[k] = fe[k].add(twiddle);
        out[k + n / 2] = fe[k].sub(twiddle);
    }
    out
}

fn next_power_of_two(n: usize) -> usize {
    n.next_power_of_two()
}

fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if (x1 - x0).abs() < f64::EPSILON {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Gaussian kernel density estimate over `x`, evaluated at 512 evenly
/// spaced abscissas spanning (a small margin beyond) the sample range.
/// Computed by binning the data into a histogram, convolving it via FFT
/// with a discretized Gaussian kernel of the bandwidth-derived width, and
/// linearly resampling the convolution back onto the 512 output points.
pub fn gaussian_kde(x: &[f64]) -> (Vec<f64>, Vec<f64>) {
    const OUTPUT_POINTS: usize = 512;
    assert!(!x.is_empty(), "KDE of an empty sample is undefined");

    let h = bandwidth(x);
    let lo = x.iter().cloned().fold(f64::INFINITY, f64::min) - 4.0 * h;
    let hi = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + 4.0 * h;
    let span = (hi - lo).max(f64::EPSILON);

    let grid_n = next_power_of_two(OUTPUT_POINTS * 2);
    let bin_width = span / grid_n as f64;

    let mut hist = vec![0.0f64; grid_n];
    for &v in x {
        let idx = (((v - lo) / bin_width) as isize).clamp(0, grid_n as isize - 1) as usize;
        hist[idx] += 1.0;
    }

    let mut kernel = vec![0.0f64; grid_n];
    let half = grid_n / 2;
    for (i, slot) in kernel.iter_mut().enumerate() {
        let signed = if i <= half { i as f64 } else { i as f64 - grid_n as f64 };
        let t = signed * bin_width;
        *slot = (-0.5 * (t / h).powi(2)).exp() / (h * (2.0 * std::f64::consts::PI).sqrt());
    }

    let hist_freq = fft(&hist.iter().map(|&v| Complex::new(v, 0.0)).collect::<Vec<_>>(), false);
    let kernel_freq = fft(&kernel.iter().map(|&v| Complex::new(v, 0.0)).collect::<Vec<_>>(), false);
    let product: Vec<Complex> = hist_freq.iter().zip(&kernel_freq).map(|(a, b)| a.mul(*b)).collect();
    let convolved = fft(&product, true);
    let density: Vec<f64> = convolved.iter().map(|c| c.re / grid_n as f64).collect();

    let grid_xs: Vec<f64> = (0..grid_n).map(|i| lo + i as f64 * bin_width).collect();

    let mut xs = Vec::with_capacity(OUTPUT_POINTS);
    let mut ys = Vec::with_capacity(OUTPUT_POINTS);
    let step = (hi - lo) / (OUTPUT_POINTS - 1) as f64;
    for i in 0..OUTPUT_POINTS {
        let target = lo + i as f64 * step;
        let pos = ((target - lo) / bin_width).clamp(0.0, (grid_n - 1) as f64);
        let j0 = pos.floor() as usize;
        let j1 = (j0 + 1).min(grid_n - 1);
        let y = lerp(grid_xs[j0], density[j0], grid_xs[j1], density[j1], target);
        xs.push(target);
        ys.push(y.max(0.0));
    }
    (xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_of_uniform_sample_matches_known_values() {
        let data: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        assert!((quantile(&data, 0.5) - 5.5).abs() < 1e-9);
        assert!((quantile(&data, 0.0) - 1.0).abs() < 1e-9);
        assert!((quantile(&data, 1.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn bandwidth_falls_back_when_spread_is_zero() {
        let constant = vec![3.0; 5];
        assert!((bandwidth(&constant) - 0.9 * 3.0 * 5f64.powf(-0.2)).abs() < 1e-9);
    }

    #[test]
    fn medcouple_of_symmetric_data_is_zero() {
        let data = vec![-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(medcouple_naive(&data).abs() < 1e-9);
    }

    #[test]
    fn robust_bounds_bracket_the_interquartile_range() {
        let data: Vec<f64> = (1..=20).map(|v| v as f64).collect();
        let (lo, hi) = robust_bounds(&data);
        assert!(lo < quantile(&data, 0.25));
        assert!(hi > quantile(&data, 0.75));
    }

    #[test]
    fn fft_round_trip_recovers_the_input() {
        let input: Vec<Complex> = (0..8).map(|i| Complex::new(i as f64, 0.0)).collect();
        let freq = fft(&input, false);
        let back = fft(&freq, true);
        for (a, b) in input.iter().zip(&back) {
            assert!((a.re - b.re / 8.0).abs() < 1e-9);
        }
    }

    #[test]
    fn gaussian_kde_returns_fixed_length_nonnegative_density() {
        let data: Vec<f64> = (0..50).map(|v| v as f64 * 0.3).collect();
        let (xs, ys) = gaussian_kde(&data);
        assert_eq!(xs.len(), 512);
        assert_eq!(ys.len(), 512);
        assert!(ys.iter().all(|&y| y >= 0.0));
    }
}

/// First step at which `series_s` meets or exceeds `series_c`.
///
/// Only the common prefix of the two series is scanned.
pub fn first_crossover(series_s: &[f64], series_c: &[f64]) -> Option<usize> {
    series_s
        .iter()
        .zip(series_c)
        .position(|(s, c)| s >= c)
}

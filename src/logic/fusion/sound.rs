/// Normalized volume: mean of byte-valued frequency bins over 255
pub fn volume(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u64 = bins.iter().map(|&b| b as u64).sum();
    (sum as f64 / bins.len() as f64 / 255.0) as f32
}

//! Overlap-add time-scale modification
//!
//! Hann-windowed OLA without pitch synchronisation: pitch is preserved only
//! approximately and phase coherence not at all. Quality is acceptable for
//! factors in [0.5, 2.0].

use crate::audio::dsp::hann;

/// Analysis frame length: 20 ms at 22 050 Hz
pub const FRAME_SIZE: usize = 441;
const ANALYSIS_HOP: usize = FRAME_SIZE / 4;
/// Accumulated window weight below this is left unnormalised
const MIN_WEIGHT: f32 = 0.01;

/// Time-stretch a signal by `speed` (>1 shortens, <1 lengthens)
///
/// Inputs shorter than one frame pass through unchanged. Signal and window
/// weights accumulate in `f32` and are rounded once at the end, so a 1.0
/// factor reproduces the steady-state input exactly. Trailing zero samples
/// are trimmed.
pub fn stretch(input: &[i16], speed: f32) -> Vec<i16> {
    if input.len() < FRAME_SIZE || speed <= 0.0 {
        return input.to_vec();
    }
    let synthesis_hop = (ANALYSIS_HOP as f32 / speed) as usize;
    if synthesis_hop == 0 {
        return input.to_vec();
    }

    let num_frames = (input.len() - FRAME_SIZE) / ANALYSIS_HOP + 1;
    let out_len = num_frames * synthesis_hop + FRAME_SIZE;

    let window: Vec<f32> = (0..FRAME_SIZE).map(|i| hann(i, FRAME_SIZE)).collect();
    let mut acc = vec![0.0f32; out_len];
    let mut weight = vec![0.0f32; out_len];

    let mut analysis_pos = 0;
    let mut synthesis_pos = 0;
    while analysis_pos + FRAME_SIZE <= input.len() && synthesis_pos + FRAME_SIZE <= out_len {
        for i in 0..FRAME_SIZE {
            acc[synthesis_pos + i] += input[analysis_pos + i] as f32 * window[i];
            weight[synthesis_pos + i] += window[i];
        }
        analysis_pos += ANALYSIS_HOP;
        synthesis_pos += synthesis_hop;
    }

    let mut output: Vec<i16> = acc
        .iter()
        .zip(&weight)
        .map(|(&a, &w)| {
            let value = if w > MIN_WEIGHT { a / w } else { a };
            value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect();

    while output.last() == Some(&0) {
        output.pop();
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| (8000.0 * (2.0 * std::f32::consts::PI * freq * i as f32 / 22_050.0).sin()) as i16)
            .collect()
    }

    #[test]
    fn test_identity_at_unit_speed() {
        let input = sine(220.0, 4410);
        let output = stretch(&input, 1.0);

        // Interior samples reproduce exactly; only the windowed head/tail
        // ramps (weight below the normalisation floor) may differ.
        let end = output.len().min(input.len()) - FRAME_SIZE;
        for i in FRAME_SIZE..end {
            assert_eq!(output[i], input[i], "sample {i}");
        }
    }

    #[test]
    fn test_half_speed_doubles_length() {
        let input = sine(220.0, 4410);
        let output = stretch(&input, 0.5);
        let target = input.len() * 2;
        assert!(
            (output.len() as i64 - target as i64).unsigned_abs() <= 2 * FRAME_SIZE as u64,
            "len {} vs target {target}",
            output.len()
        );
    }

    #[test]
    fn test_double_speed_halves_length() {
        let input = sine(220.0, 8820);
        let output = stretch(&input, 2.0);
        let target = input.len() / 2;
        assert!(
            (output.len() as i64 - target as i64).unsigned_abs() <= 2 * FRAME_SIZE as u64,
            "len {} vs target {target}",
            output.len()
        );
    }

    #[test]
    fn test_short_input_passthrough() {
        let input = sine(220.0, 200);
        assert_eq!(stretch(&input, 0.5), input);
    }
}

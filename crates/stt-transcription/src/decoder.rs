//! ONNX graph calls and CTC greedy decoding.
//!
//! ONNX tensor shapes use `i64` dimensions while Rust indexing needs `usize`.
//! These casts are safe because tensor dimensions are always small positive values.
#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]

use ndarray::{Array2, Array3, ArrayView2};
use ort::session::Session;
use ort::value::Tensor;
use stt_core::Hypothesis;
use tracing::debug;

use crate::types::{ResultExt, TranscriptionError};
use crate::vocab::Vocabulary;

/// Run the mel preprocessor on raw waveform samples.
///
/// Input: waveform `[1, N]` (16kHz mono f32)
/// Output: mel features `[1, n_mels, T]` and the valid frame count
pub fn run_preprocessor(
    preprocessor: &mut Session,
    samples: &[f32],
) -> Result<(Array3<f32>, i64), TranscriptionError> {
    let n = samples.len();
    let waveform =
        Tensor::from_array(([1i64, n as i64], samples.to_vec())).inference("waveform tensor")?;
    let waveform_lens =
        Tensor::from_array(([1i64], vec![n as i64])).inference("waveform_lens tensor")?;

    let outputs = preprocessor
        .run(ort::inputs![
            "waveforms" => waveform,
            "waveforms_lens" => waveform_lens,
        ])
        .inference("preprocessor run")?;

    let (feat_shape, feat_data) = outputs["features"]
        .try_extract_tensor::<f32>()
        .inference("extract features")?;
    let (_, feat_len_data) = outputs["features_lens"]
        .try_extract_tensor::<i64>()
        .inference("extract features_lens")?;
    let feat_len = feat_len_data.first().copied().unwrap_or(0);

    if feat_shape.len() != 3 {
        return Err(TranscriptionError::Inference(format!(
            "features: expected rank 3, got {feat_shape:?}"
        )));
    }
    let out = Array3::from_shape_vec(
        (
            feat_shape[0] as usize,
            feat_shape[1] as usize,
            feat_shape[2] as usize,
        ),
        feat_data.to_vec(),
    )
    .inference("reshape features")?;

    Ok((out, feat_len))
}

/// Run the encoder + CTC head on mel features.
///
/// Input: features `[1, n_mels, T]`
/// Output: log-probabilities `[T', V+1]` (batch dim squeezed) and the number of
/// valid frames. Exports without an `encoded_lengths` output count every frame.
pub fn run_model(
    model: &mut Session,
    features: &Array3<f32>,
    features_len: i64,
) -> Result<(Array2<f32>, usize), TranscriptionError> {
    let shape = features.shape();
    let flat: Vec<f32> = features.iter().copied().collect();
    let audio_signal =
        Tensor::from_array(([shape[0] as i64, shape[1] as i64, shape[2] as i64], flat))
            .inference("audio_signal tensor")?;
    let length = Tensor::from_array(([1i64], vec![features_len])).inference("length tensor")?;

    let outputs = model
        .run(ort::inputs![
            "audio_signal" => audio_signal,
            "length" => length,
        ])
        .inference("model run")?;

    let (lp_shape, lp_data) = outputs["logprobs"]
        .try_extract_tensor::<f32>()
        .inference("extract logprobs")?;

    if lp_shape.len() != 3 {
        return Err(TranscriptionError::Inference(format!(
            "logprobs: expected rank 3, got {lp_shape:?}"
        )));
    }
    let frames = lp_shape[1] as usize;
    let classes = lp_shape[2] as usize;

    let encoded_len = match outputs.get("encoded_lengths") {
        Some(value) => {
            let (_, lens) = value
                .try_extract_tensor::<i64>()
                .inference("extract encoded_lengths")?;
            lens.first().map_or(frames, |&n| n.max(0) as usize)
        }
        None => frames,
    };

    let logprobs = Array2::from_shape_vec((frames, classes), lp_data[..frames * classes].to_vec())
        .inference("reshape logprobs")?;
    Ok((logprobs, encoded_len.min(frames)))
}

/// Greedy CTC decoding over `[T, V+1]` log-probabilities.
///
/// Takes the best class per frame for the first `valid_frames` frames,
/// collapses consecutive repeats and drops blanks. The score is the sum of
/// the chosen log-probabilities.
pub fn ctc_greedy_decode(
    logprobs: ArrayView2<'_, f32>,
    valid_frames: usize,
    blank_idx: usize,
) -> (Vec<usize>, f32) {
    let frames = valid_frames.min(logprobs.nrows());
    let mut tokens = Vec::new();
    let mut score = 0.0f32;
    let mut prev: Option<usize> = None;

    for row in logprobs.rows().into_iter().take(frames) {
        let Some(row) = row.as_slice() else {
            continue;
        };
        let best = argmax(row);
        score += row.get(best).copied().unwrap_or(0.0);
        if best != blank_idx && prev != Some(best) {
            tokens.push(best);
        }
        prev = Some(best);
    }

    (tokens, score)
}

/// Decode the first `valid_frames` frames of log-probabilities into a hypothesis.
pub fn decode_hypothesis(
    logprobs: &Array2<f32>,
    valid_frames: usize,
    vocab: &Vocabulary,
) -> Result<Hypothesis, TranscriptionError> {
    let classes = logprobs.ncols();
    if classes < vocab.output_size() {
        return Err(TranscriptionError::Inference(format!(
            "logprobs width {classes} smaller than vocabulary output size {}",
            vocab.output_size()
        )));
    }

    let (token_ids, score) = ctc_greedy_decode(logprobs.view(), valid_frames, vocab.blank_idx());
    let text = vocab.detokenize(&token_ids);

    debug!(
        "decoded {} tokens from {}/{} frames → {} chars",
        token_ids.len(),
        valid_frames.min(logprobs.nrows()),
        logprobs.nrows(),
        text.len()
    );

    Ok(Hypothesis {
        text,
        token_ids,
        score: Some(score),
    })
}

/// Find the index of the maximum value in a slice.
fn argmax(slice: &[f32]) -> usize {
    slice
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// One-hot-ish log-probabilities for a class sequence over 4 classes.
    fn frames(classes: &[usize]) -> Array2<f32> {
        let mut lp = Array2::from_elem((classes.len(), 4), -10.0f32);
        for (t, &c) in classes.iter().enumerate() {
            lp[[t, c]] = -0.1;
        }
        lp
    }

    #[test]
    fn argmax_basic() {
        assert_eq!(argmax(&[1.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), 1);
        assert_eq!(argmax(&[42.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn greedy_collapses_repeats_and_drops_blank() {
        // blank = 3
        let lp = frames(&[1, 1, 3, 1, 2, 2, 3, 3]);
        let (tokens, _) = ctc_greedy_decode(lp.view(), 8, 3);
        assert_eq!(tokens, vec![1, 1, 2]);
    }

    #[test]
    fn greedy_all_blank_is_empty() {
        let lp = frames(&[3, 3, 3]);
        let (tokens, score) = ctc_greedy_decode(lp.view(), 3, 3);
        assert!(tokens.is_empty());
        assert!((score - (-0.3)).abs() < 1e-5);
    }

    #[test]
    fn greedy_respects_valid_frames() {
        let lp = frames(&[0, 3, 1, 2]);
        let (tokens, _) = ctc_greedy_decode(lp.view(), 2, 3);
        assert_eq!(tokens, vec![0]);

        let (tokens, _) = ctc_greedy_decode(lp.view(), 100, 3);
        assert_eq!(tokens, vec![0, 1, 2]);
    }

    #[test]
    fn decode_hypothesis_produces_text() {
        let vocab = Vocabulary::new(vec!["▁hi".into(), "▁there".into(), ".".into()]);
        let lp = frames(&[0, 0, 3, 1, 3, 2]);
        let hyp = decode_hypothesis(&lp, 6, &vocab).unwrap();
        assert_eq!(hyp.text, "hi there.");
        assert_eq!(hyp.token_ids, vec![0, 1, 2]);
        assert!(hyp.score.is_some());
    }

    #[test]
    fn decode_hypothesis_rejects_narrow_logprobs() {
        let vocab = Vocabulary::new(vec!["a".into(), "b".into(), "c".into(), "d".into()]);
        let lp = array![[0.0f32, -1.0, -2.0, -3.0]];
        assert!(decode_hypothesis(&lp, 1, &vocab).is_err());
    }

    #[test]
    fn decode_hypothesis_ignores_padded_frames() {
        let vocab = Vocabulary::new(vec!["▁hi".into(), "▁there".into(), ".".into()]);
        // Frames past the encoded length would otherwise emit "▁there" and ".".
        let lp = frames(&[0, 3, 3, 1, 2]);
        let hyp = decode_hypothesis(&lp, 3, &vocab).unwrap();
        assert_eq!(hyp.text, "hi");
        assert_eq!(hyp.token_ids, vec![0]);
    }
}

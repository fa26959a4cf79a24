use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

use docqa_core::{Error, Result};

/// XLM-RoBERTa pad token id.
const PAD_ID: u32 = 1;

/// Encode `texts`, truncating or padding each to `max_len`, and move ids and
/// attention mask onto `device` as `[texts.len(), max_len]` tensors.
pub fn tokenize_batch(
    tokenizer: &Tokenizer,
    texts: &[&str],
    max_len: usize,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let mut ids = Vec::with_capacity(texts.len() * max_len);
    let mut mask = Vec::with_capacity(texts.len() * max_len);
    for text in texts {
        let enc = tokenizer.encode(*text, true).map_err(|e| Error::embedding("tokenize", e))?;
        let (row_ids, row_mask) = padded_row(enc.get_ids(), enc.get_attention_mask(), max_len);
        ids.extend(row_ids);
        mask.extend(row_mask);
    }

    let shape = (texts.len(), max_len);
    let ids = Tensor::from_vec(ids, shape, device).map_err(|e| Error::embedding("tokenize", e))?;
    let mask = Tensor::from_vec(mask, shape, device).map_err(|e| Error::embedding("tokenize", e))?;
    Ok((ids, mask))
}

fn padded_row(ids: &[u32], mask: &[u32], max_len: usize) -> (Vec<u32>, Vec<u32>) {
    let mut ids = ids[..ids.len().min(max_len)].to_vec();
    let mut mask = mask[..mask.len().min(max_len)].to_vec();
    ids.resize(max_len, PAD_ID);
    mask.resize(max_len, 0);
    (ids, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_truncated_or_padded() {
        assert_eq!(padded_row(&[0, 42, 2], &[1, 1, 1], 5), (vec![0, 42, 2, 1, 1], vec![1, 1, 1, 0, 0]));
        assert_eq!(padded_row(&[0, 42, 43, 2], &[1, 1, 1, 1], 2), (vec![0, 42], vec![1, 1]));
    }
}

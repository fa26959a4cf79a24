use candle_core::{DType, Tensor};

use docqa_core::{Error, Result};

/// Mean over the unmasked positions of `[B, T, H]` hidden states, then L2
/// normalized per row. Returns `[B, H]`. A row whose mask is all padding
/// pools to zeros.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    pool(hidden, attention_mask).map_err(|e| Error::embedding("pool", e))
}

fn pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let (batch, steps, _) = hidden.dims3()?;
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    if mask.dims() != [batch, steps] {
        candle_core::bail!("mask shape {:?} does not match [{batch}, {steps}]", mask.dims());
    }

    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let counts = mask.sum_keepdim(1)?.broadcast_maximum(&scalar(1.0, hidden)?)?;
    let mean = summed.broadcast_div(&counts)?;

    let floor = if hidden.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = mean.sqr()?.sum_keepdim(1)?.sqrt()?.broadcast_maximum(&scalar(floor, hidden)?)?;
    mean.broadcast_div(&norms)
}

/// `value` as a rank-0 tensor on the device and dtype of `like`.
fn scalar(value: f32, like: &Tensor) -> candle_core::Result<Tensor> {
    Tensor::new(value, like.device())?.to_dtype(like.dtype())
}

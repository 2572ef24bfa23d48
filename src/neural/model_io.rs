//! Model I/O utilities using safetensors format
//!
//! Checkpoints trained in PyTorch are exported to safetensors so they load
//! independently of the libtorch version, and parameter names follow the
//! PyTorch state dict (`transformer_blocks.0.attn.in_proj_weight`, ...).

use crate::neural::oracle::OracleError;
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use std::fs;
use std::path::Path;
use tch::{nn, Tensor};

/// Load every variable of `vs` from a safetensors file.
///
/// A variable missing from the file is an error: a half-loaded model would play
/// with random weights without anyone noticing.
pub fn load_varstore(vs: &mut nn::VarStore, path: impl AsRef<Path>) -> Result<(), OracleError> {
    let path = path.as_ref();
    let buffer = fs::read(path)
        .map_err(|e| OracleError::Load(format!("cannot read {}: {}", path.display(), e)))?;

    let tensors = SafeTensors::deserialize(&buffer)
        .map_err(|e| OracleError::Load(format!("invalid safetensors {}: {}", path.display(), e)))?;

    let mut loaded = 0usize;
    for (name, mut var) in vs.variables() {
        let view = tensors
            .tensor(&name)
            .map_err(|_| OracleError::Load(format!("tensor '{}' not found in {}", name, path.display())))?;
        let tensor = tensor_view_to_tensor(&view)?;

        if tensor.size() != var.size() {
            return Err(OracleError::Load(format!(
                "tensor '{}' has shape {:?}, model expects {:?}",
                name,
                tensor.size(),
                var.size()
            )));
        }

        tch::no_grad(|| {
            var.copy_(&tensor.to_kind(var.kind()).to_device(var.device()));
        });
        loaded += 1;
    }

    log::info!("Loaded {} tensors from {}", loaded, path.display());
    Ok(())
}

fn tensor_view_to_tensor(view: &TensorView) -> Result<Tensor, OracleError> {
    let shape: Vec<i64> = view.shape().iter().map(|&x| x as i64).collect();
    let data = view.data();

    match view.dtype() {
        Dtype::F32 => {
            let floats: Vec<f32> = data
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            Ok(Tensor::from_slice(&floats).reshape(&shape))
        }
        Dtype::F64 => {
            let doubles: Vec<f64> = data
                .chunks_exact(8)
                .map(|chunk| {
                    f64::from_le_bytes([
                        chunk[0], chunk[1], chunk[2], chunk[3],
                        chunk[4], chunk[5], chunk[6], chunk[7],
                    ])
                })
                .collect();
            Ok(Tensor::from_slice(&doubles).reshape(&shape))
        }
        Dtype::I64 => {
            let longs: Vec<i64> = data
                .chunks_exact(8)
                .map(|chunk| {
                    i64::from_le_bytes([
                        chunk[0], chunk[1], chunk[2], chunk[3],
                        chunk[4], chunk[5], chunk[6], chunk[7],
                    ])
                })
                .collect();
            Ok(Tensor::from_slice(&longs).reshape(&shape))
        }
        other => Err(OracleError::Load(format!("unsupported dtype: {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::serialize_to_file;
    use std::collections::HashMap;

    #[test]
    fn test_load_matching_tensor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("linear.safetensors");

        let weight: Vec<u8> = (0..6).flat_map(|i| (i as f32).to_le_bytes()).collect();
        let bias: Vec<u8> = [0.5f32, -0.5].iter().flat_map(|x| x.to_le_bytes()).collect();
        let views: HashMap<String, TensorView<'_>> = [
            ("test.weight".to_string(), TensorView::new(Dtype::F32, vec![2, 3], &weight).unwrap()),
            ("test.bias".to_string(), TensorView::new(Dtype::F32, vec![2], &bias).unwrap()),
        ]
        .into_iter()
        .collect();
        serialize_to_file(views, &None, &path).unwrap();

        let mut vs = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(&vs.root() / "test", 3, 2, Default::default());
        load_varstore(&mut vs, &path).unwrap();

        let variables = vs.variables();
        let loaded = &variables["test.bias"];
        assert!((loaded.double_value(&[0]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_tensor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.safetensors");
        let views: HashMap<String, TensorView<'_>> = HashMap::new();
        serialize_to_file(views, &None, &path).unwrap();

        let mut vs = nn::VarStore::new(tch::Device::Cpu);
        let _layer = nn::linear(&vs.root() / "test", 3, 2, Default::default());
        assert!(load_varstore(&mut vs, &path).is_err());
    }
}

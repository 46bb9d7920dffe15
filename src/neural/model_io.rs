//! Checkpoint I/O in safetensors format
//!
//! Weights are stored as safetensors instead of libtorch's native format so a
//! checkpoint stays readable across libtorch versions and from other tools.

use std::collections::HashMap;
use std::path::Path;

use safetensors::serialize_to_file;
use safetensors::tensor::{Dtype, SafeTensors, TensorView};
use tch::{nn, Device, Kind, Tensor};

use crate::{PongError, Result};

/// Save every variable of a VarStore to a safetensors file.
pub fn save_varstore(vs: &nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut encoded: Vec<(String, Vec<usize>, Vec<u8>)> = Vec::new();
    for (name, tensor) in vs.variables() {
        let shape: Vec<usize> = tensor.size().iter().map(|&d| d as usize).collect();
        encoded.push((name, shape, tensor_to_bytes(&tensor)?));
    }

    let views = encoded
        .iter()
        .map(|(name, shape, data)| {
            TensorView::new(Dtype::F32, shape.clone(), data)
                .map(|view| (name.clone(), view))
                .map_err(|e| PongError::Checkpoint(format!("{}: {}", name, e)))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    serialize_to_file(views, &None, path)
        .map_err(|e| PongError::Checkpoint(format!("writing {}: {}", path.display(), e)))?;
    log::debug!("saved {} tensors to {}", encoded.len(), path.display());
    Ok(())
}

/// Copy tensors from a safetensors file into an existing VarStore.
///
/// Every variable must be present with the same shape. Loading stops at the
/// first tensor that fails; variables copied before it keep their new values.
pub fn load_varstore(vs: &mut nn::VarStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let buffer = std::fs::read(path)?;
    let tensors = SafeTensors::deserialize(&buffer)
        .map_err(|e| PongError::Checkpoint(format!("reading {}: {}", path.display(), e)))?;

    let device = vs.device();
    for (name, mut var) in vs.variables() {
        let view = tensors
            .tensor(&name)
            .map_err(|_| PongError::Checkpoint(format!("tensor '{}' missing in {}", name, path.display())))?;
        let loaded = tensor_view_to_tensor(&view)?.to_device(device);
        if loaded.size() != var.size() {
            return Err(PongError::Checkpoint(format!(
                "tensor '{}' has shape {:?}, expected {:?}",
                name,
                loaded.size(),
                var.size()
            )));
        }
        tch::no_grad(|| {
            var.copy_(&loaded);
        });
    }
    log::debug!("loaded weights from {}", path.display());
    Ok(())
}

fn tensor_to_bytes(tensor: &Tensor) -> Result<Vec<u8>> {
    let flat = tensor
        .to_device(Device::Cpu)
        .to_kind(Kind::Float)
        .flatten(0, -1)
        .contiguous();
    let data = Vec::<f32>::try_from(&flat)?;
    Ok(data.iter().flat_map(|x| x.to_le_bytes()).collect())
}

fn tensor_view_to_tensor(view: &TensorView) -> Result<Tensor> {
    let shape: Vec<i64> = view.shape().iter().map(|&d| d as i64).collect();
    let data = view.data();
    let tensor = match view.dtype() {
        Dtype::F32 => {
            let floats: Vec<f32> = data
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Tensor::from_slice(&floats)
        }
        Dtype::F64 => {
            let doubles: Vec<f64> = data
                .chunks_exact(8)
                .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect();
            Tensor::from_slice(&doubles).to_kind(Kind::Float)
        }
        other => {
            return Err(PongError::Checkpoint(format!("unsupported dtype {:?}", other)));
        }
    };
    Ok(tensor.reshape(&shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.safetensors");

        let vs1 = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs1.root() / "layer1", 10, 5, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(Device::Cpu);
        let _layer2 = nn::linear(&vs2.root() / "layer1", 10, 5, Default::default());
        load_varstore(&mut vs2, &path).unwrap();

        let vars2 = vs2.variables();
        for (name, t1) in vs1.variables() {
            assert!(t1.allclose(&vars2[&name], 1e-6, 1e-6, false), "{} differs", name);
        }
    }

    #[test]
    fn test_load_rejects_shape_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.safetensors");

        let vs1 = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs1.root() / "layer1", 10, 5, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(Device::Cpu);
        let _layer2 = nn::linear(&vs2.root() / "layer1", 10, 4, Default::default());
        assert!(matches!(load_varstore(&mut vs2, &path), Err(PongError::Checkpoint(_))));
    }

    #[test]
    fn test_load_rejects_missing_tensor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.safetensors");

        let vs1 = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs1.root() / "layer1", 3, 2, Default::default());
        save_varstore(&vs1, &path).unwrap();

        let mut vs2 = nn::VarStore::new(Device::Cpu);
        let _layer2 = nn::linear(&vs2.root() / "layer2", 3, 2, Default::default());
        assert!(matches!(load_varstore(&mut vs2, &path), Err(PongError::Checkpoint(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let mut vs = nn::VarStore::new(Device::Cpu);
        let _layer = nn::linear(&vs.root() / "layer1", 3, 2, Default::default());
        let err = load_varstore(&mut vs, dir.path().join("nope.safetensors")).unwrap_err();
        assert!(matches!(err, PongError::Io(_)));
    }
}

use crate::error::{IoError, IoResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tessera_ml_core::{DenseMatrix, Float};

/// Learned parameters of a gradient-descent model.
///
/// Persisted as whitespace-separated decimal text:
///
/// ```text
/// <learning_rate>
/// <weight_rows> <weight_cols>
/// <w_0> <w_1> ... <w_n>
/// <bias_rows> <bias_cols>
/// <b_0> ...
/// ```
///
/// Values are written with 17 significant digits so an `f64` survives a
/// save/load cycle bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams<T: Float> {
    pub learning_rate: T,
    pub weights: DenseMatrix<T>,
    pub bias: DenseMatrix<T>,
}

fn write_value<W: Write, T: Float>(w: &mut W, v: T) -> IoResult<()> {
    write!(w, "{:.16e}", v.to_f64())?;
    Ok(())
}

fn write_matrix<W: Write, T: Float>(w: &mut W, m: &DenseMatrix<T>) -> IoResult<()> {
    writeln!(w, "{} {}", m.rows(), m.cols())?;
    for (i, &v) in m.as_slice().iter().enumerate() {
        if i > 0 {
            write!(w, " ")?;
        }
        write_value(w, v)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Serialize `params` to any writer. Unfitted (zero-sized) weights are rejected.
pub fn write_params<W: Write, T: Float>(params: &ModelParams<T>, mut writer: W) -> IoResult<()> {
    if params.weights.is_empty() {
        return Err(IoError::NotFitted);
    }
    write_value(&mut writer, params.learning_rate)?;
    writeln!(writer)?;
    write_matrix(&mut writer, &params.weights)?;
    write_matrix(&mut writer, &params.bias)?;
    writer.flush()?;
    Ok(())
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn next_str(&mut self, field: &'static str) -> IoResult<&'a str> {
        self.inner.next().ok_or(IoError::Parse {
            field,
            value: String::new(),
        })
    }

    fn next_float<T: Float>(&mut self, field: &'static str) -> IoResult<T> {
        let raw = self.next_str(field)?;
        raw.parse::<f64>().map(T::from_f64).map_err(|_| IoError::Parse {
            field,
            value: raw.to_string(),
        })
    }

    fn next_dim(&mut self, field: &'static str) -> IoResult<usize> {
        let raw = self.next_str(field)?;
        raw.parse::<usize>().map_err(|_| IoError::Parse {
            field,
            value: raw.to_string(),
        })
    }

    fn next_matrix<T: Float>(&mut self, dims: &'static str, values: &'static str) -> IoResult<DenseMatrix<T>> {
        let rows = self.next_dim(dims)?;
        let cols = self.next_dim(dims)?;
        let count = rows.checked_mul(cols).ok_or_else(|| IoError::Parse {
            field: dims,
            value: format!("{} {}", rows, cols),
        })?;
        // No up-front allocation: `count` comes from the file.
        let mut data = Vec::new();
        for _ in 0..count {
            data.push(self.next_float(values)?);
        }
        Ok(DenseMatrix::from_vec(rows, cols, data)?)
    }
}

/// Parse parameters previously written by [`write_params`].
pub fn read_params<R: Read, T: Float>(mut reader: R) -> IoResult<ModelParams<T>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut tokens = Tokens {
        inner: text.split_whitespace(),
    };

    let learning_rate = tokens.next_float("learning rate")?;
    let weights = tokens.next_matrix("weight dimensions", "weight")?;
    let bias = tokens.next_matrix("bias dimensions", "bias")?;
    if let Some(extra) = tokens.inner.next() {
        return Err(IoError::Parse {
            field: "end of file",
            value: extra.to_string(),
        });
    }
    Ok(ModelParams {
        learning_rate,
        weights,
        bias,
    })
}

/// Write `params` to `path`, replacing any existing file.
pub fn save_params<P: AsRef<Path>, T: Float>(params: &ModelParams<T>, path: P) -> IoResult<()> {
    if params.weights.is_empty() {
        return Err(IoError::NotFitted);
    }
    let file = File::create(path.as_ref())?;
    write_params(params, BufWriter::new(file))?;
    log::info!(
        "saved model with {}x{} weights to {}",
        params.weights.rows(),
        params.weights.cols(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read parameters from `path`.
pub fn load_params<P: AsRef<Path>, T: Float>(path: P) -> IoResult<ModelParams<T>> {
    let file = File::open(path.as_ref())?;
    let params: ModelParams<T> = read_params(BufReader::new(file))?;
    log::info!(
        "loaded model with {}x{} weights from {}",
        params.weights.rows(),
        params.weights.cols(),
        path.as_ref().display()
    );
    Ok(params)
}

/// Save any serializable value as pretty-printed JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> IoResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path.as_ref(), json)?;
    log::info!("saved JSON snapshot to {}", path.as_ref().display());
    Ok(())
}

/// Load a value saved with [`save_json`].
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> IoResult<T> {
    let json = fs::read_to_string(path.as_ref())?;
    let value = serde_json::from_str(&json)?;
    log::info!("loaded JSON snapshot from {}", path.as_ref().display());
    Ok(value)
}

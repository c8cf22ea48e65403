//! Functions and utilities for turning decoded NPY data into [ndarray] objects and from there into
//! the row and label sequences served to clients.

use crate::npy::{NpyArray, NpyData, NpyError};

use ndarray::prelude::*;
use serde_json::Value;

/// Returns an [ndarray] Shape corresponding to the NPY header.
///
/// # Arguments
///
/// * `shape`: Shape from the header
/// * `fortran_order`: Whether the data is stored in column-major order
fn get_shape(shape: &[usize], fortran_order: bool) -> ndarray::Shape<IxDyn> {
    let shape = shape.to_vec().into_shape();
    if fortran_order {
        shape.f()
    } else {
        shape
    }
}

/// Build an [ndarray::Array] that owns `data`, laid out as described by the NPY header.
///
/// Iterating the resulting array visits elements in logical (row-major) order regardless of the
/// storage order.
pub fn build_array<T>(
    shape: &[usize],
    fortran_order: bool,
    data: Vec<T>,
) -> Result<ArrayD<T>, NpyError> {
    Ok(ArrayD::from_shape_vec(get_shape(shape, fortran_order), data)?)
}

/// Convert a decoded NPY array into a sequence of 2D point rows.
///
/// Integer data is widened to [f64]. Boolean and string data are rejected.
pub fn to_rows(array: NpyArray) -> Result<Vec<Vec<f64>>, NpyError> {
    let header = array.header;
    if header.shape.len() != 2 {
        return Err(NpyError::Dimensionality {
            expected: 2,
            actual: header.shape.len(),
        });
    }
    let values: Vec<f64> = match array.data {
        NpyData::Float(v) => v,
        NpyData::Int(v) => v.into_iter().map(|x| x as f64).collect(),
        NpyData::Uint(v) => v.into_iter().map(|x| x as f64).collect(),
        NpyData::Bool(_) | NpyData::Str(_) => {
            return Err(NpyError::NonNumeric(header.descr.dtype))
        }
    };
    let array =
        build_array(&header.shape, header.fortran_order, values)?.into_dimensionality::<Ix2>()?;
    Ok(array.rows().into_iter().map(|row| row.to_vec()).collect())
}

/// Convert a decoded NPY array into a flat sequence of JSON label values.
///
/// Multi-dimensional label arrays are flattened in logical order. Non-finite floats become
/// `null`.
pub fn to_labels(array: NpyArray) -> Result<Vec<Value>, NpyError> {
    let header = array.header;
    let values: Vec<Value> = match array.data {
        NpyData::Bool(v) => v.into_iter().map(Value::from).collect(),
        NpyData::Int(v) => v.into_iter().map(Value::from).collect(),
        NpyData::Uint(v) => v.into_iter().map(Value::from).collect(),
        NpyData::Float(v) => v.into_iter().map(Value::from).collect(),
        NpyData::Str(v) => v.into_iter().map(Value::from).collect(),
    };
    let array = build_array(&header.shape, header.fortran_order, values)?;
    Ok(array.iter().cloned().collect())
}

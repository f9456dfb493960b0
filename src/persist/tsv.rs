//! Tab-separated matrix and vector files.
//!
//! A matrix is one line per row with entries separated by tabs; a vector is
//! one entry per line. Floats are written with `{:?}` so they read back
//! bit-identical.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

fn parse_line(path: &Path, line_no: usize, line: &str) -> Result<Vec<f64>> {
    line.split('\t')
        .map(|field| {
            field.trim().parse::<f64>().map_err(|_| {
                Error::format(path, format!("line {}: `{field}` is not a number", line_no + 1))
            })
        })
        .collect()
}

fn read_lines(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

pub fn write_matrix(path: &Path, matrix: &Matrix) -> Result<()> {
    let mut text = String::new();
    for row in &matrix.data {
        let fields: Vec<String> = row.iter().map(|x| format!("{x:?}")).collect();
        text.push_str(&fields.join("\t"));
        text.push('\n');
    }
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

pub fn read_matrix(path: &Path) -> Result<Matrix> {
    let text = read_lines(path)?;
    let rows = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(path, i, line))
        .collect::<Result<Vec<_>>>()?;
    Matrix::from_rows(rows).ok_or_else(|| Error::format(path, "rows have different lengths"))
}

pub fn write_vector(path: &Path, vector: &[f64]) -> Result<()> {
    let mut text = String::new();
    for x in vector {
        text.push_str(&format!("{x:?}\n"));
    }
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

pub fn read_vector(path: &Path) -> Result<Vec<f64>> {
    let text = read_lines(path)?;
    let mut vector = Vec::new();
    for (i, line) in text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        match parse_line(path, i, line)?.as_slice() {
            [x] => vector.push(*x),
            _ => return Err(Error::format(path, format!("line {}: expected one entry", i + 1))),
        }
    }
    Ok(vector)
}

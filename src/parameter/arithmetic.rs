//! Entry-wise arithmetic between parameters of identical layer sizes, and
//! between a parameter and a scalar.
//!
//! Every operation comes in two flavours: an in-place `*_assign_*` /
//! `*_in_place` form and a copying form that leaves its operands untouched.

use std::ops::Neg;

use crate::error::{Error, Result};
use crate::parameter::Parameter;

impl Parameter {
    fn check_same_shape(&self, other: &Parameter) -> Result<()> {
        if self.layer_sizes() != other.layer_sizes() {
            return Err(Error::Shape(format!(
                "layer sizes {:?} and {:?} differ",
                self.layer_sizes(),
                other.layer_sizes()
            )));
        }
        Ok(())
    }

    /// Applies `functor(self_entry, other_entry)` to every pair of entries.
    fn zip_apply<F>(&mut self, other: &Parameter, functor: F) -> Result<()>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(other)?;
        for (w, ow) in self.weights.iter_mut().zip(&other.weights) {
            w.zip_apply(ow, &functor);
        }
        for (b, ob) in self.biases.iter_mut().zip(&other.biases) {
            for (x, y) in b.iter_mut().zip(ob) {
                *x = functor(*x, *y);
            }
        }
        Ok(())
    }

    /// Applies `functor` to every entry.
    pub fn apply<F>(&mut self, functor: F)
    where
        F: Fn(f64) -> f64,
    {
        for w in self.weights.iter_mut() {
            w.apply(&functor);
        }
        for x in self.biases.iter_mut().flatten() {
            *x = functor(*x);
        }
    }

    pub fn map<F>(&self, functor: F) -> Parameter
    where
        F: Fn(f64) -> f64,
    {
        let mut res = self.clone();
        res.apply(functor);
        res
    }

    /// Same layer sizes as `self`, every entry zero.
    pub fn zeros_like(&self) -> Parameter {
        self.map(|_| 0.0)
    }

    pub fn add_assign_param(&mut self, other: &Parameter) -> Result<()> {
        self.zip_apply(other, |a, b| a + b)
    }

    pub fn sub_assign_param(&mut self, other: &Parameter) -> Result<()> {
        self.zip_apply(other, |a, b| a - b)
    }

    pub fn mul_assign_param(&mut self, other: &Parameter) -> Result<()> {
        self.zip_apply(other, |a, b| a * b)
    }

    /// Entry-wise division. Zero entries in `other` produce infinities or
    /// NaNs, which the optimizers' finiteness checks report.
    pub fn div_assign_param(&mut self, other: &Parameter) -> Result<()> {
        self.zip_apply(other, |a, b| a / b)
    }

    pub fn pow_assign_param(&mut self, other: &Parameter) -> Result<()> {
        self.zip_apply(other, f64::powf)
    }

    pub fn scale_in_place(&mut self, factor: f64) {
        self.apply(|x| x * factor);
    }

    pub fn add_scalar_in_place(&mut self, value: f64) {
        self.apply(|x| x + value);
    }

    pub fn div_scalar_in_place(&mut self, divisor: f64) -> Result<()> {
        if divisor == 0.0 {
            return Err(Error::InvalidInput("cannot divide a parameter by zero".to_owned()));
        }
        self.apply(|x| x / divisor);
        Ok(())
    }

    pub fn powf_in_place(&mut self, exponent: f64) {
        self.apply(|x| x.powf(exponent));
    }

    fn zip_with<F>(&self, other: &Parameter, functor: F) -> Result<Parameter>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut res = self.clone();
        res.zip_apply(other, functor)?;
        Ok(res)
    }

    pub fn try_add(&self, other: &Parameter) -> Result<Parameter> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn try_sub(&self, other: &Parameter) -> Result<Parameter> {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn try_mul(&self, other: &Parameter) -> Result<Parameter> {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn try_div(&self, other: &Parameter) -> Result<Parameter> {
        self.zip_with(other, |a, b| a / b)
    }

    pub fn try_pow(&self, other: &Parameter) -> Result<Parameter> {
        self.zip_with(other, f64::powf)
    }

    pub fn scale(&self, factor: f64) -> Parameter {
        self.map(|x| x * factor)
    }

    pub fn add_scalar(&self, value: f64) -> Parameter {
        self.map(|x| x + value)
    }

    pub fn div_scalar(&self, divisor: f64) -> Result<Parameter> {
        let mut res = self.clone();
        res.div_scalar_in_place(divisor)?;
        Ok(res)
    }

    pub fn powf(&self, exponent: f64) -> Parameter {
        self.map(|x| x.powf(exponent))
    }

    pub fn sqrt(&self) -> Parameter {
        self.map(f64::sqrt)
    }
}

impl Neg for &Parameter {
    type Output = Parameter;

    fn neg(self) -> Parameter {
        self.map(|x| -x)
    }
}

impl Neg for Parameter {
    type Output = Parameter;

    fn neg(mut self) -> Parameter {
        self.apply(|x| -x);
        self
    }
}

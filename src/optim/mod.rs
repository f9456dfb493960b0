pub mod adam;
pub mod gradient_descender;
pub mod sgd;

pub use adam::{Adam, AdamState};
pub use gradient_descender::GradientDescender;
pub use sgd::Sgd;

use tracing::warn;

use crate::error::{Error, Result};
use crate::parameter::Parameter;

/// Fails with `NumericInstability` if any entry of `param` is NaN or infinite.
pub(crate) fn ensure_finite(param: &Parameter, what: &str) -> Result<()> {
    if param.is_finite() {
        return Ok(());
    }
    warn!(what, "non-finite values detected");
    Err(Error::NumericInstability(format!(
        "{what} contains NaN or infinite entries; try a smaller learning rate"
    )))
}

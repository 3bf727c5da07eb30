//! Reducers used by zonal statistics and composites.

use super::graph::Expr;

/// Remote reducer expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Reducer(Expr);

impl Reducer {
    /// Arithmetic mean of valid pixels. Output property is `mean` for
    /// multi-feature reductions and the band name for single regions.
    pub fn mean() -> Self {
        Self(Expr::call("Reducer.mean").build())
    }

    pub fn median() -> Self {
        Self(Expr::call("Reducer.median").build())
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }
}

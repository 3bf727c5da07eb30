//! Expression graph builders for the remote imagery service.
//!
//! Nothing here talks to the network. These types assemble the declarative
//! request graph that the service evaluates; [`Expr::to_graph`] produces the
//! JSON sent in the `expression` field of compute, export and map requests.
//!
//! ```
//! use eezonal::expr::{Filter, ImageCollection};
//!
//! let summer = ImageCollection::load("MODIS/061/MYD11A1")
//!     .filter_date("2013-01-01", "2023-08-31")
//!     .filter(&Filter::calendar_range(6, 8, "month"));
//! let graph = summer.expr().to_graph();
//! assert_eq!(graph["result"], "0");
//! ```

mod feature;
mod filter;
mod graph;
mod image;
pub mod number;
mod reducer;

pub use feature::{Feature, FeatureCollection, Geometry};
pub use filter::{Filter, PredicateError, PredicateOp, PropertyPredicate};
pub use graph::{function_def, Expr, Invocation};
pub use image::{Image, ImageCollection};
pub use reducer::Reducer;

pub mod filler;
pub mod gaps;
pub mod models;
pub mod policy;
pub mod reconciler;
pub mod resolution;

pub use gaps::{Gap, GapClass};
pub use models::{CountryMatrix, GapRecord, NativeSeries, ReconcileReport, ResolutionRecord};
pub use policy::GapPolicy;
pub use reconciler::Reconciler;

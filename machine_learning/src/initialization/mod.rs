mod chained;
mod constant;
mod error;
mod layout;
mod param_gen;
mod random;

pub use chained::ChainedParamGen;
pub use constant::ConstParamGen;
pub use error::{RandErr, Result};
pub use layout::glorot_param_gen;
pub use param_gen::ParamGen;
pub use random::RandParamGen;

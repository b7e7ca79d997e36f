mod analysis_ops;
mod chain_ops;
mod merchant_ops;
mod transaction_ops;

pub use analysis_ops::*;
pub use chain_ops::*;
pub use merchant_ops::*;
pub use transaction_ops::*;

//! Command and parameter synchronization for northlink.
//!
//! A [`Commander`] owns one pipe on a shared [`northlink_radio::Radio`]. It
//! pulls the vehicle's parameter table across the link with a
//! request/response loop that tolerates lost replies, then keeps local values
//! current from the vehicle's set and log messages.

pub mod commander;
pub mod error;
pub mod params;

pub use commander::{
    Commander, CommanderConfig, SyncReport, CMD_FUNCTION_CONTENT, CMD_PARAM_CONTENT,
};
pub use error::{CommandError, Result};
pub use params::{ParamEntry, ParamTable, ParameterEntry, ParameterStore};

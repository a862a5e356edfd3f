// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

/// Virtual time as seen by a core.
pub type SimTime = f64;

/// Monotonically increasing number given to each admitted frame.
pub type FrameNumber = u64;

// Simulation errors

#[macro_export]
/// Build a [SimError] from a message that supports `to_string`, or from a
/// format string and its arguments.
macro_rules! sim_error {
    ($msg:expr) => {
        Err($crate::types::SimError($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)+) => {
        Err($crate::types::SimError(format!($fmt, $($arg)+)))
    };
}

/// The `SimError` is what should be returned in the case of an error
#[derive(Clone, Debug, PartialEq)]
pub struct SimError(pub String);

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for SimError {}

/// The SimResult is the return type for most simulation functions
pub type SimResult = Result<(), SimError>;

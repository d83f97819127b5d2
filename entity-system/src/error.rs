// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Error types
//!
//! Most lookups report failure as absence (`Option` or `bool`). The errors
//! here cover the few operations that return `Result`.

use thiserror::Error;

use crate::ecs::SystemId;

/// Errors reported by the world, system manager and dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No system is registered under this id
    #[error("no system registered with id {0}")]
    UnknownSystem(SystemId),

    /// A queue configuration value is out of range
    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for fallible operations in this crate
pub type Result<T> = std::result::Result<T, Error>;

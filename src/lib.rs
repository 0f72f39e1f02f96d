// SPDX-License-Identifier: MIT

pub mod agents;
pub mod engine;
pub mod model;
pub mod server;
pub mod services;

//! Capability contracts for hosted service objects.

mod capability;
mod hook;

pub use capability::{
    service_ref, InitError, Initializable, Injectable, Injection, Service, ServiceFactory,
    ServiceRef,
};
pub use hook::{AlwaysSatisfied, SatisfyHook};
